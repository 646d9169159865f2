//! Blue-light client
//!
//! Night Shift operations on top of the bridge. Strength is an integer
//! percentage here and a float in `[0.0, 1.0]` on the native side.

use tracing::debug;

use crate::ffi::{ops, Bridge, BridgeResult, ObjcRuntime, StatusRecord};

/// Native strength to percentage, rounding to nearest.
///
/// Out-of-range native values are clamped and NaN reads as 0, so the result
/// is always in `0..=100`.
pub fn percent_from_native(native: f32) -> u8 {
    if native.is_nan() {
        return 0;
    }
    (native.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Percentage to native strength. Values outside `0..=100` are clamped.
pub fn native_from_percent(percent: i64) -> f32 {
    percent.clamp(0, 100) as f32 / 100.0
}

/// Typed Night Shift API over a ready bridge.
pub struct BlueLightClient<R: ObjcRuntime> {
    bridge: Bridge<R>,
}

impl<R: ObjcRuntime> BlueLightClient<R> {
    pub fn new(bridge: Bridge<R>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Bridge<R> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge<R> {
        &mut self.bridge
    }

    /// Full status record.
    pub fn status(&mut self) -> BridgeResult<StatusRecord> {
        self.bridge.invoke(&ops::GET_STATUS, ())
    }

    pub fn is_enabled(&mut self) -> BridgeResult<bool> {
        Ok(self.status()?.enabled.is_true())
    }

    pub fn set_enabled(&mut self, enabled: bool) -> BridgeResult<()> {
        let ack = self.bridge.invoke(&ops::SET_ENABLED, enabled)?;
        debug!(enabled, ack, "setEnabled:");
        Ok(())
    }

    /// Invert the enabled flag and return the new value.
    pub fn toggle(&mut self) -> BridgeResult<bool> {
        let enabled = !self.is_enabled()?;
        self.set_enabled(enabled)?;
        Ok(enabled)
    }

    /// Current strength as a percentage.
    pub fn strength(&mut self) -> BridgeResult<u8> {
        let native = self.bridge.invoke(&ops::GET_STRENGTH, ())?;
        Ok(percent_from_native(native))
    }

    /// Apply a strength percentage, committing immediately. Returns the
    /// percentage actually applied after clamping.
    pub fn set_strength(&mut self, percent: i64) -> BridgeResult<u8> {
        let native = native_from_percent(percent);
        let ack = self.bridge.invoke(&ops::SET_STRENGTH, (native, true))?;
        debug!(percent, native, ack, "setStrength:commit:");
        Ok(percent_from_native(native))
    }

    /// Whether this machine supports blue-light reduction at all.
    pub fn is_supported(&mut self) -> BridgeResult<bool> {
        self.bridge.invoke(&ops::SUPPORTS_BLUE_LIGHT, ())
    }
}
