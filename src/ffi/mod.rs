//! FFI Module
//!
//! Late-bound calls into Objective-C classes that are only known by name.
//!
//! # Architecture
//!
//! ```text
//! LibraryLoader::load("CoreBrightness")        (libloading)
//!       │
//!       ▼
//! resolve_type(runtime, handle, "CBBlueLightClient")
//!       │
//!       ▼
//! instantiate ── [[cls alloc] init]
//!       │
//!       ▼
//! MethodRegistry ── object_getClass(instance) + selector ── IMP
//!       │
//!       ▼
//! Implementation::{Query, SetFlag, ReadStatus, SetLevel, ReadLevel}
//!       │
//!       ▼
//! Native method call
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut loader = LibraryLoader::new();
//! let framework = loader.load(DEFAULT_FRAMEWORK)?;
//! let runtime = LibObjc::load(&mut loader, DEFAULT_OBJC_LIBRARY)?;
//! let mut bridge = Bridge::connect(runtime, framework, "CBBlueLightClient")?;
//!
//! let status = bridge.invoke(&ops::GET_STATUS, ())?;
//! bridge.invoke(&ops::SET_ENABLED, !status.enabled.is_true())?;
//! ```

mod bridge;
mod error;
mod loader;
mod registry;
mod runtime;
mod types;

pub use bridge::{instantiate, resolve_type, Bridge, NativeInstance, NativeType, Stage};
pub use error::{BridgeError, BridgeResult};
pub use loader::{LibraryHandle, LibraryLoader};
pub use registry::{MethodBinding, MethodRegistry};
pub use runtime::{
    ClassPtr, LibObjc, ObjcRuntime, ObjectPtr, RawImp, Selector, DEFAULT_OBJC_LIBRARY,
};
pub use types::{
    ops, CallError, Implementation, ObjcBool, Op, Operation, RawId, RawSel, Receiver, Shape,
    Signature, StatusRecord,
};

/// Shape markers, one per [`Signature`].
pub mod shapes {
    pub use super::types::{Query, ReadLevel, ReadStatus, SetFlag, SetLevel};
}
