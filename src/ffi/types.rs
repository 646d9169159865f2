//! FFI Type System
//!
//! Calling-convention shapes, the operation table and the fixed-layout
//! records exchanged with Objective-C methods.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;

/// Objective-C `BOOL`.
///
/// One byte on every Apple target. Signed `char` on x86_64 and C `bool` on
/// arm64; both agree on 0 and 1, and any non-zero byte reads as true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct ObjcBool(i8);

impl ObjcBool {
    pub const YES: ObjcBool = ObjcBool(1);
    pub const NO: ObjcBool = ObjcBool(0);

    pub const fn new(value: bool) -> Self {
        if value {
            Self::YES
        } else {
            Self::NO
        }
    }

    pub const fn is_true(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for ObjcBool {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

impl From<ObjcBool> for bool {
    fn from(value: ObjcBool) -> Self {
        value.is_true()
    }
}

/// Receiver pointer as seen by a method implementation (`id`).
pub type RawId = *mut c_void;

/// Selector pointer as seen by a method implementation (`SEL`).
pub type RawSel = *const c_void;

/// `(self, _cmd) -> BOOL`
pub type QueryFn = unsafe extern "C" fn(RawId, RawSel) -> ObjcBool;
/// `(self, _cmd, BOOL) -> BOOL`
pub type SetFlagFn = unsafe extern "C" fn(RawId, RawSel, ObjcBool) -> ObjcBool;
/// `(self, _cmd, StatusRecord *) -> BOOL`
pub type ReadStatusFn = unsafe extern "C" fn(RawId, RawSel, *mut StatusRecord) -> ObjcBool;
/// `(self, _cmd, float, BOOL) -> BOOL`
pub type SetLevelFn = unsafe extern "C" fn(RawId, RawSel, f32, ObjcBool) -> ObjcBool;
/// `(self, _cmd, float *) -> BOOL`
pub type ReadLevelFn = unsafe extern "C" fn(RawId, RawSel, *mut f32) -> ObjcBool;

/// The closed set of calling conventions the bridge knows how to call.
///
/// Extend only together with a new [`Implementation`] variant and a new
/// [`Shape`] marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    /// Yes/no query without arguments.
    Query,
    /// Boolean setter; the returned flag is informational.
    SetFlag,
    /// Fills a caller-owned [`StatusRecord`].
    ReadStatus,
    /// Sets a continuous value with a commit flag.
    SetLevel,
    /// Reads a continuous value through an out-pointer.
    ReadLevel,
}

impl Signature {
    /// Objective-C type encoding of the method, for diagnostics.
    pub fn type_encoding(self) -> &'static str {
        match self {
            Signature::Query => "c16@0:8",
            Signature::SetFlag => "c20@0:8c16",
            Signature::ReadStatus => "c24@0:8^{StatusRecord}16",
            Signature::SetLevel => "c24@0:8f16c20",
            Signature::ReadLevel => "c24@0:8^f16",
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Query => write!(f, "(id) -> BOOL"),
            Signature::SetFlag => write!(f, "(id, BOOL) -> BOOL"),
            Signature::ReadStatus => write!(f, "(id, StatusRecord*) -> BOOL"),
            Signature::SetLevel => write!(f, "(id, float, BOOL) -> BOOL"),
            Signature::ReadLevel => write!(f, "(id, float*) -> BOOL"),
        }
    }
}

/// A resolved method address, already narrowed to exactly one calling
/// convention.
#[derive(Clone, Copy)]
pub enum Implementation {
    Query(QueryFn),
    SetFlag(SetFlagFn),
    ReadStatus(ReadStatusFn),
    SetLevel(SetLevelFn),
    ReadLevel(ReadLevelFn),
}

impl Implementation {
    /// Narrow a raw method address to the convention named by `signature`.
    ///
    /// # Safety
    ///
    /// `address` must be a non-null function implementing a method whose
    /// real parameter and return types are exactly `signature`.
    pub unsafe fn from_raw(signature: Signature, address: *const c_void) -> Self {
        match signature {
            Signature::Query => {
                Implementation::Query(std::mem::transmute::<*const c_void, QueryFn>(address))
            }
            Signature::SetFlag => {
                Implementation::SetFlag(std::mem::transmute::<*const c_void, SetFlagFn>(address))
            }
            Signature::ReadStatus => Implementation::ReadStatus(std::mem::transmute::<
                *const c_void,
                ReadStatusFn,
            >(address)),
            Signature::SetLevel => {
                Implementation::SetLevel(std::mem::transmute::<*const c_void, SetLevelFn>(address))
            }
            Signature::ReadLevel => Implementation::ReadLevel(std::mem::transmute::<
                *const c_void,
                ReadLevelFn,
            >(address)),
        }
    }

    pub fn signature(&self) -> Signature {
        match self {
            Implementation::Query(_) => Signature::Query,
            Implementation::SetFlag(_) => Signature::SetFlag,
            Implementation::ReadStatus(_) => Signature::ReadStatus,
            Implementation::SetLevel(_) => Signature::SetLevel,
            Implementation::ReadLevel(_) => Signature::ReadLevel,
        }
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address = match self {
            Implementation::Query(func) => *func as usize,
            Implementation::SetFlag(func) => *func as usize,
            Implementation::ReadStatus(func) => *func as usize,
            Implementation::SetLevel(func) => *func as usize,
            Implementation::ReadLevel(func) => *func as usize,
        };
        write!(f, "{}@{:#x}", self.signature(), address)
    }
}

/// Which object a method is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// The bridge's single instance.
    Instance,
    /// The class object itself (class methods).
    Class,
}

/// Every method the bridge may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetStatus,
    SetEnabled,
    GetStrength,
    SetStrength,
    SupportsBlueLight,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::GetStatus,
        Operation::SetEnabled,
        Operation::GetStrength,
        Operation::SetStrength,
        Operation::SupportsBlueLight,
    ];

    pub fn selector(self) -> &'static str {
        match self {
            Operation::GetStatus => "getBlueLightStatus:",
            Operation::SetEnabled => "setEnabled:",
            Operation::GetStrength => "getStrength:",
            Operation::SetStrength => "setStrength:commit:",
            Operation::SupportsBlueLight => "supportsBlueLightReduction",
        }
    }

    pub fn signature(self) -> Signature {
        match self {
            Operation::GetStatus => Signature::ReadStatus,
            Operation::SetEnabled => Signature::SetFlag,
            Operation::GetStrength => Signature::ReadLevel,
            Operation::SetStrength => Signature::SetLevel,
            Operation::SupportsBlueLight => Signature::Query,
        }
    }

    pub fn receiver(self) -> Receiver {
        match self {
            Operation::SupportsBlueLight => Receiver::Class,
            _ => Receiver::Instance,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector())
    }
}

/// Why a typed call did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallError {
    /// The implementation has a different calling convention.
    WrongShape(Signature),
    /// The method returned NO; out-parameters were not read.
    Rejected,
}

/// Static calling-convention tag.
///
/// Each implementor fixes the argument and result types of one
/// [`Signature`], so a call site cannot pass arguments of the wrong shape.
pub trait Shape {
    const SIGNATURE: Signature;
    type Args;
    type Output;

    /// Call `implementation` with `receiver` and `selector` as its hidden
    /// arguments.
    ///
    /// # Safety
    ///
    /// `receiver` must be a live object whose dynamic class provided
    /// `implementation` for `selector`.
    unsafe fn call(
        implementation: Implementation,
        receiver: RawId,
        selector: RawSel,
        args: Self::Args,
    ) -> Result<Self::Output, CallError>;
}

pub struct Query;
pub struct SetFlag;
pub struct ReadStatus;
pub struct SetLevel;
pub struct ReadLevel;

impl Shape for Query {
    const SIGNATURE: Signature = Signature::Query;
    type Args = ();
    type Output = bool;

    unsafe fn call(
        implementation: Implementation,
        receiver: RawId,
        selector: RawSel,
        _args: (),
    ) -> Result<bool, CallError> {
        match implementation {
            Implementation::Query(func) => Ok(func(receiver, selector).is_true()),
            other => Err(CallError::WrongShape(other.signature())),
        }
    }
}

impl Shape for SetFlag {
    const SIGNATURE: Signature = Signature::SetFlag;
    type Args = bool;
    type Output = bool;

    unsafe fn call(
        implementation: Implementation,
        receiver: RawId,
        selector: RawSel,
        value: bool,
    ) -> Result<bool, CallError> {
        match implementation {
            Implementation::SetFlag(func) => {
                Ok(func(receiver, selector, ObjcBool::new(value)).is_true())
            }
            other => Err(CallError::WrongShape(other.signature())),
        }
    }
}

impl Shape for ReadStatus {
    const SIGNATURE: Signature = Signature::ReadStatus;
    type Args = ();
    type Output = StatusRecord;

    unsafe fn call(
        implementation: Implementation,
        receiver: RawId,
        selector: RawSel,
        _args: (),
    ) -> Result<StatusRecord, CallError> {
        match implementation {
            Implementation::ReadStatus(func) => {
                let mut slot = StatusSlot::new();
                let out = std::ptr::addr_of_mut!(slot).cast::<StatusRecord>();
                if func(receiver, selector, out).is_true() {
                    Ok(slot.record)
                } else {
                    Err(CallError::Rejected)
                }
            }
            other => Err(CallError::WrongShape(other.signature())),
        }
    }
}

impl Shape for SetLevel {
    const SIGNATURE: Signature = Signature::SetLevel;
    /// `(value, commit)`
    type Args = (f32, bool);
    type Output = bool;

    unsafe fn call(
        implementation: Implementation,
        receiver: RawId,
        selector: RawSel,
        (value, commit): (f32, bool),
    ) -> Result<bool, CallError> {
        match implementation {
            Implementation::SetLevel(func) => {
                Ok(func(receiver, selector, value, ObjcBool::new(commit)).is_true())
            }
            other => Err(CallError::WrongShape(other.signature())),
        }
    }
}

impl Shape for ReadLevel {
    const SIGNATURE: Signature = Signature::ReadLevel;
    type Args = ();
    type Output = f32;

    unsafe fn call(
        implementation: Implementation,
        receiver: RawId,
        selector: RawSel,
        _args: (),
    ) -> Result<f32, CallError> {
        match implementation {
            Implementation::ReadLevel(func) => {
                let mut value = 0.0f32;
                if func(receiver, selector, &mut value).is_true() {
                    Ok(value)
                } else {
                    Err(CallError::Rejected)
                }
            }
            other => Err(CallError::WrongShape(other.signature())),
        }
    }
}

/// An [`Operation`] paired with its static shape.
pub struct Op<S: Shape> {
    operation: Operation,
    _shape: PhantomData<S>,
}

impl<S: Shape> Op<S> {
    const fn new(operation: Operation) -> Self {
        Self {
            operation,
            _shape: PhantomData,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Typed entry points into the operation table.
pub mod ops {
    use super::*;

    pub const GET_STATUS: Op<ReadStatus> = Op::new(Operation::GetStatus);
    pub const SET_ENABLED: Op<SetFlag> = Op::new(Operation::SetEnabled);
    pub const GET_STRENGTH: Op<ReadLevel> = Op::new(Operation::GetStrength);
    pub const SET_STRENGTH: Op<SetLevel> = Op::new(Operation::SetStrength);
    pub const SUPPORTS_BLUE_LIGHT: Op<Query> = Op::new(Operation::SupportsBlueLight);
}

/// Night Shift state as written by `getBlueLightStatus:`.
///
/// Field order and widths must match the native writer exactly; a
/// misaligned field corrupts every field after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct StatusRecord {
    pub enabled: ObjcBool,
    pub sun_schedule_permitted: ObjcBool,
    pub available: ObjcBool,
    pub active: ObjcBool,
    pub mode: i32,
    pub schedule: i32,
    pub disable_flags: u64,
    pub available_options: u64,
}

const _: () = assert!(std::mem::size_of::<StatusRecord>() == 32);
const _: () = assert!(std::mem::align_of::<StatusRecord>() == 8);

/// Stack slot handed to the native status writer.
///
/// Newer OS builds may write a longer record; the slack absorbs those
/// bytes and only `record` is decoded.
#[repr(C)]
pub(crate) struct StatusSlot {
    pub record: StatusRecord,
    _slack: [u64; 4],
}

impl StatusSlot {
    pub fn new() -> Self {
        Self {
            record: StatusRecord::default(),
            _slack: [0; 4],
        }
    }
}
