//! Objective-C Runtime
//!
//! The type and selector resolution facility the bridge dispatches
//! through. [`LibObjc`] binds the real runtime out of `libobjc` at run time,
//! so the crate builds on hosts without one and fails with a load error
//! there instead.

use std::ffi::{c_char, c_void, CStr};
use std::path::Path;
use std::ptr::NonNull;

use tracing::debug;

use super::loader::{LibraryHandle, LibraryLoader};
use super::types::{RawId, RawSel};
use super::{BridgeError, BridgeResult};

/// Default location of the Objective-C runtime on macOS.
pub const DEFAULT_OBJC_LIBRARY: &str = "/usr/lib/libobjc.A.dylib";

/// A class object (`Class`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClassPtr(NonNull<c_void>);

impl ClassPtr {
    pub fn new(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// The class viewed as a message receiver.
    pub fn as_object(self) -> ObjectPtr {
        ObjectPtr(self.0)
    }
}

/// Any object (`id`), including class objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectPtr(NonNull<c_void>);

impl ObjectPtr {
    pub fn new(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub fn as_ptr(self) -> RawId {
        self.0.as_ptr()
    }
}

/// A registered selector (`SEL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Selector(RawSel);

impl Selector {
    pub fn from_raw(raw: RawSel) -> Self {
        Self(raw)
    }

    pub fn as_ptr(self) -> RawSel {
        self.0
    }
}

/// An untyped method implementation address (`IMP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawImp(NonNull<c_void>);

impl RawImp {
    pub fn new(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }
}

/// Name-based class and method lookup.
///
/// Implementations must return `None` for unknown names rather than a
/// forwarding stub, so that absent methods are detected before any call.
pub trait ObjcRuntime {
    /// Look up a class registered by a loaded image.
    fn class_named(&self, name: &CStr) -> Option<ClassPtr>;

    /// Register (or look up) a selector.
    fn selector(&self, name: &CStr) -> Selector;

    /// The dynamic class of `object`. For a class object this is its
    /// metaclass.
    fn class_of(&self, object: ObjectPtr) -> Option<ClassPtr>;

    /// The implementation `class` (or a superclass) provides for `selector`.
    fn method_implementation(&self, class: ClassPtr, selector: Selector) -> Option<RawImp>;

    /// `[[class alloc] init]`
    fn instantiate(&self, class: ClassPtr) -> Option<ObjectPtr>;
}

impl<R: ObjcRuntime + ?Sized> ObjcRuntime for &R {
    fn class_named(&self, name: &CStr) -> Option<ClassPtr> {
        (**self).class_named(name)
    }

    fn selector(&self, name: &CStr) -> Selector {
        (**self).selector(name)
    }

    fn class_of(&self, object: ObjectPtr) -> Option<ClassPtr> {
        (**self).class_of(object)
    }

    fn method_implementation(&self, class: ClassPtr, selector: Selector) -> Option<RawImp> {
        (**self).method_implementation(class, selector)
    }

    fn instantiate(&self, class: ClassPtr) -> Option<ObjectPtr> {
        (**self).instantiate(class)
    }
}

type GetClassFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type RegisterNameFn = unsafe extern "C" fn(*const c_char) -> RawSel;
type ObjectGetClassFn = unsafe extern "C" fn(RawId) -> *mut c_void;
type GetInstanceMethodFn = unsafe extern "C" fn(*mut c_void, RawSel) -> *mut c_void;
type MethodGetImplementationFn = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
type MsgSendObjectFn = unsafe extern "C" fn(RawId, RawSel) -> RawId;

/// The system Objective-C runtime, bound through the dynamic loader.
pub struct LibObjc {
    objc_get_class: GetClassFn,
    sel_register_name: RegisterNameFn,
    object_get_class: ObjectGetClassFn,
    class_get_instance_method: GetInstanceMethodFn,
    method_get_implementation: MethodGetImplementationFn,
    msg_send_object: MsgSendObjectFn,
    // Keeps the function pointers above valid.
    _library: LibraryHandle,
}

impl LibObjc {
    /// Load the runtime from `path` and bind the entry points the bridge uses.
    pub fn load(loader: &mut LibraryLoader, path: impl AsRef<Path>) -> BridgeResult<Self> {
        let library = loader.load(path)?;

        // Safety: the declared types match the documented prototypes in
        // <objc/runtime.h> and <objc/message.h>. objc_msgSend is only ever
        // called through the non-variadic `(id, SEL) -> id` shape.
        let runtime = unsafe {
            Self {
                objc_get_class: library.function::<GetClassFn>("objc_getClass")?,
                sel_register_name: library.function::<RegisterNameFn>("sel_registerName")?,
                object_get_class: library.function::<ObjectGetClassFn>("object_getClass")?,
                class_get_instance_method: library
                    .function::<GetInstanceMethodFn>("class_getInstanceMethod")?,
                method_get_implementation: library
                    .function::<MethodGetImplementationFn>("method_getImplementation")?,
                msg_send_object: library.function::<MsgSendObjectFn>("objc_msgSend")?,
                _library: library,
            }
        };

        debug!(path = %runtime._library.path().display(), "bound Objective-C runtime");
        Ok(runtime)
    }

    fn send_object(&self, receiver: RawId, selector: &CStr) -> RawId {
        let sel = self.selector(selector);
        unsafe { (self.msg_send_object)(receiver, sel.as_ptr()) }
    }
}

impl ObjcRuntime for LibObjc {
    fn class_named(&self, name: &CStr) -> Option<ClassPtr> {
        ClassPtr::new(unsafe { (self.objc_get_class)(name.as_ptr()) })
    }

    fn selector(&self, name: &CStr) -> Selector {
        Selector::from_raw(unsafe { (self.sel_register_name)(name.as_ptr()) })
    }

    fn class_of(&self, object: ObjectPtr) -> Option<ClassPtr> {
        ClassPtr::new(unsafe { (self.object_get_class)(object.as_ptr()) })
    }

    fn method_implementation(&self, class: ClassPtr, selector: Selector) -> Option<RawImp> {
        // class_getMethodImplementation would hand back the forwarding
        // trampoline for unknown selectors; class_getInstanceMethod is null.
        let method =
            unsafe { (self.class_get_instance_method)(class.as_ptr(), selector.as_ptr()) };
        if method.is_null() {
            return None;
        }
        RawImp::new(unsafe { (self.method_get_implementation)(method) })
    }

    fn instantiate(&self, class: ClassPtr) -> Option<ObjectPtr> {
        let allocated = ObjectPtr::new(self.send_object(class.as_ptr(), c"alloc"))?;
        ObjectPtr::new(self.send_object(allocated.as_ptr(), c"init"))
    }
}

/// Convert a class or selector name for the runtime.
pub(crate) fn runtime_name(name: &str) -> BridgeResult<std::ffi::CString> {
    std::ffi::CString::new(name).map_err(|_| BridgeError::InvalidName(name.to_string()))
}
