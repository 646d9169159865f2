//! Dynamic Invocation Bridge
//!
//! Resolves a class by name in a loaded library, creates the one instance
//! the process talks to, and sends it the messages in the operation table.
//!
//! ```text
//! Unresolved ──load──▶ Loaded ──resolve_type──▶ TypeResolved
//!      ──instantiate──▶ Instantiated ──▶ Ready ──invoke──▶ ...
//! ```
//!
//! A failure before `Ready` is fatal; nothing is resolved or called after
//! it.

use std::fmt;

use tracing::{debug, trace};

use super::loader::LibraryHandle;
use super::registry::{MethodBinding, MethodRegistry};
use super::runtime::{runtime_name, ClassPtr, ObjcRuntime, ObjectPtr};
use super::types::{CallError, Op, Operation, Receiver, Shape};
use super::{BridgeError, BridgeResult};

/// Startup progress of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unresolved,
    Loaded,
    TypeResolved,
    Instantiated,
    Ready,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unresolved => "unresolved",
            Stage::Loaded => "loaded",
            Stage::TypeResolved => "type-resolved",
            Stage::Instantiated => "instantiated",
            Stage::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// A class looked up by name.
#[derive(Debug, Clone)]
pub struct NativeType {
    name: String,
    class: ClassPtr,
}

impl NativeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> ClassPtr {
        self.class
    }
}

/// The single object the bridge sends instance messages to.
#[derive(Debug, Clone, Copy)]
pub struct NativeInstance {
    object: ObjectPtr,
}

impl NativeInstance {
    pub fn object(&self) -> ObjectPtr {
        self.object
    }
}

/// Look up `name` among the classes registered by `library`.
///
/// The handle is the proof that the defining image is mapped.
pub fn resolve_type<R: ObjcRuntime>(
    runtime: &R,
    library: &LibraryHandle,
    name: &str,
) -> BridgeResult<NativeType> {
    let class = runtime
        .class_named(&runtime_name(name)?)
        .ok_or_else(|| BridgeError::TypeNotFound(name.to_string()))?;

    debug!(class = name, library = %library.path().display(), "resolved class");
    Ok(NativeType {
        name: name.to_string(),
        class,
    })
}

/// `[[type alloc] init]`
pub fn instantiate<R: ObjcRuntime>(
    runtime: &R,
    native_type: &NativeType,
) -> BridgeResult<NativeInstance> {
    let object = runtime
        .instantiate(native_type.class)
        .ok_or_else(|| BridgeError::InstantiationFailed(native_type.name.clone()))?;
    Ok(NativeInstance { object })
}

/// A ready bridge: loaded library, resolved class, one live instance, and
/// the bindings resolved so far.
pub struct Bridge<R: ObjcRuntime> {
    runtime: R,
    library: LibraryHandle,
    native_type: NativeType,
    instance: NativeInstance,
    methods: MethodRegistry,
}

impl<R: ObjcRuntime> Bridge<R> {
    /// Drive a loaded library through type resolution and instantiation.
    pub fn connect(runtime: R, library: LibraryHandle, class_name: &str) -> BridgeResult<Self> {
        debug!(stage = %Stage::Unresolved, class = class_name);
        debug!(stage = %Stage::Loaded, library = %library.path().display());

        let native_type = resolve_type(&runtime, &library, class_name)?;
        debug!(stage = %Stage::TypeResolved, class = class_name);

        let instance = instantiate(&runtime, &native_type)?;
        debug!(stage = %Stage::Instantiated, class = class_name);

        let bridge = Self {
            runtime,
            library,
            native_type,
            instance,
            methods: MethodRegistry::new(),
        };
        debug!(stage = %Stage::Ready);
        Ok(bridge)
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn library(&self) -> &LibraryHandle {
        &self.library
    }

    pub fn native_type(&self) -> &NativeType {
        &self.native_type
    }

    pub fn instance(&self) -> NativeInstance {
        self.instance
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    fn receiver(&self, operation: Operation) -> ObjectPtr {
        match operation.receiver() {
            Receiver::Instance => self.instance.object,
            Receiver::Class => self.native_type.class.as_object(),
        }
    }

    /// Binding for `operation`, resolved on the receiver's dynamic class the
    /// first time it is asked for.
    pub fn resolve_method(&mut self, operation: Operation) -> BridgeResult<MethodBinding> {
        let receiver = self.receiver(operation);
        self.methods
            .get_or_resolve(&self.runtime, receiver, &self.native_type.name, operation)
    }

    /// Resolve every operation, reporting each outcome.
    pub fn preflight(&mut self) -> Vec<(Operation, BridgeResult<MethodBinding>)> {
        Operation::ALL
            .iter()
            .map(|&operation| (operation, self.resolve_method(operation)))
            .collect()
    }

    /// Send `op` with `args` through the shim for its shape.
    pub fn invoke<S: Shape>(&mut self, op: &Op<S>, args: S::Args) -> BridgeResult<S::Output> {
        let operation = op.operation();
        let binding = self.resolve_method(operation)?;

        if binding.signature() != S::SIGNATURE {
            return Err(BridgeError::SignatureMismatch {
                selector: operation.selector(),
                declared: binding.signature(),
                requested: S::SIGNATURE,
            });
        }

        trace!(selector = operation.selector(), "invoke");
        let receiver = self.receiver(operation);

        // Safety: the binding was resolved on the dynamic class of this
        // receiver, which stays alive for the bridge's lifetime, and its
        // shape was checked above.
        let result = unsafe {
            S::call(
                binding.implementation(),
                receiver.as_ptr(),
                binding.selector().as_ptr(),
                args,
            )
        };

        result.map_err(|e| match e {
            CallError::Rejected => BridgeError::CallRejected(operation.selector()),
            CallError::WrongShape(declared) => BridgeError::SignatureMismatch {
                selector: operation.selector(),
                declared,
                requested: S::SIGNATURE,
            },
        })
    }
}
