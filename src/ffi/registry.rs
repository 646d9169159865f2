//! Method Registry
//!
//! Lazily resolved, per-operation method bindings.

use std::collections::HashMap;

use tracing::debug;

use super::runtime::{runtime_name, ClassPtr, ObjcRuntime, ObjectPtr, Selector};
use super::types::{Implementation, Operation, Signature};
use super::{BridgeError, BridgeResult};

/// An operation resolved against the dynamic class of its receiver.
#[derive(Debug, Clone, Copy)]
pub struct MethodBinding {
    operation: Operation,
    class: ClassPtr,
    selector: Selector,
    implementation: Implementation,
}

impl MethodBinding {
    /// Resolve `operation` on the runtime class of `receiver`.
    ///
    /// `type_name` only labels the error.
    pub fn resolve<R: ObjcRuntime>(
        runtime: &R,
        receiver: ObjectPtr,
        type_name: &str,
        operation: Operation,
    ) -> BridgeResult<Self> {
        let not_found = || BridgeError::MethodNotFound {
            class: type_name.to_string(),
            selector: operation.selector(),
        };

        let class = runtime.class_of(receiver).ok_or_else(not_found)?;
        let selector = runtime.selector(&runtime_name(operation.selector())?);
        let imp = runtime
            .method_implementation(class, selector)
            .ok_or_else(not_found)?;

        // Safety: the operation table pairs each selector with the signature
        // of its native implementation.
        let implementation =
            unsafe { Implementation::from_raw(operation.signature(), imp.as_ptr()) };

        debug!(
            selector = operation.selector(),
            signature = %operation.signature(),
            "bound method"
        );

        Ok(Self {
            operation,
            class,
            selector,
            implementation,
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The class the implementation was found on (the receiver's dynamic
    /// class).
    pub fn class(&self) -> ClassPtr {
        self.class
    }

    pub fn selector(&self) -> Selector {
        self.selector
    }

    pub fn signature(&self) -> Signature {
        self.implementation.signature()
    }

    pub fn implementation(&self) -> Implementation {
        self.implementation
    }
}

/// Bindings resolved so far, one per operation.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    bindings: HashMap<Operation, MethodBinding>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached binding for `operation`, resolving it on first use.
    pub fn get_or_resolve<R: ObjcRuntime>(
        &mut self,
        runtime: &R,
        receiver: ObjectPtr,
        type_name: &str,
        operation: Operation,
    ) -> BridgeResult<MethodBinding> {
        if let Some(binding) = self.bindings.get(&operation) {
            return Ok(*binding);
        }

        let binding = MethodBinding::resolve(runtime, receiver, type_name, operation)?;
        self.bindings.insert(operation, binding);
        Ok(binding)
    }

    pub fn get(&self, operation: Operation) -> Option<&MethodBinding> {
        self.bindings.get(&operation)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
