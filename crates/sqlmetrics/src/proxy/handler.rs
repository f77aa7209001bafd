use super::invocation::{MethodInvocation, Return};
use crate::api::{Capability, Wrapper};
use crate::error::SqlResult;
use std::any::Any;

/// Decides what happens to every call made on a proxy.
///
/// The default [`invoke`](Self::invoke) forwards everything to the real object, so an
/// implementation only overrides the methods it cares about. The unwrap protocol is
/// answered here too, before the real object is consulted.
pub trait InvocationHandler<T: Wrapper + ?Sized>: Send + Sync + 'static {
    /// Capability the proxy impersonates.
    fn capability(&self) -> Capability;

    /// Dispatch entry point for every intercepted call.
    fn invoke(&self, mut invocation: MethodInvocation<'_>) -> SqlResult<Return> {
        invocation.proceed()
    }

    /// `true` for the proxy's own capability, otherwise the real object's answer.
    fn is_wrapper_for(&self, delegate: &T, capability: Capability) -> SqlResult<bool> {
        if capability == self.capability() {
            return Ok(true);
        }
        delegate.is_wrapper_for(capability)
    }

    /// Unwrapping to the proxy's own capability yields the real object, unless the
    /// real object is itself a wrapper for that capability (a proxy over a proxy),
    /// in which case the request goes further down. Anything else is the real
    /// object's business, including the error for unsupported targets.
    #[allow(clippy::borrowed_box)]
    fn unwrap<'d>(&self, delegate: &'d Box<T>, capability: Capability) -> SqlResult<&'d dyn Any> {
        if capability == self.capability() && !delegate.is_wrapper_for(capability)? {
            return Ok(delegate as &dyn Any);
        }
        delegate.unwrap_ref(capability)
    }
}
