use super::handler::InvocationHandler;
use super::invocation::{Arg, Method, MethodInvocation, Return};
use crate::api::{Capability, Wrapper};
use crate::error::SqlResult;
use std::fmt;

/// A handle standing in for a real object of type `T`.
///
/// Implements the same interface as `T` (see the impls in `trampoline.rs`); every
/// call becomes a [`MethodInvocation`] handed to `handler`.
pub struct Proxy<T: ?Sized, H> {
    handler: H,
    delegate: Box<T>,
}

impl<T: Wrapper + ?Sized, H: InvocationHandler<T>> Proxy<T, H> {
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The real object behind this proxy.
    pub fn delegate(&self) -> &T {
        &self.delegate
    }

    pub fn into_delegate(self) -> Box<T> {
        self.delegate
    }

    pub fn class(&self) -> ProxyClass {
        ProxyClass {
            capability: self.handler.capability(),
            implementation: self.delegate.implementation_name(),
        }
    }

    pub(super) fn dispatch<F>(
        &mut self,
        method: Method,
        args: &[Arg<'_>],
        mut call: F,
    ) -> SqlResult<Return>
    where
        F: FnMut(&mut T) -> SqlResult<Return>,
    {
        let target = self.delegate.implementation_name();
        let delegate = &mut *self.delegate;
        let mut proceed = || call(&mut *delegate);
        self.handler
            .invoke(MethodInvocation::new(target, method, args, &mut proceed))
    }

    pub(super) fn dispatch_ref<F>(
        &self,
        method: Method,
        args: &[Arg<'_>],
        call: F,
    ) -> SqlResult<Return>
    where
        F: Fn(&T) -> SqlResult<Return>,
    {
        let target = self.delegate.implementation_name();
        let delegate = &*self.delegate;
        let mut proceed = || call(delegate);
        self.handler
            .invoke(MethodInvocation::new(target, method, args, &mut proceed))
    }
}

impl<T: Wrapper + ?Sized, H: InvocationHandler<T>> Wrapper for Proxy<T, H> {
    fn is_wrapper_for(&self, capability: Capability) -> SqlResult<bool> {
        self.handler.is_wrapper_for(&self.delegate, capability)
    }

    fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn std::any::Any> {
        self.handler.unwrap(&self.delegate, capability)
    }

    fn proxy_class(&self) -> Option<ProxyClass> {
        Some(self.class())
    }
}

impl<T: Wrapper + ?Sized, H: InvocationHandler<T>> fmt::Debug for Proxy<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy").field("class", &self.class()).finish()
    }
}

/// Describes a proxy: the capability it impersonates and the real type behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyClass {
    capability: Capability,
    implementation: &'static str,
}

impl ProxyClass {
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Type name of the real object.
    pub fn implementation(&self) -> &'static str {
        self.implementation
    }
}

/// Builds proxies.
pub struct ProxyFactory;

impl ProxyFactory {
    /// Bind `handler` to `delegate`.
    pub fn create_proxy<T, H>(delegate: Box<T>, handler: H) -> Proxy<T, H>
    where
        T: Wrapper + ?Sized,
        H: InvocationHandler<T>,
    {
        Proxy { handler, delegate }
    }

    /// Whether `object` is a proxy impersonating `capability`.
    pub fn is_proxy<W: Wrapper + ?Sized>(object: &W, capability: Capability) -> bool {
        object
            .proxy_class()
            .is_some_and(|class| class.capability() == capability)
    }
}
