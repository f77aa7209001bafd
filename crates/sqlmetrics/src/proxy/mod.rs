//! Call interception for the handle family in [`crate::api`].
//!
//! A [`Proxy`] owns a real object and an [`InvocationHandler`]. Each method called on
//! the proxy is turned into a [`MethodInvocation`] (method identity, arguments and a
//! `proceed` operation) and handed to the handler, which either runs its own logic
//! around the call or simply proceeds.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlmetrics::proxy::{InvocationHandler, MethodInvocation, ProxyFactory, Return};
//! use sqlmetrics::{Capability, Connection, SqlResult};
//!
//! struct CountingHandler(std::sync::atomic::AtomicU64);
//!
//! impl InvocationHandler<dyn Connection> for CountingHandler {
//!     fn capability(&self) -> Capability {
//!         Capability::of::<Box<dyn Connection>>()
//!     }
//!
//!     fn invoke(&self, mut invocation: MethodInvocation<'_>) -> SqlResult<Return> {
//!         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         invocation.proceed()
//!     }
//! }
//!
//! let conn: Box<dyn Connection> =
//!     Box::new(ProxyFactory::create_proxy(real_conn, CountingHandler(Default::default())));
//! ```

mod factory;
mod handler;
mod invocation;
mod trampoline;

#[cfg(test)]
mod tests;

pub use factory::{Proxy, ProxyClass, ProxyFactory};
pub use handler::InvocationHandler;
pub use invocation::{Arg, FromArg, Method, MethodInvocation, Return};
