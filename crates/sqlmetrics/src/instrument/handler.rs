use super::factory::MetricsProxyFactory;
use crate::api::Wrapper;
use crate::error::SqlResult;
use crate::naming::{Category, MetricName, NamingContext};
use crate::proxy::{InvocationHandler, Method, MethodInvocation, Return};
use crate::registry::TimerContext;
use crate::Capability;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// What a [`TimingHandler`] does with one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Forward untouched.
    Proceed,
    /// Forward, then wrap whatever child object comes back under `naming`.
    Wrap { naming: NamingContext },
    /// Time the call under `metric`, then wrap any child object under `naming`.
    Timed {
        metric: MetricName,
        naming: NamingContext,
    },
}

/// Per-category timing policy plugged into [`TimingHandler`].
pub trait Instrumentation: Send + Sync + 'static {
    /// Handle type the proxy stands in for.
    type Target: Wrapper + ?Sized;

    const CATEGORY: Category;

    /// Decide how to treat `invocation`. `close` never reaches this method.
    fn intercept(
        &self,
        naming: &NamingContext,
        invocation: &MethodInvocation<'_>,
        factory: &MetricsProxyFactory,
    ) -> SqlResult<Interception>;
}

enum LifeState {
    Untimed,
    Running(TimerContext),
    Stopped,
}

/// Whole microseconds in `elapsed`, saturating at `u64::MAX`.
pub(crate) fn elapsed_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// Lifetime timer of one wrapped object, stopped by its first `close`.
pub(crate) struct LifeTimer(Mutex<LifeState>);

impl LifeTimer {
    pub(crate) fn untimed() -> Self {
        Self(Mutex::new(LifeState::Untimed))
    }

    pub(crate) fn running(context: TimerContext) -> Self {
        Self(Mutex::new(LifeState::Running(context)))
    }

    fn stop(&self, category: Category) {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, LifeState::Stopped) {
            LifeState::Running(context) => {
                let metric = context.name().to_string();
                let elapsed = context.stop();
                tracing::debug!(
                    target: "sqlmetrics.proxy",
                    category = %category,
                    metric = %metric,
                    elapsed_us = elapsed_micros(elapsed),
                    "lifetime timer stopped"
                );
            }
            LifeState::Stopped => {
                tracing::warn!(
                    target: "sqlmetrics.proxy",
                    category = %category,
                    "close called on an already closed object"
                );
            }
            LifeState::Untimed => *state = LifeState::Untimed,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        matches!(
            *self.0.lock().unwrap_or_else(PoisonError::into_inner),
            LifeState::Running(_)
        )
    }
}

/// The one handler shared by every category.
///
/// Owns the object's naming context and lifetime timer. `close` stops the lifetime
/// timer and then reaches the real object; everything else is classified by the
/// category's [`Instrumentation`].
pub struct TimingHandler<S> {
    strategy: S,
    naming: NamingContext,
    factory: MetricsProxyFactory,
    life: LifeTimer,
}

impl<S: Instrumentation> TimingHandler<S> {
    pub(crate) fn new(
        strategy: S,
        naming: NamingContext,
        factory: MetricsProxyFactory,
        life: LifeTimer,
    ) -> Self {
        Self {
            strategy,
            naming,
            factory,
            life,
        }
    }

    pub fn naming(&self) -> &NamingContext {
        &self.naming
    }

    /// Whether the lifetime timer is still running, i.e. the object was not closed.
    pub fn is_timing(&self) -> bool {
        self.life.is_running()
    }

    fn timed(
        &self,
        invocation: &mut MethodInvocation<'_>,
        metric: MetricName,
        naming: NamingContext,
    ) -> SqlResult<Return> {
        if invocation.method().is_execute() {
            let sql = invocation.sql().or(naming.sql_id());
            self.factory.log_execution(&metric, sql);
        }

        let context = self.factory.start_timer(&metric);
        match invocation.proceed() {
            Ok(ret) => {
                let _ = context.stop();
                Ok(self.factory.wrap_return(ret, &naming))
            }
            Err(err) => {
                if self.factory.config().record_failed_calls {
                    let _ = context.stop();
                }
                Err(err)
            }
        }
    }
}

impl<S: Instrumentation> InvocationHandler<S::Target> for TimingHandler<S> {
    fn capability(&self) -> Capability {
        S::CATEGORY.capability()
    }

    fn invoke(&self, mut invocation: MethodInvocation<'_>) -> SqlResult<Return> {
        if invocation.method() == Method::Close {
            self.life.stop(S::CATEGORY);
            return invocation.proceed();
        }

        match self
            .strategy
            .intercept(&self.naming, &invocation, &self.factory)?
        {
            Interception::Proceed => invocation.proceed(),
            Interception::Wrap { naming } => {
                let ret = invocation.proceed()?;
                Ok(self.factory.wrap_return(ret, &naming))
            }
            Interception::Timed { metric, naming } => self.timed(&mut invocation, metric, naming),
        }
    }
}

impl<S: Instrumentation> fmt::Debug for TimingHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingHandler")
            .field("category", &S::CATEGORY)
            .field("naming", &self.naming)
            .field("timing", &self.is_timing())
            .finish()
    }
}
