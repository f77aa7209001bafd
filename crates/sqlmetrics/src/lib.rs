//! # sqlmetrics
//!
//! Timing proxies for a SQL client API.
//!
//! Wrap a data source once and every connection, statement and result set obtained
//! through it is wrapped too. Calls keep their exact behaviour (arguments, results
//! and errors pass through untouched) while durations land in named timers.
//!
//! ## Features
//!
//! - **Transparent**: a proxy implements the same trait as the object it wraps
//! - **Stable names**: SQL is lowercased and whitespace-collapsed, so the same
//!   statement always reaches the same timer
//! - **Lifetimes and executions**: every wrapped object is timed from wrap to
//!   `close`, every execution on its own `.exec` timer
//! - **Pluggable registry**: in-memory [`TimerRegistry`] or the `metrics` facade
//!   through [`RecorderRegistry`]
//!
//! ## Example
//!
//! ```ignore
//! use sqlmetrics::{MetricsProxyFactory, SqliteDataSource, TimerRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TimerRegistry::new());
//! let factory = MetricsProxyFactory::new(registry.clone());
//! let ds = factory.wrap_data_source("test", Box::new(SqliteDataSource::memory("test")?));
//!
//! let mut conn = ds.get_connection()?;
//! let mut stmt = conn.prepare_statement("select * from METRICS_TEST")?;
//! stmt.close()?;
//! conn.close()?;
//!
//! assert_eq!(registry.count("prepared_statement.test.[select * from metrics_test]"), 1);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod instrument;
pub mod naming;
pub mod proxy;
pub mod registry;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod mock;

pub use api::{
    CallableStatement, Capability, Connection, DataSource, PreparedStatement, ResultSet,
    Statement, Wrapper, WrapperExt, unwrap_self,
};
pub use config::{LogLevel, MetricsConfig};
pub use error::{SqlError, SqlResult};
pub use instrument::{Instrumentation, Interception, MetricsProxyFactory, TimingHandler};
pub use naming::{Category, MetricName, NamingContext, sql_id};
pub use proxy::{InvocationHandler, MethodInvocation, Proxy, ProxyClass, ProxyFactory};
pub use registry::{MetricRegistry, Timer, TimerContext, TimerRegistry, TimerSnapshot};
pub use value::Value;

#[cfg(feature = "metrics")]
pub use registry::RecorderRegistry;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDataSource;
