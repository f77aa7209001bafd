use super::categories::{
    CallableStatementTiming, ConnectionTiming, DataSourceTiming, PreparedStatementTiming,
    ResultSetTiming, StatementTiming,
};
use super::handler::{Instrumentation, LifeTimer, TimingHandler};
use crate::api::{
    CallableStatement, Connection, DataSource, PreparedStatement, ResultSet, Statement, Wrapper,
};
use crate::config::{LogLevel, MetricsConfig};
use crate::naming::{self, Category, MetricName, NamingContext, truncate_sql_bytes};
use crate::proxy::{InvocationHandler, Proxy, ProxyFactory, Return};
use crate::registry::{MetricRegistry, TimerContext};
use std::fmt;
use std::sync::Arc;

pub type DataSourceProxy = Proxy<dyn DataSource, TimingHandler<DataSourceTiming>>;
pub type ConnectionProxy = Proxy<dyn Connection, TimingHandler<ConnectionTiming>>;
pub type StatementProxy = Proxy<dyn Statement, TimingHandler<StatementTiming>>;
pub type PreparedStatementProxy =
    Proxy<dyn PreparedStatement, TimingHandler<PreparedStatementTiming>>;
pub type CallableStatementProxy =
    Proxy<dyn CallableStatement, TimingHandler<CallableStatementTiming>>;
pub type ResultSetProxy = Proxy<dyn ResultSet, TimingHandler<ResultSetTiming>>;

/// Entry point of the timing layer.
///
/// Wraps a data source under a name; from then on every connection, statement and
/// result set obtained through the wrapper comes back wrapped as well, carrying
/// the name down. Cheap to clone: every wrapped object holds a clone.
///
/// ```rust,ignore
/// let registry = Arc::new(TimerRegistry::new());
/// let factory = MetricsProxyFactory::new(registry.clone());
/// let ds = factory.wrap_data_source("orders", Box::new(SqliteDataSource::memory("orders")?));
///
/// let mut conn = ds.get_connection()?;
/// let mut stmt = conn.prepare_statement("SELECT * FROM orders")?;
/// let mut rows = stmt.execute_query()?;
/// rows.close()?;
/// stmt.close()?;
/// conn.close()?;
///
/// assert_eq!(registry.count("prepared_statement.orders.[select * from orders].exec"), 1);
/// ```
#[derive(Clone)]
pub struct MetricsProxyFactory {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<dyn MetricRegistry>,
    config: MetricsConfig,
}

impl MetricsProxyFactory {
    pub fn new(registry: Arc<dyn MetricRegistry>) -> Self {
        Self::with_config(registry, MetricsConfig::default())
    }

    pub fn with_config(registry: Arc<dyn MetricRegistry>, config: MetricsConfig) -> Self {
        Self {
            inner: Arc::new(Inner { registry, config }),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<dyn MetricRegistry> {
        &self.inner.registry
    }

    /// Normalized SQL as it appears in metric names.
    pub fn sql_id(&self, sql: &str) -> String {
        naming::sql_id(sql, self.inner.config.max_sql_length)
    }

    pub fn start_timer(&self, metric: &MetricName) -> TimerContext {
        self.inner.registry.timer(metric.as_str()).start()
    }

    /// Wrap `data_source` under `name`.
    ///
    /// The data source itself has no lifetime timer; each `get_connection` is timed
    /// as `data_source.<name>` and each connection it hands out lives under
    /// `connection.<name>`.
    pub fn wrap_data_source(
        &self,
        name: impl Into<Arc<str>>,
        data_source: Box<dyn DataSource>,
    ) -> DataSourceProxy {
        let naming = NamingContext::new(name);
        self.create(DataSourceTiming, naming, data_source, LifeTimer::untimed())
    }

    pub fn wrap_connection(
        &self,
        naming: NamingContext,
        connection: Box<dyn Connection>,
    ) -> ConnectionProxy {
        let life = self.lifetime(Category::Connection, &naming);
        self.create(ConnectionTiming, naming, connection, life)
    }

    pub fn wrap_statement(
        &self,
        naming: NamingContext,
        statement: Box<dyn Statement>,
    ) -> StatementProxy {
        let life = self.lifetime(Category::Statement, &naming);
        self.create(StatementTiming, naming, statement, life)
    }

    pub fn wrap_prepared_statement(
        &self,
        naming: NamingContext,
        statement: Box<dyn PreparedStatement>,
    ) -> PreparedStatementProxy {
        let life = self.lifetime(Category::PreparedStatement, &naming);
        self.create(PreparedStatementTiming, naming, statement, life)
    }

    pub fn wrap_callable_statement(
        &self,
        naming: NamingContext,
        statement: Box<dyn CallableStatement>,
    ) -> CallableStatementProxy {
        let life = self.lifetime(Category::CallableStatement, &naming);
        self.create(CallableStatementTiming, naming, statement, life)
    }

    pub fn wrap_result_set(
        &self,
        naming: NamingContext,
        result_set: Box<dyn ResultSet>,
    ) -> ResultSetProxy {
        let life = self.lifetime(Category::ResultSet, &naming);
        self.create(ResultSetTiming, naming, result_set, life)
    }

    /// Wrap the child object carried by `ret`, if any.
    pub(crate) fn wrap_return(&self, ret: Return, naming: &NamingContext) -> Return {
        match ret {
            Return::Connection(c) => {
                Return::Connection(Box::new(self.wrap_connection(naming.clone(), c)))
            }
            Return::Statement(s) => {
                Return::Statement(Box::new(self.wrap_statement(naming.clone(), s)))
            }
            Return::PreparedStatement(s) => Return::PreparedStatement(Box::new(
                self.wrap_prepared_statement(naming.clone(), s),
            )),
            Return::CallableStatement(s) => Return::CallableStatement(Box::new(
                self.wrap_callable_statement(naming.clone(), s),
            )),
            Return::ResultSet(r) => {
                Return::ResultSet(Box::new(self.wrap_result_set(naming.clone(), r)))
            }
            other => other,
        }
    }

    pub(crate) fn log_execution(&self, metric: &MetricName, sql: Option<&str>) {
        let config = &self.inner.config;
        if !config.log_sql {
            return;
        }

        // Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    LogLevel::Error => tracing::error!($($field)*),
                    LogLevel::Warn  => tracing::warn!($($field)*),
                    LogLevel::Info  => tracing::info!($($field)*),
                    LogLevel::Debug => tracing::debug!($($field)*),
                    LogLevel::Trace => tracing::trace!($($field)*),
                }
            };
        }

        let sql = sql.unwrap_or("-");
        let sql = match config.log_sql_max_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        };
        emit_at_level!(
            config.sql_log_level,
            target: "sqlmetrics.sql",
            metric = %metric,
            sql = %sql,
            "timed execution"
        );
    }

    fn lifetime(&self, category: Category, naming: &NamingContext) -> LifeTimer {
        LifeTimer::running(self.start_timer(&naming.metric_name(category)))
    }

    fn create<S, T>(
        &self,
        strategy: S,
        naming: NamingContext,
        delegate: Box<T>,
        life: LifeTimer,
    ) -> Proxy<T, TimingHandler<S>>
    where
        S: Instrumentation<Target = T>,
        T: Wrapper + ?Sized,
        TimingHandler<S>: InvocationHandler<T>,
    {
        tracing::debug!(
            target: "sqlmetrics.proxy",
            category = %S::CATEGORY,
            metric = %naming.metric_name(S::CATEGORY),
            implementation = delegate.implementation_name(),
            "wrapped"
        );
        let handler = TimingHandler::new(strategy, naming, self.clone(), life);
        ProxyFactory::create_proxy(delegate, handler)
    }
}

impl fmt::Debug for MetricsProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsProxyFactory")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
