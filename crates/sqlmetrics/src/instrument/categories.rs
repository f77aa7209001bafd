//! Timing policies, one per handle category.

use super::factory::MetricsProxyFactory;
use super::handler::{Instrumentation, Interception};
use crate::api::{
    CallableStatement, Connection, DataSource, PreparedStatement, ResultSet, Statement,
};
use crate::error::SqlResult;
use crate::naming::{Category, EXEC_SUFFIX, NamingContext};
use crate::proxy::{Method, MethodInvocation};

/// Times `get_connection` as `data_source.<name>` and wraps every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSourceTiming;

impl Instrumentation for DataSourceTiming {
    type Target = dyn DataSource;
    const CATEGORY: Category = Category::DataSource;

    fn intercept(
        &self,
        naming: &NamingContext,
        invocation: &MethodInvocation<'_>,
        _factory: &MetricsProxyFactory,
    ) -> SqlResult<Interception> {
        Ok(match invocation.method() {
            Method::GetConnection => Interception::Timed {
                metric: naming.metric_name(Self::CATEGORY),
                naming: naming.clone(),
            },
            _ => Interception::Proceed,
        })
    }
}

/// Wraps statements. Prepared and callable statements get their SQL in their name
/// right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionTiming;

impl Instrumentation for ConnectionTiming {
    type Target = dyn Connection;
    const CATEGORY: Category = Category::Connection;

    fn intercept(
        &self,
        naming: &NamingContext,
        invocation: &MethodInvocation<'_>,
        factory: &MetricsProxyFactory,
    ) -> SqlResult<Interception> {
        Ok(match invocation.method() {
            Method::CreateStatement => Interception::Wrap {
                naming: naming.clone(),
            },
            Method::PrepareStatement | Method::PrepareCall => {
                let sql: &str = invocation.arg_at(0)?;
                Interception::Wrap {
                    naming: naming.with_sql_id(factory.sql_id(sql)),
                }
            }
            _ => Interception::Proceed,
        })
    }
}

/// Plain statements receive their SQL per call, so the execution timer is
/// named per call: `statement.<name>.[sql].exec`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementTiming;

impl Instrumentation for StatementTiming {
    type Target = dyn Statement;
    const CATEGORY: Category = Category::Statement;

    fn intercept(
        &self,
        naming: &NamingContext,
        invocation: &MethodInvocation<'_>,
        factory: &MetricsProxyFactory,
    ) -> SqlResult<Interception> {
        if !invocation.method().is_execute() {
            return Ok(Interception::Proceed);
        }
        let sql: &str = invocation.arg_at(0)?;
        let bound = naming.with_sql_id(factory.sql_id(sql));
        Ok(Interception::Timed {
            metric: bound.metric_name(Self::CATEGORY).with_suffix(EXEC_SUFFIX),
            naming: bound,
        })
    }
}

/// Execution timer of a statement whose SQL is already part of `naming`.
fn bound_execution(
    category: Category,
    naming: &NamingContext,
    invocation: &MethodInvocation<'_>,
) -> Interception {
    if invocation.method().is_execute() {
        Interception::Timed {
            metric: naming.metric_name(category).with_suffix(EXEC_SUFFIX),
            naming: naming.clone(),
        }
    } else {
        Interception::Proceed
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PreparedStatementTiming;

impl Instrumentation for PreparedStatementTiming {
    type Target = dyn PreparedStatement;
    const CATEGORY: Category = Category::PreparedStatement;

    fn intercept(
        &self,
        naming: &NamingContext,
        invocation: &MethodInvocation<'_>,
        _factory: &MetricsProxyFactory,
    ) -> SqlResult<Interception> {
        Ok(bound_execution(Self::CATEGORY, naming, invocation))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CallableStatementTiming;

impl Instrumentation for CallableStatementTiming {
    type Target = dyn CallableStatement;
    const CATEGORY: Category = Category::CallableStatement;

    fn intercept(
        &self,
        naming: &NamingContext,
        invocation: &MethodInvocation<'_>,
        _factory: &MetricsProxyFactory,
    ) -> SqlResult<Interception> {
        Ok(bound_execution(Self::CATEGORY, naming, invocation))
    }
}

/// Cursors only carry their lifetime timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultSetTiming;

impl Instrumentation for ResultSetTiming {
    type Target = dyn ResultSet;
    const CATEGORY: Category = Category::ResultSet;

    fn intercept(
        &self,
        _naming: &NamingContext,
        _invocation: &MethodInvocation<'_>,
        _factory: &MetricsProxyFactory,
    ) -> SqlResult<Interception> {
        Ok(Interception::Proceed)
    }
}
