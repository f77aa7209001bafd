//! Timing proxies for the handle family.
//!
//! [`MetricsProxyFactory`] wraps a data source; every child handle produced through
//! it is wrapped in turn by [`TimingHandler`], parameterized by the category's
//! [`Instrumentation`]. Timers created along the way:
//!
//! | Timer | Started | Stopped |
//! |---|---|---|
//! | `data_source.<name>` | `get_connection` called | connection returned |
//! | `connection.<name>` | connection wrapped | connection closed |
//! | `statement.<name>` | statement wrapped | statement closed |
//! | `statement.<name>.[sql].exec` | `execute_*(sql)` called | call returned |
//! | `prepared_statement.<name>.[sql]` | statement prepared | statement closed |
//! | `prepared_statement.<name>.[sql].exec` | `execute_*()` called | call returned |
//! | `callable_statement.<name>.[sql]` (`.exec`) | as prepared statements | |
//! | `result_set.<name>.[sql]` | result set returned | result set closed |

mod categories;
mod factory;
mod handler;


pub use categories::{
    CallableStatementTiming, ConnectionTiming, DataSourceTiming, PreparedStatementTiming,
    ResultSetTiming, StatementTiming,
};
pub use factory::{
    CallableStatementProxy, ConnectionProxy, DataSourceProxy, MetricsProxyFactory,
    PreparedStatementProxy, ResultSetProxy, StatementProxy,
};
pub use handler::{Instrumentation, Interception, TimingHandler};
