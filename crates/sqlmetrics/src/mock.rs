//! Scriptable in-memory driver for unit tests.
//!
//! Every call on a mock object is appended to a shared log as
//! `object.method(args)`. Methods named with [`MockDriver::fail`] return
//! [`SqlError::Driver`] instead of running.

use crate::api::{
    CallableStatement, Capability, Connection, DataSource, PreparedStatement, ResultSet,
    Statement, Wrapper, unwrap_self,
};
use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    rows: usize,
}

#[derive(Clone)]
pub(crate) struct MockDriver {
    state: Arc<Mutex<State>>,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        let state = State {
            rows: 2,
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn data_source(&self) -> Box<dyn DataSource> {
        Box::new(MockDataSource {
            driver: self.clone(),
        })
    }

    pub(crate) fn connection(&self) -> Box<dyn Connection> {
        Box::new(MockConnection {
            driver: self.clone(),
            closed: false,
        })
    }

    /// Make every later call of `method` fail.
    pub(crate) fn fail(&self, method: &'static str) {
        self.state().failing.insert(method);
    }

    /// Number of rows each result set yields.
    pub(crate) fn set_rows(&self, rows: usize) {
        self.state().rows = rows;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub(crate) fn count_calls(&self, call: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == call).count()
    }

    fn record(&self, object: &str, method: &'static str, args: String) -> SqlResult<()> {
        let mut state = self.state();
        state.calls.push(format!("{object}.{method}({args})"));
        if state.failing.contains(method) {
            return Err(SqlError::driver(format!("injected failure: {method}")));
        }
        Ok(())
    }

    fn result_set(&self) -> Box<dyn ResultSet> {
        Box::new(MockResultSet {
            driver: self.clone(),
            rows: self.state().rows,
            position: 0,
            closed: false,
        })
    }
}

macro_rules! mock_wrapper {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Wrapper for $ty {
                fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn Any> {
                    unwrap_self(self, capability)
                }
            }
        )*
    };
}

mock_wrapper!(
    MockDataSource,
    MockConnection,
    MockStatement,
    MockPreparedStatement,
    MockCallableStatement,
    MockResultSet,
);

pub(crate) struct MockDataSource {
    driver: MockDriver,
}

impl DataSource for MockDataSource {
    fn get_connection(&self) -> SqlResult<Box<dyn Connection>> {
        self.driver
            .record("data_source", "get_connection", String::new())?;
        Ok(self.driver.connection())
    }
}

pub(crate) struct MockConnection {
    driver: MockDriver,
    closed: bool,
}

impl Connection for MockConnection {
    fn create_statement(&mut self) -> SqlResult<Box<dyn Statement>> {
        self.driver
            .record("connection", "create_statement", String::new())?;
        Ok(Box::new(MockStatement {
            driver: self.driver.clone(),
            closed: false,
        }))
    }

    fn prepare_statement(&mut self, sql: &str) -> SqlResult<Box<dyn PreparedStatement>> {
        self.driver
            .record("connection", "prepare_statement", sql.to_string())?;
        Ok(Box::new(MockPreparedStatement {
            driver: self.driver.clone(),
            params: Vec::new(),
            closed: false,
        }))
    }

    fn prepare_call(&mut self, sql: &str) -> SqlResult<Box<dyn CallableStatement>> {
        self.driver
            .record("connection", "prepare_call", sql.to_string())?;
        Ok(Box::new(MockCallableStatement {
            driver: self.driver.clone(),
            closed: false,
        }))
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.driver.record("connection", "is_closed", String::new())?;
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.driver.record("connection", "close", String::new())?;
        self.closed = true;
        Ok(())
    }
}

pub(crate) struct MockStatement {
    driver: MockDriver,
    closed: bool,
}

impl Statement for MockStatement {
    fn execute_query(&mut self, sql: &str) -> SqlResult<Box<dyn ResultSet>> {
        self.driver
            .record("statement", "execute_query", sql.to_string())?;
        Ok(self.driver.result_set())
    }

    fn execute_update(&mut self, sql: &str) -> SqlResult<u64> {
        self.driver
            .record("statement", "execute_update", sql.to_string())?;
        Ok(1)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.driver.record("statement", "is_closed", String::new())?;
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.driver.record("statement", "close", String::new())?;
        self.closed = true;
        Ok(())
    }
}

pub(crate) struct MockPreparedStatement {
    driver: MockDriver,
    params: Vec<(usize, Value)>,
    closed: bool,
}

impl PreparedStatement for MockPreparedStatement {
    fn set_value(&mut self, index: usize, value: Value) -> SqlResult<()> {
        self.driver
            .record("prepared_statement", "set_value", format!("{index}, {value}"))?;
        self.params.push((index, value));
        Ok(())
    }

    fn execute_query(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        self.driver
            .record("prepared_statement", "execute_query", String::new())?;
        Ok(self.driver.result_set())
    }

    fn execute_update(&mut self) -> SqlResult<u64> {
        self.driver
            .record("prepared_statement", "execute_update", String::new())?;
        Ok(self.params.len() as u64)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.driver
            .record("prepared_statement", "is_closed", String::new())?;
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.driver
            .record("prepared_statement", "close", String::new())?;
        self.closed = true;
        Ok(())
    }
}

pub(crate) struct MockCallableStatement {
    driver: MockDriver,
    closed: bool,
}

impl CallableStatement for MockCallableStatement {
    fn set_value(&mut self, index: usize, value: Value) -> SqlResult<()> {
        self.driver
            .record("callable_statement", "set_value", format!("{index}, {value}"))
    }

    fn execute_query(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        self.driver
            .record("callable_statement", "execute_query", String::new())?;
        Ok(self.driver.result_set())
    }

    fn execute_update(&mut self) -> SqlResult<u64> {
        self.driver
            .record("callable_statement", "execute_update", String::new())?;
        Ok(0)
    }

    fn get_out_value(&self, index: usize) -> SqlResult<Value> {
        self.driver
            .record("callable_statement", "get_out_value", index.to_string())?;
        Ok(Value::Integer(index as i64 * 10))
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.driver
            .record("callable_statement", "close", String::new())?;
        self.closed = true;
        Ok(())
    }
}

/// Yields rows `1..=rows`, each with a single `id` column.
pub(crate) struct MockResultSet {
    driver: MockDriver,
    rows: usize,
    position: usize,
    closed: bool,
}

impl ResultSet for MockResultSet {
    fn next(&mut self) -> SqlResult<bool> {
        self.driver.record("result_set", "next", String::new())?;
        if self.position < self.rows {
            self.position += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn get_value(&self, index: usize) -> SqlResult<Value> {
        self.driver
            .record("result_set", "get_value", index.to_string())?;
        match index {
            0 => Ok(Value::Integer(self.position as i64)),
            _ => Err(SqlError::ColumnNotFound(index.to_string())),
        }
    }

    fn get_value_by_name(&self, column: &str) -> SqlResult<Value> {
        self.driver
            .record("result_set", "get_value_by_name", column.to_string())?;
        match column {
            "id" => Ok(Value::Integer(self.position as i64)),
            _ => Err(SqlError::ColumnNotFound(column.to_string())),
        }
    }

    fn column_count(&self) -> SqlResult<usize> {
        Ok(1)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.driver.record("result_set", "close", String::new())?;
        self.closed = true;
        Ok(())
    }
}
