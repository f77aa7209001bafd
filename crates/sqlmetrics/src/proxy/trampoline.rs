//! Interface impls for [`Proxy`]: each method packs its arguments, hands the call to
//! the handler and converts the [`Return`] back to the declared type.

use super::factory::Proxy;
use super::handler::InvocationHandler;
use super::invocation::{Arg, Method, Return};
use crate::api::{
    CallableStatement, Connection, DataSource, PreparedStatement, ResultSet, Statement,
};
use crate::error::SqlResult;
use crate::value::Value;

impl<H: InvocationHandler<dyn DataSource>> DataSource for Proxy<dyn DataSource, H> {
    fn get_connection(&self) -> SqlResult<Box<dyn Connection>> {
        self.dispatch_ref(Method::GetConnection, &[], |ds| {
            ds.get_connection().map(Return::Connection)
        })?
        .into_connection(Method::GetConnection)
    }
}

impl<H: InvocationHandler<dyn Connection>> Connection for Proxy<dyn Connection, H> {
    fn create_statement(&mut self) -> SqlResult<Box<dyn Statement>> {
        self.dispatch(Method::CreateStatement, &[], |conn| {
            conn.create_statement().map(Return::Statement)
        })?
        .into_statement(Method::CreateStatement)
    }

    fn prepare_statement(&mut self, sql: &str) -> SqlResult<Box<dyn PreparedStatement>> {
        self.dispatch(Method::PrepareStatement, &[Arg::Str(sql)], |conn| {
            conn.prepare_statement(sql).map(Return::PreparedStatement)
        })?
        .into_prepared_statement(Method::PrepareStatement)
    }

    fn prepare_call(&mut self, sql: &str) -> SqlResult<Box<dyn CallableStatement>> {
        self.dispatch(Method::PrepareCall, &[Arg::Str(sql)], |conn| {
            conn.prepare_call(sql).map(Return::CallableStatement)
        })?
        .into_callable_statement(Method::PrepareCall)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.dispatch_ref(Method::IsClosed, &[], |conn| conn.is_closed().map(Return::Bool))?
            .into_bool(Method::IsClosed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.dispatch(Method::Close, &[], |conn| conn.close().map(|()| Return::Unit))?
            .into_unit(Method::Close)
    }
}

impl<H: InvocationHandler<dyn Statement>> Statement for Proxy<dyn Statement, H> {
    fn execute_query(&mut self, sql: &str) -> SqlResult<Box<dyn ResultSet>> {
        self.dispatch(Method::ExecuteQuery, &[Arg::Str(sql)], |stmt| {
            stmt.execute_query(sql).map(Return::ResultSet)
        })?
        .into_result_set(Method::ExecuteQuery)
    }

    fn execute_update(&mut self, sql: &str) -> SqlResult<u64> {
        self.dispatch(Method::ExecuteUpdate, &[Arg::Str(sql)], |stmt| {
            stmt.execute_update(sql).map(Return::Count)
        })?
        .into_count(Method::ExecuteUpdate)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.dispatch_ref(Method::IsClosed, &[], |stmt| stmt.is_closed().map(Return::Bool))?
            .into_bool(Method::IsClosed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.dispatch(Method::Close, &[], |stmt| stmt.close().map(|()| Return::Unit))?
            .into_unit(Method::Close)
    }
}

impl<H: InvocationHandler<dyn PreparedStatement>> PreparedStatement
    for Proxy<dyn PreparedStatement, H>
{
    fn set_value(&mut self, index: usize, value: Value) -> SqlResult<()> {
        let args = [Arg::Index(index), Arg::Value(&value)];
        self.dispatch(Method::SetValue, &args, |stmt| {
            stmt.set_value(index, value.clone()).map(|()| Return::Unit)
        })?
        .into_unit(Method::SetValue)
    }

    fn execute_query(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        self.dispatch(Method::ExecuteQuery, &[], |stmt| {
            stmt.execute_query().map(Return::ResultSet)
        })?
        .into_result_set(Method::ExecuteQuery)
    }

    fn execute_update(&mut self) -> SqlResult<u64> {
        self.dispatch(Method::ExecuteUpdate, &[], |stmt| {
            stmt.execute_update().map(Return::Count)
        })?
        .into_count(Method::ExecuteUpdate)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.dispatch_ref(Method::IsClosed, &[], |stmt| stmt.is_closed().map(Return::Bool))?
            .into_bool(Method::IsClosed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.dispatch(Method::Close, &[], |stmt| stmt.close().map(|()| Return::Unit))?
            .into_unit(Method::Close)
    }
}

impl<H: InvocationHandler<dyn CallableStatement>> CallableStatement
    for Proxy<dyn CallableStatement, H>
{
    fn set_value(&mut self, index: usize, value: Value) -> SqlResult<()> {
        let args = [Arg::Index(index), Arg::Value(&value)];
        self.dispatch(Method::SetValue, &args, |stmt| {
            stmt.set_value(index, value.clone()).map(|()| Return::Unit)
        })?
        .into_unit(Method::SetValue)
    }

    fn execute_query(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        self.dispatch(Method::ExecuteQuery, &[], |stmt| {
            stmt.execute_query().map(Return::ResultSet)
        })?
        .into_result_set(Method::ExecuteQuery)
    }

    fn execute_update(&mut self) -> SqlResult<u64> {
        self.dispatch(Method::ExecuteUpdate, &[], |stmt| {
            stmt.execute_update().map(Return::Count)
        })?
        .into_count(Method::ExecuteUpdate)
    }

    fn get_out_value(&self, index: usize) -> SqlResult<Value> {
        self.dispatch_ref(Method::GetOutValue, &[Arg::Index(index)], |stmt| {
            stmt.get_out_value(index).map(Return::Value)
        })?
        .into_value(Method::GetOutValue)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.dispatch_ref(Method::IsClosed, &[], |stmt| stmt.is_closed().map(Return::Bool))?
            .into_bool(Method::IsClosed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.dispatch(Method::Close, &[], |stmt| stmt.close().map(|()| Return::Unit))?
            .into_unit(Method::Close)
    }
}

impl<H: InvocationHandler<dyn ResultSet>> ResultSet for Proxy<dyn ResultSet, H> {
    fn next(&mut self) -> SqlResult<bool> {
        self.dispatch(Method::Next, &[], |rs| rs.next().map(Return::Bool))?
            .into_bool(Method::Next)
    }

    fn get_value(&self, index: usize) -> SqlResult<Value> {
        self.dispatch_ref(Method::GetValue, &[Arg::Index(index)], |rs| {
            rs.get_value(index).map(Return::Value)
        })?
        .into_value(Method::GetValue)
    }

    fn get_value_by_name(&self, column: &str) -> SqlResult<Value> {
        self.dispatch_ref(Method::GetValueByName, &[Arg::Str(column)], |rs| {
            rs.get_value_by_name(column).map(Return::Value)
        })?
        .into_value(Method::GetValueByName)
    }

    fn column_count(&self) -> SqlResult<usize> {
        self.dispatch_ref(Method::ColumnCount, &[], |rs| rs.column_count().map(Return::Size))?
            .into_size(Method::ColumnCount)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        self.dispatch_ref(Method::IsClosed, &[], |rs| rs.is_closed().map(Return::Bool))?
            .into_bool(Method::IsClosed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.dispatch(Method::Close, &[], |rs| rs.close().map(|()| Return::Unit))?
            .into_unit(Method::Close)
    }
}
