//! The database handle family that proxies stand in for.
//!
//! A driver implements these traits; [`MetricsProxyFactory`](crate::MetricsProxyFactory)
//! wraps them in proxies implementing the very same traits, so callers cannot tell a
//! wrapped handle from a real one.
//!
//! Parameter indexes are 1-based (as in `?1`, `?2` placeholders); column indexes are
//! 0-based.

use crate::error::{SqlError, SqlResult};
use crate::proxy::ProxyClass;
use crate::value::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a type an object can be asked to unwrap to.
#[derive(Clone, Copy)]
pub struct Capability {
    id: TypeId,
    name: &'static str,
}

impl Capability {
    /// The capability of type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Unwrap protocol shared by every handle.
///
/// `unwrap_ref` returns the object viewed as the requested capability, or
/// [`SqlError::Unwrap`] when it is not a wrapper for it.
pub trait Wrapper: Any + Send {
    /// Whether this object is, or wraps, an object of `capability`.
    fn is_wrapper_for(&self, capability: Capability) -> SqlResult<bool> {
        Ok(capability == Capability::of::<Self>())
    }

    /// This object (or the object it wraps) viewed as `capability`.
    fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn Any>;

    /// Name of the concrete type behind this object.
    fn implementation_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Descriptor of the proxy, `None` for real objects.
    fn proxy_class(&self) -> Option<ProxyClass> {
        None
    }
}

/// `unwrap_ref` for a real object that only unwraps to its own type.
pub fn unwrap_self<T: Any>(this: &T, capability: Capability) -> SqlResult<&dyn Any> {
    if capability == Capability::of::<T>() {
        Ok(this as &dyn Any)
    } else {
        Err(SqlError::Unwrap(capability.name()))
    }
}

/// Typed helpers over [`Wrapper`].
pub trait WrapperExt: Wrapper {
    /// Whether this object is, or wraps, a `T`.
    fn wraps<T: ?Sized + 'static>(&self) -> SqlResult<bool> {
        self.is_wrapper_for(Capability::of::<T>())
    }

    /// This object, or the object it wraps, as a `T`.
    fn unwrap_as<T: Any>(&self) -> SqlResult<&T> {
        let capability = Capability::of::<T>();
        self.unwrap_ref(capability)?
            .downcast_ref::<T>()
            .ok_or(SqlError::Unwrap(capability.name()))
    }
}

impl<W: Wrapper + ?Sized> WrapperExt for W {}

/// Source of connections.
pub trait DataSource: Wrapper + Sync {
    /// Acquire a connection.
    fn get_connection(&self) -> SqlResult<Box<dyn Connection>>;
}

/// An open connection.
pub trait Connection: Wrapper {
    /// Create a statement that receives its SQL at execution time.
    fn create_statement(&mut self) -> SqlResult<Box<dyn Statement>>;

    /// Prepare `sql` for repeated execution.
    fn prepare_statement(&mut self, sql: &str) -> SqlResult<Box<dyn PreparedStatement>>;

    /// Prepare a stored procedure call.
    fn prepare_call(&mut self, sql: &str) -> SqlResult<Box<dyn CallableStatement>>;

    fn is_closed(&self) -> SqlResult<bool>;

    fn close(&mut self) -> SqlResult<()>;
}

/// A statement executing SQL passed at call time.
pub trait Statement: Wrapper {
    fn execute_query(&mut self, sql: &str) -> SqlResult<Box<dyn ResultSet>>;

    /// Execute a mutation and return the affected row count.
    fn execute_update(&mut self, sql: &str) -> SqlResult<u64>;

    fn is_closed(&self) -> SqlResult<bool>;

    fn close(&mut self) -> SqlResult<()>;
}

/// A statement whose SQL was fixed when it was prepared.
pub trait PreparedStatement: Wrapper {
    /// Bind parameter `index` (1-based).
    fn set_value(&mut self, index: usize, value: Value) -> SqlResult<()>;

    fn execute_query(&mut self) -> SqlResult<Box<dyn ResultSet>>;

    fn execute_update(&mut self) -> SqlResult<u64>;

    fn is_closed(&self) -> SqlResult<bool>;

    fn close(&mut self) -> SqlResult<()>;
}

/// A prepared stored procedure call.
pub trait CallableStatement: Wrapper {
    /// Bind parameter `index` (1-based).
    fn set_value(&mut self, index: usize, value: Value) -> SqlResult<()>;

    fn execute_query(&mut self) -> SqlResult<Box<dyn ResultSet>>;

    fn execute_update(&mut self) -> SqlResult<u64>;

    /// Read out-parameter `index` (1-based) after execution.
    fn get_out_value(&self, index: usize) -> SqlResult<Value>;

    fn is_closed(&self) -> SqlResult<bool>;

    fn close(&mut self) -> SqlResult<()>;
}

/// A forward-only cursor over query results.
pub trait ResultSet: Wrapper {
    /// Advance to the next row, returning `false` past the last one.
    fn next(&mut self) -> SqlResult<bool>;

    /// Read column `index` (0-based) of the current row.
    fn get_value(&self, index: usize) -> SqlResult<Value>;

    /// Read the named column of the current row.
    fn get_value_by_name(&self, column: &str) -> SqlResult<Value>;

    fn column_count(&self) -> SqlResult<usize>;

    fn is_closed(&self) -> SqlResult<bool>;

    fn close(&mut self) -> SqlResult<()>;
}
