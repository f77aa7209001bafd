use crate::api::{CallableStatement, Connection, PreparedStatement, ResultSet, Statement};
use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use std::fmt;

/// Identity of an intercepted method.
///
/// Together with the kinds of its [`Arg`]s this forms the method signature, see
/// [`MethodInvocation::signature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetConnection,
    CreateStatement,
    PrepareStatement,
    PrepareCall,
    ExecuteQuery,
    ExecuteUpdate,
    SetValue,
    GetOutValue,
    Next,
    GetValue,
    GetValueByName,
    ColumnCount,
    IsClosed,
    Close,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::GetConnection => "get_connection",
            Method::CreateStatement => "create_statement",
            Method::PrepareStatement => "prepare_statement",
            Method::PrepareCall => "prepare_call",
            Method::ExecuteQuery => "execute_query",
            Method::ExecuteUpdate => "execute_update",
            Method::SetValue => "set_value",
            Method::GetOutValue => "get_out_value",
            Method::Next => "next",
            Method::GetValue => "get_value",
            Method::GetValueByName => "get_value_by_name",
            Method::ColumnCount => "column_count",
            Method::IsClosed => "is_closed",
            Method::Close => "close",
        }
    }

    /// Whether this method runs SQL against the database.
    pub fn is_execute(&self) -> bool {
        matches!(self, Method::ExecuteQuery | Method::ExecuteUpdate)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One argument of an intercepted call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Str(&'a str),
    Index(usize),
    Value(&'a Value),
}

impl Arg<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Str(_) => "str",
            Arg::Index(_) => "usize",
            Arg::Value(_) => "Value",
        }
    }
}

/// Types an [`Arg`] can be read as. Reading never converts between variants.
pub trait FromArg<'a>: Sized {
    const KIND: &'static str;

    fn from_arg(arg: Arg<'a>) -> Option<Self>;
}

impl<'a> FromArg<'a> for &'a str {
    const KIND: &'static str = "str";

    fn from_arg(arg: Arg<'a>) -> Option<Self> {
        match arg {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl<'a> FromArg<'a> for usize {
    const KIND: &'static str = "usize";

    fn from_arg(arg: Arg<'a>) -> Option<Self> {
        match arg {
            Arg::Index(i) => Some(i),
            _ => None,
        }
    }
}

impl<'a> FromArg<'a> for &'a Value {
    const KIND: &'static str = "Value";

    fn from_arg(arg: Arg<'a>) -> Option<Self> {
        match arg {
            Arg::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Result of an intercepted call, before the trampoline converts it back to the
/// method's declared return type.
pub enum Return {
    Unit,
    Bool(bool),
    Count(u64),
    Size(usize),
    Value(Value),
    Connection(Box<dyn Connection>),
    Statement(Box<dyn Statement>),
    PreparedStatement(Box<dyn PreparedStatement>),
    CallableStatement(Box<dyn CallableStatement>),
    ResultSet(Box<dyn ResultSet>),
}

impl Return {
    pub fn kind(&self) -> &'static str {
        match self {
            Return::Unit => "Unit",
            Return::Bool(_) => "Bool",
            Return::Count(_) => "Count",
            Return::Size(_) => "Size",
            Return::Value(_) => "Value",
            Return::Connection(_) => "Connection",
            Return::Statement(_) => "Statement",
            Return::PreparedStatement(_) => "PreparedStatement",
            Return::CallableStatement(_) => "CallableStatement",
            Return::ResultSet(_) => "ResultSet",
        }
    }

    pub fn into_unit(self, method: Method) -> SqlResult<()> {
        match self {
            Return::Unit => Ok(()),
            other => Err(other.mismatch(method, "Unit")),
        }
    }

    fn mismatch(&self, method: Method, expected: &'static str) -> SqlError {
        SqlError::ReturnType {
            method: method.name(),
            expected,
            found: self.kind(),
        }
    }
}

/// Generate `Return::into_*` conversions for single-field variants.
macro_rules! impl_return_into {
    ($($fn_name:ident => $variant:ident($ty:ty)),* $(,)?) => {
        impl Return {
            $(
                pub fn $fn_name(self, method: Method) -> SqlResult<$ty> {
                    match self {
                        Return::$variant(v) => Ok(v),
                        other => Err(other.mismatch(method, stringify!($variant))),
                    }
                }
            )*
        }
    };
}

impl_return_into! {
    into_bool => Bool(bool),
    into_count => Count(u64),
    into_size => Size(usize),
    into_value => Value(Value),
    into_connection => Connection(Box<dyn Connection>),
    into_statement => Statement(Box<dyn Statement>),
    into_prepared_statement => PreparedStatement(Box<dyn PreparedStatement>),
    into_callable_statement => CallableStatement(Box<dyn CallableStatement>),
    into_result_set => ResultSet(Box<dyn ResultSet>),
}

impl fmt::Debug for Return {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Return::Bool(v) => write!(f, "Bool({v})"),
            Return::Count(v) => write!(f, "Count({v})"),
            Return::Size(v) => write!(f, "Size({v})"),
            Return::Value(v) => write!(f, "Value({v:?})"),
            other => f.write_str(other.kind()),
        }
    }
}

/// One intercepted call on a proxy.
///
/// Built by the proxy trampoline for every call and handed to the bound
/// [`InvocationHandler`](super::InvocationHandler). [`proceed`](Self::proceed)
/// forwards the original call, with the original arguments, to the real object.
pub struct MethodInvocation<'a> {
    target: &'static str,
    method: Method,
    args: &'a [Arg<'a>],
    call: &'a mut (dyn FnMut() -> SqlResult<Return> + 'a),
}

impl<'a> MethodInvocation<'a> {
    pub fn new(
        target: &'static str,
        method: Method,
        args: &'a [Arg<'a>],
        call: &'a mut (dyn FnMut() -> SqlResult<Return> + 'a),
    ) -> Self {
        Self {
            target,
            method,
            args,
            call,
        }
    }

    /// Type name of the real object receiving the call.
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn args(&self) -> &'a [Arg<'a>] {
        self.args
    }

    /// `name(kind, ...)` of the intercepted call.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.args.iter().map(Arg::kind).collect();
        format!("{}({})", self.method.name(), params.join(", "))
    }

    /// Argument `index` read as `T`.
    ///
    /// Fails with [`SqlError::ArgumentType`] when the argument holds another kind.
    pub fn arg_at<T: FromArg<'a>>(&self, index: usize) -> SqlResult<T> {
        let arg = self.args.get(index).ok_or(SqlError::ArgumentIndex {
            method: self.method.name(),
            index,
        })?;
        T::from_arg(*arg).ok_or(SqlError::ArgumentType {
            method: self.method.name(),
            index,
            expected: T::KIND,
            found: arg.kind(),
        })
    }

    /// First string argument, the SQL text for SQL-taking methods.
    pub fn sql(&self) -> Option<&'a str> {
        self.args.iter().find_map(|arg| match arg {
            Arg::Str(s) => Some(*s),
            _ => None,
        })
    }

    /// Forward the call to the real object.
    ///
    /// Every call re-invokes the real method; failures are returned untouched.
    pub fn proceed(&mut self) -> SqlResult<Return> {
        (self.call)()
    }
}

impl fmt::Debug for MethodInvocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
