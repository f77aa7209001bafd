use super::*;
use crate::api::{Capability, Connection, PreparedStatement, ResultSet, Wrapper, WrapperExt};
use crate::error::{SqlError, SqlResult};
use crate::mock::{MockConnection, MockDriver};
use crate::value::Value;
use std::sync::{Arc, Mutex};

// ── Test handlers ──

/// Records each call's signature, then proceeds.
#[derive(Clone)]
struct Recording {
    capability: Capability,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Recording {
    fn new(capability: Capability) -> Self {
        Self {
            capability,
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl<T: Wrapper + ?Sized> InvocationHandler<T> for Recording {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn invoke(&self, mut invocation: MethodInvocation<'_>) -> SqlResult<Return> {
        self.seen.lock().unwrap().push(invocation.signature());
        invocation.proceed()
    }
}

/// Handler that only forwards.
struct Passthrough(Capability);

impl<T: Wrapper + ?Sized> InvocationHandler<T> for Passthrough {
    fn capability(&self) -> Capability {
        self.0
    }
}

fn conn_capability() -> Capability {
    Capability::of::<Box<dyn Connection>>()
}

fn proxied_connection(driver: &MockDriver) -> (Proxy<dyn Connection, Recording>, Recording) {
    let handler = Recording::new(conn_capability());
    let proxy = ProxyFactory::create_proxy(driver.connection(), handler.clone());
    (proxy, handler)
}

// ── Dispatch ──

#[test]
fn test_calls_reach_handler_and_delegate() {
    let driver = MockDriver::new();
    let (mut conn, handler) = proxied_connection(&driver);

    let mut stmt = conn.prepare_statement("SELECT 1").unwrap();
    stmt.set_value(1, Value::from(7)).unwrap();
    assert!(!conn.is_closed().unwrap());
    conn.close().unwrap();

    assert_eq!(
        handler.seen(),
        vec!["prepare_statement(str)", "is_closed()", "close()"]
    );
    assert_eq!(
        driver.calls(),
        vec![
            "connection.prepare_statement(SELECT 1)",
            "prepared_statement.set_value(1, 7)",
            "connection.is_closed()",
            "connection.close()",
        ]
    );
}

#[test]
fn test_default_invoke_forwards() {
    let driver = MockDriver::new();
    let mut conn = ProxyFactory::create_proxy(driver.connection(), Passthrough(conn_capability()));

    let mut rs = conn
        .create_statement()
        .unwrap()
        .execute_query("SELECT id FROM t")
        .unwrap();
    assert!(rs.next().unwrap());
    assert_eq!(rs.get_value(0).unwrap(), Value::Integer(1));
    assert_eq!(driver.count_calls("statement.execute_query(SELECT id FROM t)"), 1);
}

#[test]
fn test_set_value_signature() {
    let driver = MockDriver::new();
    let mut real = driver.connection();
    let handler = Recording::new(Capability::of::<Box<dyn PreparedStatement>>());
    let mut stmt =
        ProxyFactory::create_proxy(real.prepare_statement("SELECT ?1").unwrap(), handler.clone());

    stmt.set_value(1, Value::from("x")).unwrap();
    stmt.execute_query().unwrap().close().unwrap();

    assert_eq!(handler.seen(), vec!["set_value(usize, Value)", "execute_query()"]);
}

// ── Invocation context ──

/// Reads argument 0 as `T` before proceeding.
struct ArgReader<T>(std::marker::PhantomData<fn() -> T>);

impl<T: 'static> InvocationHandler<dyn Connection> for ArgReader<T>
where
    T: for<'a> FromArg<'a>,
{
    fn capability(&self) -> Capability {
        conn_capability()
    }

    fn invoke(&self, mut invocation: MethodInvocation<'_>) -> SqlResult<Return> {
        if invocation.method() == Method::PrepareStatement {
            invocation.arg_at::<T>(0)?;
        }
        invocation.proceed()
    }
}

#[test]
fn test_arg_at_type_mismatch() {
    let driver = MockDriver::new();
    let mut conn = ProxyFactory::create_proxy(
        driver.connection(),
        ArgReader::<usize>(std::marker::PhantomData),
    );

    let err = match conn.prepare_statement("SELECT 1") {
        Err(err) => err,
        Ok(_) => panic!("expected an argument type error"),
    };
    assert!(err.is_argument_type());
    assert!(matches!(
        err,
        SqlError::ArgumentType {
            method: "prepare_statement",
            index: 0,
            expected: "usize",
            found: "str",
        }
    ));
    // The delegate was never reached.
    assert!(driver.calls().is_empty());
}

#[test]
fn test_arg_at_reads_matching_type() {
    struct SqlCapture(Arc<Mutex<Option<String>>>);

    impl InvocationHandler<dyn Connection> for SqlCapture {
        fn capability(&self) -> Capability {
            conn_capability()
        }

        fn invoke(&self, mut invocation: MethodInvocation<'_>) -> SqlResult<Return> {
            if invocation.method() == Method::PrepareStatement {
                let sql: &str = invocation.arg_at(0)?;
                *self.0.lock().unwrap() = Some(sql.to_string());
                assert_eq!(invocation.sql(), Some(sql));
                assert!(matches!(
                    invocation.arg_at::<&str>(1),
                    Err(SqlError::ArgumentIndex { index: 1, .. })
                ));
            }
            invocation.proceed()
        }
    }

    let driver = MockDriver::new();
    let captured = Arc::new(Mutex::new(None));
    let mut conn =
        ProxyFactory::create_proxy(driver.connection(), SqlCapture(captured.clone()));
    conn.prepare_statement("SELECT 2").unwrap();
    assert_eq!(captured.lock().unwrap().as_deref(), Some("SELECT 2"));
}

#[test]
fn test_proceed_twice_reinvokes() {
    struct Twice;

    impl InvocationHandler<dyn ResultSet> for Twice {
        fn capability(&self) -> Capability {
            Capability::of::<Box<dyn ResultSet>>()
        }

        fn invoke(&self, mut invocation: MethodInvocation<'_>) -> SqlResult<Return> {
            if invocation.method() == Method::Next {
                invocation.proceed()?;
            }
            invocation.proceed()
        }
    }

    let driver = MockDriver::new();
    driver.set_rows(3);
    let rs = driver
        .connection()
        .create_statement()
        .unwrap()
        .execute_query("SELECT id")
        .unwrap();
    let mut rs = ProxyFactory::create_proxy(rs, Twice);

    assert!(rs.next().unwrap());
    assert_eq!(rs.get_value(0).unwrap(), Value::Integer(2));
    assert_eq!(driver.count_calls("result_set.next()"), 2);
}

#[test]
fn test_delegate_failure_is_verbatim() {
    let driver = MockDriver::new();
    driver.fail("prepare_statement");
    let (mut conn, handler) = proxied_connection(&driver);

    match conn.prepare_statement("SELECT 1") {
        Err(SqlError::Driver(msg)) => assert_eq!(msg, "injected failure: prepare_statement"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected failure"),
    }
    assert_eq!(handler.seen(), vec!["prepare_statement(str)"]);
}

#[test]
fn test_wrong_return_kind_is_reported() {
    struct Liar;

    impl InvocationHandler<dyn Connection> for Liar {
        fn capability(&self) -> Capability {
            conn_capability()
        }

        fn invoke(&self, _invocation: MethodInvocation<'_>) -> SqlResult<Return> {
            Ok(Return::Count(3))
        }
    }

    let driver = MockDriver::new();
    let conn = ProxyFactory::create_proxy(driver.connection(), Liar);
    let err = conn.is_closed().unwrap_err();
    assert!(matches!(
        err,
        SqlError::ReturnType {
            method: "is_closed",
            expected: "Bool",
            found: "Count",
        }
    ));
}

// ── Unwrap protocol ──

#[test]
fn test_is_wrapper_for() {
    let driver = MockDriver::new();
    let (conn, _) = proxied_connection(&driver);

    assert!(conn.is_wrapper_for(conn_capability()).unwrap());
    assert!(conn.wraps::<MockConnection>().unwrap());
    assert!(!conn.wraps::<String>().unwrap());
}

#[test]
fn test_unwrap_to_own_capability_yields_delegate() {
    let driver = MockDriver::new();
    let (conn, handler) = proxied_connection(&driver);

    let inner: &Box<dyn Connection> = conn.unwrap_as::<Box<dyn Connection>>().unwrap();
    assert!(inner.proxy_class().is_none());
    assert!(!inner.is_closed().unwrap());
    // Calls on the unwrapped object bypass the handler.
    assert!(handler.seen().is_empty());
}

#[test]
fn test_unwrap_to_real_type() {
    let driver = MockDriver::new();
    let (conn, _) = proxied_connection(&driver);
    assert!(conn.unwrap_as::<MockConnection>().is_ok());
}

#[test]
fn test_unwrap_unsupported_propagates_delegate_error() {
    let driver = MockDriver::new();
    let (conn, _) = proxied_connection(&driver);
    let err = conn.unwrap_as::<String>().unwrap_err();
    assert!(err.is_unwrap());
    assert_eq!(err.to_string(), "Not a wrapper for alloc::string::String");
}

#[test]
fn test_nested_proxy_unwraps_to_innermost() {
    let driver = MockDriver::new();
    let (inner, _) = proxied_connection(&driver);
    let outer = ProxyFactory::create_proxy(
        Box::new(inner) as Box<dyn Connection>,
        Passthrough(conn_capability()),
    );

    let real = outer.unwrap_as::<Box<dyn Connection>>().unwrap();
    assert!(real.proxy_class().is_none());
    assert!(outer.unwrap_as::<MockConnection>().is_ok());
}

// ── Diagnostics ──

#[test]
fn test_is_proxy() {
    let driver = MockDriver::new();
    let (conn, _) = proxied_connection(&driver);
    let real = driver.connection();

    assert!(ProxyFactory::is_proxy(&conn, conn_capability()));
    assert!(!ProxyFactory::is_proxy(
        &conn,
        Capability::of::<Box<dyn ResultSet>>()
    ));
    assert!(!ProxyFactory::is_proxy(&*real, conn_capability()));

    let class = conn.class();
    assert_eq!(class.capability(), conn_capability());
    assert!(class.implementation().ends_with("MockConnection"));
}

#[test]
fn test_into_delegate() {
    let driver = MockDriver::new();
    let (conn, _) = proxied_connection(&driver);
    let real = conn.into_delegate();
    assert!(real.unwrap_as::<MockConnection>().is_ok());
}
