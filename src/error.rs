use std::fmt;

/// Error categories for the storage/query core.
///
/// Names follow the taxonomy the engine is specified against, not Rust
/// convention: `Storage` is a logical storage fault (page out of range,
/// every buffer frame dirty), `TransactionAborted` is a lock-wait timeout
/// or an explicit abort, `IllegalArgument`/`NoSuchElement` propagate to the
/// query caller, `Io` wraps the underlying filesystem, and
/// `IllegalMonitorState` means a caller released a lock it never held
/// (always a bug, never a recoverable condition).
#[derive(Debug)]
pub enum DbError {
    Storage(String),
    TransactionAborted(String),
    IllegalArgument(String),
    NoSuchElement(String),
    Io(std::io::Error),
    IllegalMonitorState(String),
}

impl DbError {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        DbError::Storage(msg.into())
    }

    pub fn aborted<S: Into<String>>(msg: S) -> Self {
        DbError::TransactionAborted(msg.into())
    }

    pub fn illegal_argument<S: Into<String>>(msg: S) -> Self {
        DbError::IllegalArgument(msg.into())
    }

    pub fn no_such_element<S: Into<String>>(msg: S) -> Self {
        DbError::NoSuchElement(msg.into())
    }

    pub fn illegal_monitor_state<S: Into<String>>(msg: S) -> Self {
        DbError::IllegalMonitorState(msg.into())
    }

    /// Prints a backtrace to stderr. Useful at the point an error is first
    /// raised, before it has been wrapped and carried up several frames.
    pub fn show_backtrace(&self) {
        let bt = backtrace::Backtrace::new();
        eprintln!("{}\n{:?}", self, bt);
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DbError::Storage(msg) => write!(f, "storage error: {}", msg),
            DbError::TransactionAborted(msg) => write!(f, "transaction aborted: {}", msg),
            DbError::IllegalArgument(msg) => write!(f, "illegal argument: {}", msg),
            DbError::NoSuchElement(msg) => write!(f, "no such element: {}", msg),
            DbError::Io(e) => write!(f, "io error: {}", e),
            DbError::IllegalMonitorState(msg) => write!(f, "illegal monitor state: {}", msg),
        }
    }
}

impl std::error::Error for DbError {}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        DbError::Io(e)
    }
}

pub type DbResult<T> = Result<T, DbError>;
