//! Named, leveled logger used for the tracker's diagnostics.
//!
//! Output goes through a replaceable handler so applications can route it into their own
//! logging, and tests can capture it.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock, RwLock};

/// Logger shared by trackers that are not given one explicitly.
pub static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@plausible/tracker"));

type SharedLogHandler = Arc<dyn Fn(&Logger, LogLevel, &[LogArgument]) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("log_level", &self.log_level())
            .finish()
    }
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.into(),
                log_level: AtomicU8::new(LogLevel::Info as u8),
                log_handler: RwLock::new(default_log_handler_arc()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.log_level.load(Ordering::SeqCst))
    }

    pub fn set_log_level<L>(&self, level: L) -> Result<(), LogError>
    where
        L: IntoLogLevel,
    {
        let level = level.into_log_level()?;
        self.inner.log_level.store(level as u8, Ordering::SeqCst);
        Ok(())
    }

    pub fn set_log_handler<F>(&self, handler: F)
    where
        F: Fn(&Logger, LogLevel, &[LogArgument]) + Send + Sync + 'static,
    {
        *self.inner.log_handler.write().unwrap() = Arc::new(handler);
    }

    pub fn reset_log_handler(&self) {
        *self.inner.log_handler.write().unwrap() = default_log_handler_arc();
    }

    pub fn debug(&self, arg: impl IntoLogArgument) {
        self.dispatch(LogLevel::Debug, vec![arg.into_log_argument()]);
    }

    pub fn log(&self, arg: impl IntoLogArgument) {
        self.dispatch(LogLevel::Verbose, vec![arg.into_log_argument()]);
    }

    pub fn info(&self, arg: impl IntoLogArgument) {
        self.dispatch(LogLevel::Info, vec![arg.into_log_argument()]);
    }

    pub fn warn(&self, arg: impl IntoLogArgument) {
        self.dispatch(LogLevel::Warn, vec![arg.into_log_argument()]);
    }

    pub fn error(&self, arg: impl IntoLogArgument) {
        self.dispatch(LogLevel::Error, vec![arg.into_log_argument()]);
    }

    /// Logs several arguments as one message at `level`.
    pub fn log_with<I, T>(&self, level: LogLevel, args: I)
    where
        I: IntoIterator<Item = T>,
        T: IntoLogArgument,
    {
        let arguments = args
            .into_iter()
            .map(IntoLogArgument::into_log_argument)
            .collect();
        self.dispatch(level, arguments);
    }

    fn dispatch(&self, level: LogLevel, arguments: Vec<LogArgument>) {
        let handler = self.inner.log_handler.read().unwrap().clone();
        handler(self, level, &arguments);
    }
}

struct LoggerInner {
    name: String,
    log_level: AtomicU8,
    log_handler: RwLock<SharedLogHandler>,
}

fn default_log_handler_arc() -> SharedLogHandler {
    Arc::new(default_log_handler)
}

fn default_log_handler(logger: &Logger, level: LogLevel, args: &[LogArgument]) {
    if level < logger.log_level() || level == LogLevel::Silent {
        return;
    }

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let message = build_message(args);
    let header = format!("[{}]  {}:", now, logger.name());

    match level {
        LogLevel::Warn | LogLevel::Error => eprintln!("{header} {message}"),
        _ => println!("{header} {message}"),
    }
}

/// Joins the textual form of each argument with single spaces.
pub fn build_message(args: &[LogArgument]) -> String {
    args.iter()
        .filter_map(LogArgument::to_message_fragment)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Verbose = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Silent = 5,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "silent",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Verbose,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Silent,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "verbose" => Ok(LogLevel::Verbose),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "silent" => Ok(LogLevel::Silent),
            other => Err(LogError::InvalidLogLevel(other.to_string())),
        }
    }
}

pub trait IntoLogLevel {
    fn into_log_level(self) -> Result<LogLevel, LogError>;
}

impl IntoLogLevel for LogLevel {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        Ok(self)
    }
}

impl IntoLogLevel for &str {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        LogLevel::from_str(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogArgument {
    Text(String),
    Value(Value),
}

impl LogArgument {
    pub fn to_message_fragment(&self) -> Option<String> {
        match self {
            LogArgument::Text(text) => Some(text.clone()),
            LogArgument::Value(Value::Null) => None,
            LogArgument::Value(Value::String(text)) => Some(text.clone()),
            LogArgument::Value(other) => Some(other.to_string()),
        }
    }
}

pub trait IntoLogArgument {
    fn into_log_argument(self) -> LogArgument;
}

impl IntoLogArgument for LogArgument {
    fn into_log_argument(self) -> LogArgument {
        self
    }
}

impl IntoLogArgument for String {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Text(self)
    }
}

impl IntoLogArgument for &str {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Text(self.to_owned())
    }
}

impl IntoLogArgument for Value {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Value(self)
    }
}

#[derive(Debug, Clone)]
pub enum LogError {
    InvalidLogLevel(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::InvalidLogLevel(level) => {
                write!(f, "Invalid value \"{level}\" assigned to `logLevel`")
            }
        }
    }
}

impl std::error::Error for LogError {}
