use crate::logging::LogFormat;

/// Directory shared by editors and host sessions for bridge sockets.
pub const DEFAULT_SOCKET_DIR: &str = "/tmp";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default directory holding bridge sockets.
#[must_use]
pub const fn default_socket_dir() -> &'static str {
    DEFAULT_SOCKET_DIR
}
