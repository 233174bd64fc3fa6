/// Macro for prefixed status logging to stderr (only when stderr is a terminal).
///
/// Usage:
/// ```ignore
/// log_status!("db", "Loading {}", path.display());
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::io::IsTerminal::is_terminal(&::std::io::stderr()) {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

/// Cyan informational line on stderr.
#[macro_export]
macro_rules! log_info {
    ($prefix:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::Tone::Info, $prefix, format_args!($($arg)*))
    };
}

/// Green success line on stderr.
#[macro_export]
macro_rules! log_success {
    ($prefix:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::Tone::Success, $prefix, format_args!($($arg)*))
    };
}

/// Yellow warning line on stderr.
#[macro_export]
macro_rules! log_warning {
    ($prefix:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::Tone::Warning, $prefix, format_args!($($arg)*))
    };
}

/// Red error line on stderr.
#[macro_export]
macro_rules! log_error {
    ($prefix:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::Tone::Error, $prefix, format_args!($($arg)*))
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `toolchain::db` instead of `toolchain::core::db`
pub use self::core::*;
pub use self::utils::*;
