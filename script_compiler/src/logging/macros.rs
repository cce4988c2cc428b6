//! Logging macros over `Code` values with `key => value` context
//!
//! Context values only need `Display`; they are formatted once at the call
//! site and handed to the `log_*_with_context` functions as string pairs.

/// Formats `key => value` pairs and passes them to `$sink` as `Vec<(&str, &str)>`.
#[doc(hidden)]
#[macro_export]
macro_rules! __with_log_context {
    ($sink:expr; $($key:expr => $value:expr),*) => {{
        let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),*];
        let context_refs: Vec<(&str, &str)> = context_strings
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        $sink(context_refs)
    }};
}

/// Log an error event under `$code`
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_error_with_context($code, $message, None, vec![])
    };

    ($code:expr, $message:expr, span = $span:expr) => {
        $crate::logging::log_error_with_context($code, $message, Some($span), vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_log_context!(
            |context| $crate::logging::log_error_with_context($code, $message, None, context);
            $($key => $value),+
        )
    };

    ($code:expr, $message:expr, span = $span:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_log_context!(
            |context| $crate::logging::log_error_with_context($code, $message, Some($span), context);
            $($key => $value),+
        )
    };
}

/// Log a success event under `$code`
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_success_with_context($code, $message, vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_log_context!(
            |context| $crate::logging::log_success_with_context($code, $message, context);
            $($key => $value),+
        )
    };
}

/// Log an informational message
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_info_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_log_context!(
            |context| $crate::logging::log_info_with_context($message, context);
            $($key => $value),+
        )
    };
}

/// Log a warning message
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_warning_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_log_context!(
            |context| $crate::logging::log_warning_with_context($message, context);
            $($key => $value),+
        )
    };
}

/// Log a debug message. Context is only formatted when debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::logging::log_debug_with_context($message, vec![])
        }
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::__with_log_context!(
                |context| $crate::logging::log_debug_with_context($message, context);
                $($key => $value),+
            )
        }
    };
}

/// Log a timed success event with `duration_ms` attached
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr) => {
        $crate::log_success!($code, $message,
            "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0)
        )
    };

    ($code:expr, $message:expr, duration = $duration:expr, $($key:expr => $value:expr),+) => {
        $crate::log_success!($code, $message,
            "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0),
            $($key => $value),+
        )
    };
}
