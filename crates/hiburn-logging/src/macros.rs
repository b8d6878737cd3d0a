//! ---
//! hiburn_section: "03-persistence-logging"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Structured logging adapters and sinks."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
/// Emit an informational log enriched with device/action context.
#[macro_export]
macro_rules! hb_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            device = ctx.device.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::INFO,
            device = ctx.device.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit a debug log enriched with device/action context.
#[macro_export]
macro_rules! hb_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            device = ctx.device.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::DEBUG,
            device = ctx.device.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an error log enriched with device/action context.
#[macro_export]
macro_rules! hb_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::ERROR,
            device = ctx.device.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::ERROR,
            device = ctx.device.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}
