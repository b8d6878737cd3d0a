//! ---
//! hiburn_section: "03-persistence-logging"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Output sinks threaded through provisioning actions."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::io::Write;

/// Destination for everything an action wants the operator to see.
pub trait OutputSink {
    /// Command output, such as one environment line.
    fn line(&mut self, text: &str);

    /// Progress and status messages.
    fn info(&mut self, message: &str);
}

/// Writes command output to stdout and status messages to the tracing subscriber.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn line(&mut self, text: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        // a closed stdout (e.g. `| head`) is not an action failure
        let _ = writeln!(handle, "{text}");
    }

    fn info(&mut self, message: &str) {
        tracing::info!(message = %message);
    }
}
