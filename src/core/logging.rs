// src/core/logging.rs
use std::sync::atomic::{AtomicU64, Ordering};

// Global sequence number so interleaved probe logs can be correlated
static LOG_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct LogContext {
    pub component: String,
    pub device: String,
    pub sequence: u64,
}

impl LogContext {
    pub fn new(component: &str, device: &str) -> Self {
        Self {
            component: component.to_string(),
            device: device.to_string(),
            sequence: LOG_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn format(&self, message: &str) -> String {
        format!(
            "[seq={:06}][{}:{}] {}",
            self.sequence, self.component, self.device, message
        )
    }
}

/// Uniform `log` output for the probing components.
pub trait ComponentLogger {
    fn log_context(&self) -> LogContext;

    fn trace(&self, message: &str) {
        log::trace!("{}", self.log_context().format(message));
    }

    fn debug(&self, message: &str) {
        log::debug!("{}", self.log_context().format(message));
    }
}

/// Destination for report output.
///
/// `inform` lines are the report itself and are always shown. `diagnostic`
/// lines are verbose detail and go through the `log` facade by default.
pub trait ReportSink {
    fn inform(&mut self, line: &str);

    fn diagnostic(&mut self, line: &str) {
        log::debug!("{}", line);
    }
}

/// Writes report lines to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn inform(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Swallows report lines; used for quiet scans.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn inform(&mut self, _line: &str) {}

    fn diagnostic(&mut self, _line: &str) {}
}
