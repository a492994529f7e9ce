use alsa_explore::{ComponentLogger, LogContext, ReportSink};
use alsa_explore::testing::mocks::CollectingSink;

#[test]
fn test_log_context_creation() {
    let ctx = LogContext::new("probe", "hw:0,0");

    assert_eq!(ctx.component, "probe");
    assert_eq!(ctx.device, "hw:0,0");
}

#[test]
fn test_log_sequence_increases() {
    let first = LogContext::new("probe", "hw:0,0");
    let second = LogContext::new("probe", "hw:0,0");

    assert!(second.sequence > first.sequence);
}

#[test]
fn test_log_formatting() {
    let ctx = LogContext::new("mixer", "hw:1");
    let formatted = ctx.format("load failed");

    assert!(formatted.starts_with("[seq="));
    assert!(formatted.contains("[mixer:hw:1]"));
    assert!(formatted.ends_with("load failed"));
}

#[test]
fn test_component_logger_trait() {
    struct Probe {
        device: String,
    }

    impl ComponentLogger for Probe {
        fn log_context(&self) -> LogContext {
            LogContext::new("probe", &self.device)
        }
    }

    let probe = Probe {
        device: "hw:2,0".into(),
    };
    let ctx = probe.log_context();

    assert_eq!(ctx.component, "probe");
    assert_eq!(ctx.device, "hw:2,0");

    // Without a logger installed these are no-ops.
    probe.debug("format rejected");
    probe.trace("rate rejected");
}

#[test]
fn test_collecting_sink_separates_diagnostics() {
    let mut sink = CollectingSink::default();
    sink.inform("> Device:");
    sink.diagnostic("not listed");

    assert_eq!(sink.lines, vec!["> Device:"]);
    assert_eq!(sink.diagnostics, vec!["not listed"]);
}
