// src/lib.rs
pub mod audit;
pub mod catalog;
pub mod config;
pub mod core;
pub mod mixer;
pub mod probe;
pub mod report;
pub mod testing;

#[cfg(feature = "audio")]
pub mod backend;

pub use catalog::{RateLadder, SampleEncoding};
pub use config::ExploreConfig;
pub use crate::core::{ComponentLogger, DeviceEnumerator, LogContext, PlaybackDeviceInfo, ReportSink};
pub use probe::{DeviceCapabilitySummary, DeviceVerdict, ProbeOutcome, ScanOptions, scan_device};
pub use report::{DeviceTarget, ExploreReport, Explorer, ReportOptions};
