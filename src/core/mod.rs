pub mod device_enumerator;
pub mod error;
pub mod logging;

pub use device_enumerator::{DeviceEnumerator, PlaybackDeviceInfo};
pub use error::{AuditError, BackendError, ConfigError, MixerError};
pub use logging::{ComponentLogger, LogContext, NullSink, ReportSink, StdoutSink};
