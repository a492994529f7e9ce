//! Single-setting prober: configure one playback stream for one
//! (encoding, rate) pair and classify how it went.

pub mod scanner;

use std::fmt;

use serde::Serialize;

use crate::catalog::{CHANNELS, SampleEncoding};
use crate::core::error::BackendError;
use crate::core::logging::{ComponentLogger, LogContext};

pub use scanner::{
    BestSetting, DeviceCapabilitySummary, DeviceVerdict, EarlyExit, RateCapability, ScanOptions,
    Verbosity, scan_device,
};

/// Interleaved access modes, in the order they are negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    RwInterleaved,
    MmapInterleaved,
}

/// Opens playback handles. Implemented over ALSA and by the test mocks.
pub trait PcmBackend {
    type Handle: PcmHandle;

    /// Opens `device` for exclusive, blocking playback. Dropping the handle
    /// closes the device.
    fn open_playback(&self, device: &str) -> Result<Self::Handle, BackendError>;
}

pub trait PcmHandle {
    type HwConfig<'a>: HwConfig
    where
        Self: 'a;
    type SwConfig<'a>: SwConfig
    where
        Self: 'a;

    /// Full configuration space of the device.
    fn hw_params_any(&self) -> Result<Self::HwConfig<'_>, BackendError>;
    fn commit_hw_params(&self, hw: &Self::HwConfig<'_>) -> Result<(), BackendError>;
    fn sw_params_current(&self) -> Result<Self::SwConfig<'_>, BackendError>;
    fn commit_sw_params(&self, sw: &Self::SwConfig<'_>) -> Result<(), BackendError>;
}

pub trait HwConfig {
    fn set_access(&self, access: AccessMode) -> Result<(), BackendError>;
    fn set_channels(&self, channels: u32) -> Result<(), BackendError>;
    fn set_format(&self, encoding: SampleEncoding) -> Result<(), BackendError>;
    /// Requests `rate` and returns the rate the hardware granted.
    fn set_rate_near(&self, rate: u32) -> Result<u32, BackendError>;
}

pub trait SwConfig {
    fn enable_timestamps(&self) -> Result<(), BackendError>;
}

/// Configuration steps that fail without saying anything about the
/// particular encoding or rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStage {
    Open,
    Configuration,
    Access,
    Channels,
    SwParamsRead,
    Timestamp,
    SwParamsCommit,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Open => "open",
            Self::Configuration => "load configuration space",
            Self::Access => "interleaved access",
            Self::Channels => "stereo output",
            Self::SwParamsRead => "read software parameters",
            Self::Timestamp => "enable timestamp mode",
            Self::SwParamsCommit => "set software parameters",
        };
        f.write_str(text)
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success,
    FormatRejected {
        #[serde(skip)]
        error: BackendError,
    },
    /// The rate was refused outright (`granted == None`) or the hardware
    /// offered a different one.
    RateRejected { requested: u32, granted: Option<u32> },
    HardwareRejectedAtCommit {
        #[serde(skip)]
        error: BackendError,
    },
    DeviceBusy,
    DeviceInaccessible {
        #[serde(skip)]
        error: BackendError,
    },
    OtherFailure {
        stage: ProbeStage,
        #[serde(skip)]
        error: BackendError,
    },
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Rejections that only rule out this one combination.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::FormatRejected { .. }
                | Self::RateRejected { .. }
                | Self::HardwareRejectedAtCommit { .. }
        )
    }

    /// Outcomes that end the scan of the whole device.
    pub fn aborts_scan(&self) -> bool {
        !self.is_success() && !self.is_transient()
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::FormatRejected { error } => write!(f, "format rejected ({})", error),
            Self::RateRejected {
                requested,
                granted: Some(granted),
            } => write!(f, "rate {} requested, {} granted", requested, granted),
            Self::RateRejected {
                requested,
                granted: None,
            } => write!(f, "rate {} rejected", requested),
            Self::HardwareRejectedAtCommit { error } => {
                write!(f, "hardware rejected parameters at commit ({})", error)
            }
            Self::DeviceBusy => write!(f, "device busy"),
            Self::DeviceInaccessible { error } => write!(f, "device inaccessible ({})", error),
            Self::OtherFailure { stage, error } => write!(f, "{} failed ({})", stage, error),
        }
    }
}

struct Probe<'a> {
    device: &'a str,
    encoding: SampleEncoding,
    rate: u32,
}

impl ComponentLogger for Probe<'_> {
    fn log_context(&self) -> LogContext {
        LogContext::new("probe", self.device)
    }
}

impl Probe<'_> {
    fn other(&self, stage: ProbeStage, error: BackendError) -> ProbeOutcome {
        self.debug(&format!("{} not available: {}", stage, error));
        ProbeOutcome::OtherFailure { stage, error }
    }

    fn run<B: PcmBackend>(&self, backend: &B) -> ProbeOutcome {
        let handle = match backend.open_playback(self.device) {
            Ok(handle) => handle,
            Err(error) if error.is_busy() => {
                self.debug("device is busy");
                return ProbeOutcome::DeviceBusy;
            }
            Err(error) if error.is_inaccessible() => {
                self.trace(&format!("device can not be opened: {}", error));
                return ProbeOutcome::DeviceInaccessible { error };
            }
            Err(error) => return self.other(ProbeStage::Open, error),
        };

        // `handle` is dropped, and the device closed, on every return below.
        self.configure(&handle)
    }

    fn configure<H: PcmHandle>(&self, handle: &H) -> ProbeOutcome {
        let hw = match handle.hw_params_any() {
            Ok(hw) => hw,
            Err(error) => return self.other(ProbeStage::Configuration, error),
        };

        if let Err(error) = hw
            .set_access(AccessMode::RwInterleaved)
            .or_else(|_| hw.set_access(AccessMode::MmapInterleaved))
        {
            return self.other(ProbeStage::Access, error);
        }

        if let Err(error) = hw.set_channels(CHANNELS) {
            return self.other(ProbeStage::Channels, error);
        }

        if let Err(error) = hw.set_format(self.encoding) {
            self.trace(&format!("could not set output format {}: {}", self.encoding, error));
            return ProbeOutcome::FormatRejected { error };
        }

        match hw.set_rate_near(self.rate) {
            Ok(granted) if granted == self.rate => {}
            Ok(granted) => {
                self.trace(&format!(
                    "output rate {} requested, {} offered",
                    self.rate, granted
                ));
                return ProbeOutcome::RateRejected {
                    requested: self.rate,
                    granted: Some(granted),
                };
            }
            Err(error) => {
                self.trace(&format!("could not set output rate {}: {}", self.rate, error));
                return ProbeOutcome::RateRejected {
                    requested: self.rate,
                    granted: None,
                };
            }
        }

        if let Err(error) = handle.commit_hw_params(&hw) {
            self.debug(&format!(
                "unable to set hardware parameters ({} at {}): {}",
                self.encoding, self.rate, error
            ));
            return ProbeOutcome::HardwareRejectedAtCommit { error };
        }

        let sw = match handle.sw_params_current() {
            Ok(sw) => sw,
            Err(error) => return self.other(ProbeStage::SwParamsRead, error),
        };
        if let Err(error) = sw.enable_timestamps() {
            return self.other(ProbeStage::Timestamp, error);
        }
        if let Err(error) = handle.commit_sw_params(&sw) {
            return self.other(ProbeStage::SwParamsCommit, error);
        }

        ProbeOutcome::Success
    }
}

/// Tries to configure `device` for stereo playback of `encoding` at exactly
/// `rate`. The device is closed again before this returns.
pub fn probe_device<B: PcmBackend>(
    backend: &B,
    device: &str,
    encoding: SampleEncoding,
    rate: u32,
) -> ProbeOutcome {
    Probe {
        device,
        encoding,
        rate,
    }
    .run(backend)
}
