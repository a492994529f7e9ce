//! Walks the playback devices, probes each one and writes the report.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::audit::{AccessibilityFinding, audit_device_nodes};
use crate::catalog::RateLadder;
use crate::core::device_enumerator::{DeviceEnumerator, PlaybackDeviceInfo};
use crate::core::logging::{NullSink, ReportSink};
use crate::mixer::{GainControl, MixerBackend, all_gain_controls};
use crate::probe::{
    DeviceCapabilitySummary, DeviceVerdict, PcmBackend, ScanOptions, Verbosity, scan_device,
};

/// The service the probed settings are meant for.
pub const SERVICE_NAME: &str = "Shairport Sync";

const MIXER_PROMPT: &str = "  Possible mixers:     ";
const MIXER_INDENT: &str = "                       ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub extended: bool,
    pub ladder: RateLadder,
    pub include_alternate: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            extended: false,
            ladder: RateLadder::Standard,
            include_alternate: true,
        }
    }
}

impl ReportOptions {
    /// The verdict comes from the same exhaustive scan with or without
    /// `extended`; only the alternate ladder and the output differ.
    fn scan_options(&self) -> ScanOptions {
        let options = ScanOptions::exhaustive().with_ladder(self.ladder);
        if self.extended && self.include_alternate {
            options.with_alternate()
        } else {
            options
        }
    }

    fn mixer_verbosity(&self) -> Verbosity {
        if self.extended {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

/// A device to probe, either enumerated or named on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceTarget {
    pub pcm: String,
    pub mixer: String,
    pub long_name: String,
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<PlaybackDeviceInfo>,
}

impl DeviceTarget {
    pub fn from_info(info: PlaybackDeviceInfo) -> Self {
        Self {
            pcm: info.pcm_address(),
            mixer: info.mixer_address(),
            long_name: info.long_name(),
            short_name: info.short_name(),
            info: Some(info),
        }
    }

    /// `hw:1,0` attaches its mixer to `hw:1`; names without hardware
    /// addressing use the same name for both.
    pub fn from_name(name: &str) -> Self {
        let mixer = match name.split_once(',') {
            Some((card, _)) if name.starts_with("hw:") => card.to_string(),
            _ => name.to_string(),
        };
        Self {
            pcm: name.to_string(),
            mixer,
            long_name: name.to_string(),
            short_name: name.to_string(),
            info: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub target: DeviceTarget,
    pub summary: DeviceCapabilitySummary,
    pub gain_controls: Vec<GainControl>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccessibilityReport {
    Checked(AccessibilityFinding),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ExploreReport {
    pub devices: Vec<DeviceReport>,
    pub accessibility: AccessibilityReport,
}

/// Every playback device the enumerator knows about.
pub fn enumerate_targets<E: DeviceEnumerator>(enumerator: &E) -> Result<Vec<DeviceTarget>> {
    Ok(enumerator
        .playback_devices()?
        .into_iter()
        .map(DeviceTarget::from_info)
        .collect())
}

pub struct Explorer<'a, P, M> {
    pcm: &'a P,
    mixer: &'a M,
    options: ReportOptions,
}

impl<'a, P: PcmBackend, M: MixerBackend> Explorer<'a, P, M> {
    pub fn new(pcm: &'a P, mixer: &'a M, options: ReportOptions) -> Self {
        Self {
            pcm,
            mixer,
            options,
        }
    }

    /// Scans one device and, when it is usable, lists its gain controls.
    pub fn examine(&self, target: &DeviceTarget) -> DeviceReport {
        log::debug!("examining {} ({})", target.long_name, target.pcm);

        let summary = scan_device(
            self.pcm,
            &target.pcm,
            &self.options.scan_options(),
            &mut NullSink,
        );

        let gain_controls = if summary.is_usable() {
            all_gain_controls(self.mixer, &target.mixer, self.options.mixer_verbosity())
        } else {
            Vec::new()
        };

        DeviceReport {
            target: target.clone(),
            summary,
            gain_controls,
        }
    }

    /// Probes every target in turn, then audits the device nodes in
    /// `device_dir`. Report text goes to `sink`.
    pub fn run(
        &self,
        targets: &[DeviceTarget],
        device_dir: &Path,
        sink: &mut dyn ReportSink,
    ) -> ExploreReport {
        let mut devices = Vec::with_capacity(targets.len());
        for target in targets {
            let report = self.examine(target);
            self.render_device(&report, sink);
            devices.push(report);
        }

        let accessibility = match audit_device_nodes(device_dir) {
            Ok(finding) => AccessibilityReport::Checked(finding),
            Err(e) => {
                log::warn!("device permission audit failed: {}", e);
                AccessibilityReport::Failed {
                    error: e.to_string(),
                }
            }
        };
        render_accessibility(&accessibility, sink);

        ExploreReport {
            devices,
            accessibility,
        }
    }

    fn is_listed(&self, report: &DeviceReport) -> bool {
        self.options.extended
            || matches!(
                report.summary.verdict,
                DeviceVerdict::Usable | DeviceVerdict::Busy
            )
    }

    pub fn render_device(&self, report: &DeviceReport, sink: &mut dyn ReportSink) {
        if !self.is_listed(report) {
            sink.diagnostic(&format!(
                "{} not listed: {:?}",
                report.target.long_name, report.summary.verdict
            ));
            return;
        }
        let extended = self.options.extended;
        let target = &report.target;

        sink.inform(&format!("> Device:              \"{}\"", target.long_name));
        sink.inform(&format!("  Short Name:          \"{}\"", target.short_name));
        if let (true, Some(info)) = (extended, &target.info) {
            sink.inform(&format!("    Card Name:         \"{}\"", info.card_name));
            sink.inform(&format!(
                "    Device {} PCM ID:   \"{}\"",
                info.device, info.pcm_id
            ));
            sink.inform(&format!(
                "    Device {} PCM Name: \"{}\"",
                info.device, info.pcm_name
            ));
        }

        match report.summary.verdict {
            DeviceVerdict::Usable => self.render_usable(report, sink),
            DeviceVerdict::Busy => {
                sink.inform(&format!(
                    "  This device is in use and therefore can not be checked for use with {}.",
                    SERVICE_NAME
                ));
                sink.inform("  To check it, please take it out of use and try again.");
            }
            DeviceVerdict::Inaccessible => {
                sink.inform("  This device can not be accessed. Please check permissions.");
            }
            DeviceVerdict::Unusable => {
                sink.inform(&format!("  {} can not use this device.", SERVICE_NAME));
                if let (true, Some(failure)) = (extended, &report.summary.failure) {
                    sink.inform(&format!("    Reason: {}.", failure));
                }
            }
        }
        sink.inform("");
    }

    fn render_usable(&self, report: &DeviceReport, sink: &mut dyn ReportSink) {
        let extended = self.options.extended;
        sink.inform(&format!(
            "  This device seems suitable for use with {}.",
            SERVICE_NAME
        ));

        if report.gain_controls.is_empty() {
            if extended {
                sink.inform(&format!("    No mixers usable by {}.", SERVICE_NAME));
            }
        } else {
            for line in render_gain_controls(&report.gain_controls, extended) {
                sink.inform(&line);
            }
        }

        let summary = &report.summary;
        if extended {
            sink.inform(&format!(
                "    Rates and Formats for {} (best first):",
                SERVICE_NAME
            ));
            sink.inform("     Rate              Formats");
            for line in summary.summary_lines() {
                sink.inform(&line);
            }
            if !summary.alternate_rates.is_empty() {
                sink.inform(&format!(
                    "    Other Rates and Formats (not usable by {}):",
                    SERVICE_NAME
                ));
                for rate in &summary.alternate_rates {
                    sink.inform(&rate.summary_line());
                }
            }
        } else {
            sink.inform(&format!("  {} \"auto\" rate and format:", SERVICE_NAME));
            sink.inform("     Rate              Format");
            if let Some(best) = &summary.best {
                sink.inform(&best.summary_line());
            }
        }
    }
}

/// One aligned list: the header prompt on the first control, blank padding
/// of the same width on the rest.
pub fn render_gain_controls(controls: &[GainControl], extended: bool) -> Vec<String> {
    controls
        .iter()
        .enumerate()
        .map(|(i, control)| {
            let prompt = if i == 0 { MIXER_PROMPT } else { MIXER_INDENT };
            if extended {
                format!("{}{}", prompt, control.describe())
            } else {
                format!("{}\"{}\"", prompt, control.name)
            }
        })
        .collect()
}

pub fn render_accessibility(report: &AccessibilityReport, sink: &mut dyn ReportSink) {
    match report {
        AccessibilityReport::Checked(finding) => {
            for line in finding.remediation() {
                sink.inform(&line);
            }
        }
        AccessibilityReport::Failed { error } => {
            sink.inform(&format!(
                "Warning: could not check sound device permissions: {}.",
                error
            ));
        }
    }
}
