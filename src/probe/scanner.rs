use serde::{Deserialize, Serialize};

use crate::catalog::{FORMAT_CHECK_SEQUENCE, RateLadder, SampleEncoding};
use crate::core::logging::{ComponentLogger, LogContext, ReportSink};

use super::{PcmBackend, ProbeOutcome, probe_device};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// No report lines, no failure logging from the mixer inspector.
    #[default]
    Quiet,
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyExit {
    /// Stop at the first working combination.
    FirstSuccess,
    /// Try every combination on the ladder.
    Exhaustive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub verbosity: Verbosity,
    pub early_exit: EarlyExit,
    pub ladder: RateLadder,
    /// After an exhaustive scan of the standard ladder, also scan the
    /// alternate one and record what works there.
    pub include_alternate: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Quiet,
            early_exit: EarlyExit::Exhaustive,
            ladder: RateLadder::Standard,
            include_alternate: false,
        }
    }
}

impl ScanOptions {
    pub fn first_success() -> Self {
        Self {
            early_exit: EarlyExit::FirstSuccess,
            ..Self::default()
        }
    }

    pub fn exhaustive() -> Self {
        Self::default()
    }

    pub fn verbose(mut self) -> Self {
        self.verbosity = Verbosity::Verbose;
        self
    }

    pub fn with_ladder(mut self, ladder: RateLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_alternate(mut self) -> Self {
        self.include_alternate = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceVerdict {
    Usable,
    Busy,
    Inaccessible,
    Unusable,
}

/// Encodings that worked at one rate, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateCapability {
    pub rate: u32,
    pub encodings: Vec<SampleEncoding>,
}

impl RateCapability {
    /// `     44100             S32_LE,S16_LE`
    pub fn summary_line(&self) -> String {
        let names: Vec<&str> = self.encodings.iter().map(|e| e.name()).collect();
        format!("     {:<6}            {}", self.rate, names.join(","))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BestSetting {
    pub rate: u32,
    pub encoding: SampleEncoding,
}

impl BestSetting {
    pub fn summary_line(&self) -> String {
        format!("     {:<6}            {}", self.rate, self.encoding)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCapabilitySummary {
    pub device: String,
    pub verdict: DeviceVerdict,
    /// Rates on the active ladder with at least one working encoding.
    pub rates: Vec<RateCapability>,
    /// Working rates found on the alternate ladder after the active one.
    pub alternate_rates: Vec<RateCapability>,
    pub best: Option<BestSetting>,
    pub probes_attempted: usize,
    /// The outcome that ended the scan early, if any.
    pub failure: Option<ProbeOutcome>,
}

impl DeviceCapabilitySummary {
    fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            verdict: DeviceVerdict::Unusable,
            rates: Vec::new(),
            alternate_rates: Vec::new(),
            best: None,
            probes_attempted: 0,
            failure: None,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.verdict == DeviceVerdict::Usable
    }

    pub fn encodings_at(&self, rate: u32) -> &[SampleEncoding] {
        self.rates
            .iter()
            .chain(self.alternate_rates.iter())
            .find(|r| r.rate == rate)
            .map(|r| r.encodings.as_slice())
            .unwrap_or(&[])
    }

    pub fn success_count(&self) -> usize {
        self.rates.iter().map(|r| r.encodings.len()).sum()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        self.rates.iter().map(RateCapability::summary_line).collect()
    }
}

struct Scan<'a, B> {
    backend: &'a B,
    device: &'a str,
    options: ScanOptions,
}

impl<B> ComponentLogger for Scan<'_, B> {
    fn log_context(&self) -> LogContext {
        LogContext::new("scan", self.device)
    }
}

enum LadderEnd {
    Completed,
    StoppedAtFirstSuccess,
    Aborted(ProbeOutcome),
}

impl<B: PcmBackend> Scan<'_, B> {
    fn run(&self, sink: &mut dyn ReportSink) -> DeviceCapabilitySummary {
        let mut summary = DeviceCapabilitySummary::new(self.device);
        let mut found = Vec::new();

        let end = self.scan_ladder(self.options.ladder, &mut found, &mut summary, sink);
        summary.rates = found;
        summary.best = summary.rates.first().map(|r| BestSetting {
            rate: r.rate,
            encoding: r.encodings[0],
        });

        summary.verdict = match &end {
            LadderEnd::Aborted(ProbeOutcome::DeviceBusy) => DeviceVerdict::Busy,
            LadderEnd::Aborted(ProbeOutcome::DeviceInaccessible { .. }) => {
                DeviceVerdict::Inaccessible
            }
            LadderEnd::Aborted(_) => DeviceVerdict::Unusable,
            _ if summary.best.is_some() => DeviceVerdict::Usable,
            _ => DeviceVerdict::Unusable,
        };

        if let LadderEnd::Aborted(outcome) = end {
            self.debug(&format!("scan aborted: {}", outcome));
            summary.failure = Some(outcome);
        } else if self.wants_alternate() {
            let mut alternate = Vec::new();
            let other = self.options.ladder.other();
            if let LadderEnd::Aborted(outcome) =
                self.scan_ladder(other, &mut alternate, &mut summary, sink)
            {
                // The verdict stands; the device already worked or failed on its own ladder.
                self.debug(&format!("alternate ladder scan aborted: {}", outcome));
            }
            summary.alternate_rates = alternate;
        }

        self.debug(&format!(
            "{:?} after {} probes",
            summary.verdict, summary.probes_attempted
        ));
        summary
    }

    fn wants_alternate(&self) -> bool {
        self.options.include_alternate
            && self.options.early_exit == EarlyExit::Exhaustive
            && self.options.ladder == RateLadder::Standard
    }

    fn scan_ladder(
        &self,
        ladder: RateLadder,
        found: &mut Vec<RateCapability>,
        summary: &mut DeviceCapabilitySummary,
        sink: &mut dyn ReportSink,
    ) -> LadderEnd {
        for &rate in ladder.rates() {
            let mut working = RateCapability {
                rate,
                encodings: Vec::new(),
            };

            for &encoding in FORMAT_CHECK_SEQUENCE.iter() {
                let outcome = probe_device(self.backend, self.device, encoding, rate);
                summary.probes_attempted += 1;

                if outcome.is_success() {
                    working.encodings.push(encoding);
                    if self.options.early_exit == EarlyExit::FirstSuccess {
                        self.emit(&working, sink);
                        found.push(working);
                        return LadderEnd::StoppedAtFirstSuccess;
                    }
                } else if outcome.aborts_scan() {
                    self.emit(&working, sink);
                    if !working.encodings.is_empty() {
                        found.push(working);
                    }
                    return LadderEnd::Aborted(outcome);
                }
            }

            self.emit(&working, sink);
            if !working.encodings.is_empty() {
                found.push(working);
            }
        }
        LadderEnd::Completed
    }

    fn emit(&self, working: &RateCapability, sink: &mut dyn ReportSink) {
        if self.options.verbosity == Verbosity::Verbose && !working.encodings.is_empty() {
            sink.inform(&working.summary_line());
        }
    }
}

/// Probes every (rate, encoding) pair of the chosen ladder on `device`, in
/// catalog order, honouring the early-exit mode.
///
/// Format, rate and commit rejections only prune the search. Busy,
/// inaccessible and other failures end the scan and decide the verdict.
pub fn scan_device<B: PcmBackend>(
    backend: &B,
    device: &str,
    options: &ScanOptions,
    sink: &mut dyn ReportSink,
) -> DeviceCapabilitySummary {
    Scan {
        backend,
        device,
        options: *options,
    }
    .run(sink)
}
