use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::{Result, bail};
use nix::errno::Errno;

use crate::catalog::SampleEncoding;
use crate::core::device_enumerator::{DeviceEnumerator, PlaybackDeviceInfo};
use crate::core::error::{BackendError, MixerError};
use crate::core::logging::ReportSink;
use crate::mixer::{GainElement, MixerBackend, MixerHandle};
use crate::probe::{AccessMode, HwConfig, PcmBackend, PcmHandle, ProbeStage, SwConfig};

#[derive(Debug, Clone, Default)]
struct PcmScript {
    formats: HashSet<SampleEncoding>,
    rates: HashMap<u32, u32>,
    commit_rejects: HashSet<(SampleEncoding, u32)>,
    open_errno: Option<Errno>,
    busy_after: Option<usize>,
    failing_stage: Option<(ProbeStage, Errno)>,
    /// Opens up to this count are spared the failing stage.
    failing_after: usize,
    mmap_only: bool,
}

#[derive(Debug, Default)]
struct PcmCounters {
    opens: Cell<usize>,
    open_now: Cell<usize>,
    max_open: Cell<usize>,
    successes: Cell<usize>,
    probes: RefCell<Vec<(SampleEncoding, u32)>>,
    access_attempts: RefCell<Vec<AccessMode>>,
}

/// Scripted playback device.
///
/// Nothing is supported until the builder methods say so. Formats and rates
/// are judged independently; a combination can additionally be refused at
/// hardware-parameter commit.
#[derive(Debug, Clone, Default)]
pub struct MockPcmBackend {
    script: Rc<PcmScript>,
    counters: Rc<PcmCounters>,
}

impl MockPcmBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&mut self) -> &mut PcmScript {
        Rc::make_mut(&mut self.script)
    }

    pub fn accept_formats(mut self, formats: impl IntoIterator<Item = SampleEncoding>) -> Self {
        self.script().formats.extend(formats);
        self
    }

    pub fn accept_rates(mut self, rates: impl IntoIterator<Item = u32>) -> Self {
        self.script().rates.extend(rates.into_iter().map(|r| (r, r)));
        self
    }

    /// The device answers a request for `requested` with `granted`.
    pub fn grant_rate(mut self, requested: u32, granted: u32) -> Self {
        self.script().rates.insert(requested, granted);
        self
    }

    pub fn reject_at_commit(mut self, encoding: SampleEncoding, rate: u32) -> Self {
        self.script().commit_rejects.insert((encoding, rate));
        self
    }

    pub fn fail_open(mut self, errno: Errno) -> Self {
        self.script().open_errno = Some(errno);
        self
    }

    /// Opens after the first `opens` report the device busy.
    pub fn busy_after_opens(mut self, opens: usize) -> Self {
        self.script().busy_after = Some(opens);
        self
    }

    pub fn fail_stage(mut self, stage: ProbeStage, errno: Errno) -> Self {
        self.script().failing_stage = Some((stage, errno));
        self
    }

    /// Like `fail_stage`, but the first `opens` opens work normally.
    pub fn fail_stage_after_opens(
        mut self,
        opens: usize,
        stage: ProbeStage,
        errno: Errno,
    ) -> Self {
        let script = self.script();
        script.failing_stage = Some((stage, errno));
        script.failing_after = opens;
        self
    }

    /// Only memory-mapped interleaved access is offered.
    pub fn mmap_only(mut self) -> Self {
        self.script().mmap_only = true;
        self
    }

    /// Every open attempt, including refused ones.
    pub fn opens(&self) -> usize {
        self.counters.opens.get()
    }

    pub fn open_handles(&self) -> usize {
        self.counters.open_now.get()
    }

    pub fn max_open_handles(&self) -> usize {
        self.counters.max_open.get()
    }

    /// Fully configured probes.
    pub fn successes(&self) -> usize {
        self.counters.successes.get()
    }

    /// (encoding, rate) pairs that got as far as rate negotiation.
    pub fn probes(&self) -> Vec<(SampleEncoding, u32)> {
        self.counters.probes.borrow().clone()
    }

    pub fn access_attempts(&self) -> Vec<AccessMode> {
        self.counters.access_attempts.borrow().clone()
    }
}

impl PcmBackend for MockPcmBackend {
    type Handle = MockPcmHandle;

    fn open_playback(&self, _device: &str) -> Result<MockPcmHandle, BackendError> {
        let counters = &self.counters;
        counters.opens.set(counters.opens.get() + 1);

        if let Some(errno) = self.script.open_errno {
            return Err(BackendError::from_errno("snd_pcm_open", errno));
        }
        if let Some((ProbeStage::Open, errno)) = self.script.failing_stage {
            if counters.opens.get() > self.script.failing_after {
                return Err(BackendError::from_errno("snd_pcm_open", errno));
            }
        }
        if matches!(self.script.busy_after, Some(n) if counters.opens.get() > n) {
            return Err(BackendError::from_errno("snd_pcm_open", Errno::EBUSY));
        }

        counters.open_now.set(counters.open_now.get() + 1);
        counters
            .max_open
            .set(counters.max_open.get().max(counters.open_now.get()));

        Ok(MockPcmHandle {
            script: self.script.clone(),
            counters: self.counters.clone(),
            opened_as: counters.opens.get(),
            encoding: Cell::new(None),
            rate: Cell::new(None),
        })
    }
}

pub struct MockPcmHandle {
    script: Rc<PcmScript>,
    counters: Rc<PcmCounters>,
    opened_as: usize,
    encoding: Cell<Option<SampleEncoding>>,
    rate: Cell<Option<u32>>,
}

impl MockPcmHandle {
    fn fails_at(&self, stage: ProbeStage, op: &'static str) -> Result<(), BackendError> {
        match self.script.failing_stage {
            Some((failing, errno))
                if failing == stage && self.opened_as > self.script.failing_after =>
            {
                Err(BackendError::from_errno(op, errno))
            }
            _ => Ok(()),
        }
    }
}

impl Drop for MockPcmHandle {
    fn drop(&mut self) {
        self.counters
            .open_now
            .set(self.counters.open_now.get() - 1);
    }
}

pub struct MockHwParams<'a> {
    handle: &'a MockPcmHandle,
}

pub struct MockSwParams<'a> {
    handle: &'a MockPcmHandle,
}

impl PcmHandle for MockPcmHandle {
    type HwConfig<'a>
        = MockHwParams<'a>
    where
        Self: 'a;
    type SwConfig<'a>
        = MockSwParams<'a>
    where
        Self: 'a;

    fn hw_params_any(&self) -> Result<MockHwParams<'_>, BackendError> {
        self.fails_at(ProbeStage::Configuration, "snd_pcm_hw_params_any")?;
        Ok(MockHwParams { handle: self })
    }

    fn commit_hw_params(&self, _hw: &MockHwParams<'_>) -> Result<(), BackendError> {
        let key = self.encoding.get().zip(self.rate.get());
        if key.is_some_and(|k| self.script.commit_rejects.contains(&k)) {
            return Err(BackendError::from_errno("snd_pcm_hw_params", Errno::EINVAL));
        }
        Ok(())
    }

    fn sw_params_current(&self) -> Result<MockSwParams<'_>, BackendError> {
        self.fails_at(ProbeStage::SwParamsRead, "snd_pcm_sw_params_current")?;
        Ok(MockSwParams { handle: self })
    }

    fn commit_sw_params(&self, _sw: &MockSwParams<'_>) -> Result<(), BackendError> {
        self.fails_at(ProbeStage::SwParamsCommit, "snd_pcm_sw_params")?;
        let successes = &self.counters.successes;
        successes.set(successes.get() + 1);
        Ok(())
    }
}

impl HwConfig for MockHwParams<'_> {
    fn set_access(&self, access: AccessMode) -> Result<(), BackendError> {
        let handle = self.handle;
        handle.counters.access_attempts.borrow_mut().push(access);
        handle.fails_at(ProbeStage::Access, "snd_pcm_hw_params_set_access")?;
        if handle.script.mmap_only && access == AccessMode::RwInterleaved {
            return Err(BackendError::from_errno(
                "snd_pcm_hw_params_set_access",
                Errno::EINVAL,
            ));
        }
        Ok(())
    }

    fn set_channels(&self, _channels: u32) -> Result<(), BackendError> {
        self.handle
            .fails_at(ProbeStage::Channels, "snd_pcm_hw_params_set_channels")
    }

    fn set_format(&self, encoding: SampleEncoding) -> Result<(), BackendError> {
        if !self.handle.script.formats.contains(&encoding) {
            return Err(BackendError::from_errno(
                "snd_pcm_hw_params_set_format",
                Errno::EINVAL,
            ));
        }
        self.handle.encoding.set(Some(encoding));
        Ok(())
    }

    fn set_rate_near(&self, rate: u32) -> Result<u32, BackendError> {
        let handle = self.handle;
        if let Some(encoding) = handle.encoding.get() {
            handle.counters.probes.borrow_mut().push((encoding, rate));
        }
        let granted = handle.script.rates.get(&rate).copied().ok_or_else(|| {
            BackendError::from_errno("snd_pcm_hw_params_set_rate_near", Errno::EINVAL)
        })?;
        handle.rate.set(Some(granted));
        Ok(granted)
    }
}

impl SwConfig for MockSwParams<'_> {
    fn enable_timestamps(&self) -> Result<(), BackendError> {
        self.handle
            .fails_at(ProbeStage::Timestamp, "snd_pcm_sw_params_set_tstamp_mode")
    }
}

/// Routes each PCM name to its own scripted device; unknown names are
/// reported as missing.
#[derive(Debug, Clone, Default)]
pub struct MockPcmDevices {
    devices: HashMap<String, MockPcmBackend>,
}

impl MockPcmDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, device: &str, backend: MockPcmBackend) -> Self {
        self.devices.insert(device.to_string(), backend);
        self
    }

    pub fn device(&self, device: &str) -> Option<&MockPcmBackend> {
        self.devices.get(device)
    }
}

impl PcmBackend for MockPcmDevices {
    type Handle = MockPcmHandle;

    fn open_playback(&self, device: &str) -> Result<MockPcmHandle, BackendError> {
        match self.devices.get(device) {
            Some(backend) => backend.open_playback(device),
            None => Err(BackendError::from_errno("snd_pcm_open", Errno::ENODEV)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockElement {
    name: String,
    index: u32,
    active: bool,
    capture: bool,
    db_range: Option<(i64, i64)>,
    volume_range: (i64, i64),
    db_at: HashMap<i64, i64>,
}

impl MockElement {
    /// An active playback-only element with the given dB range.
    pub fn new(name: &str, db_range: (i64, i64)) -> Self {
        Self {
            name: name.to_string(),
            index: 0,
            active: true,
            capture: false,
            db_range: Some(db_range),
            volume_range: (0, 100),
            db_at: HashMap::new(),
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn with_capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn without_db(mut self) -> Self {
        self.db_range = None;
        self
    }

    pub fn with_volume_range(mut self, min: i64, max: i64) -> Self {
        self.volume_range = (min, max);
        self
    }

    pub fn with_db_at(mut self, volume: i64, centibels: i64) -> Self {
        self.db_at.insert(volume, centibels);
        self
    }
}

impl GainElement for &MockElement {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn affects_capture(&self) -> bool {
        self.capture
    }

    fn playback_db_range(&self) -> Option<(i64, i64)> {
        self.db_range
    }

    fn playback_volume_range(&self) -> (i64, i64) {
        self.volume_range
    }

    fn playback_db_at(&self, volume: i64) -> Result<i64, BackendError> {
        self.db_at.get(&volume).copied().ok_or_else(|| {
            BackendError::from_errno("snd_mixer_selem_ask_playback_vol_dB", Errno::EINVAL)
        })
    }
}

/// Every card gets the same element list, or the same failure.
#[derive(Debug, Default)]
pub struct MockMixerBackend {
    elements: Vec<MockElement>,
    error: Option<MixerError>,
    opens: Cell<usize>,
}

impl MockMixerBackend {
    pub fn new(elements: Vec<MockElement>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn failing(error: MixerError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.get()
    }
}

pub struct MockMixer {
    elements: Vec<MockElement>,
}

impl MixerBackend for MockMixerBackend {
    type Mixer = MockMixer;

    fn open_mixer(&self, _card: &str) -> Result<MockMixer, MixerError> {
        self.opens.set(self.opens.get() + 1);
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(MockMixer {
                elements: self.elements.clone(),
            }),
        }
    }
}

impl MixerHandle for MockMixer {
    type Element<'a>
        = &'a MockElement
    where
        Self: 'a;

    fn elements(&self) -> Vec<&MockElement> {
        self.elements.iter().collect()
    }
}

#[derive(Debug, Default)]
pub struct MockEnumerator {
    devices: Vec<PlaybackDeviceInfo>,
    error: Option<String>,
}

impl MockEnumerator {
    pub fn new(devices: Vec<PlaybackDeviceInfo>) -> Self {
        Self {
            devices,
            error: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            devices: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

impl DeviceEnumerator for MockEnumerator {
    fn playback_devices(&self) -> Result<Vec<PlaybackDeviceInfo>> {
        if let Some(message) = &self.error {
            bail!("{}", message);
        }
        Ok(self.devices.clone())
    }
}

/// Keeps report lines (and diagnostics) for assertions.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub lines: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl CollectingSink {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl ReportSink for CollectingSink {
    fn inform(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn diagnostic(&mut self, line: &str) {
        self.diagnostics.push(line.to_string());
    }
}

/// A playback device description for tests.
pub fn playback_device(card_index: u32, card_id: &str, device: u32) -> PlaybackDeviceInfo {
    PlaybackDeviceInfo {
        card_index,
        card_id: card_id.to_string(),
        card_name: format!("{} card", card_id),
        device,
        pcm_id: format!("{} PCM", card_id),
        pcm_name: format!("{} PCM {}", card_id, device),
    }
}
