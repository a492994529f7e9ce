use alsa::pcm::{Access, Format, HwParams, PCM, SwParams};
use alsa::{Direction, ValueOr};

use crate::catalog::SampleEncoding;
use crate::core::error::BackendError;
use crate::probe::{AccessMode, HwConfig, PcmBackend, PcmHandle, SwConfig};

/// Opens ALSA playback PCMs by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlsaPcm;

pub struct AlsaPcmHandle {
    pcm: PCM,
}

impl PcmBackend for AlsaPcm {
    type Handle = AlsaPcmHandle;

    fn open_playback(&self, device: &str) -> Result<AlsaPcmHandle, BackendError> {
        let pcm = PCM::new(device, Direction::Playback, false)?;
        Ok(AlsaPcmHandle { pcm })
    }
}

impl PcmHandle for AlsaPcmHandle {
    type HwConfig<'a>
        = HwParams<'a>
    where
        Self: 'a;
    type SwConfig<'a>
        = SwParams<'a>
    where
        Self: 'a;

    fn hw_params_any(&self) -> Result<HwParams<'_>, BackendError> {
        Ok(HwParams::any(&self.pcm)?)
    }

    fn commit_hw_params(&self, hw: &HwParams<'_>) -> Result<(), BackendError> {
        Ok(self.pcm.hw_params(hw)?)
    }

    fn sw_params_current(&self) -> Result<SwParams<'_>, BackendError> {
        Ok(self.pcm.sw_params_current()?)
    }

    fn commit_sw_params(&self, sw: &SwParams<'_>) -> Result<(), BackendError> {
        Ok(self.pcm.sw_params(sw)?)
    }
}

fn alsa_format(encoding: SampleEncoding) -> Format {
    match encoding {
        SampleEncoding::S8 => Format::S8,
        SampleEncoding::U8 => Format::U8,
        SampleEncoding::S16 => Format::s16(),
        SampleEncoding::S16Le => Format::S16LE,
        SampleEncoding::S16Be => Format::S16BE,
        SampleEncoding::S24 => Format::s24(),
        SampleEncoding::S24Le => Format::S24LE,
        SampleEncoding::S24Be => Format::S24BE,
        SampleEncoding::S24_3Le => Format::S243LE,
        SampleEncoding::S24_3Be => Format::S243BE,
        SampleEncoding::S32 => Format::s32(),
        SampleEncoding::S32Le => Format::S32LE,
        SampleEncoding::S32Be => Format::S32BE,
    }
}

impl HwConfig for HwParams<'_> {
    fn set_access(&self, access: AccessMode) -> Result<(), BackendError> {
        let access = match access {
            AccessMode::RwInterleaved => Access::RWInterleaved,
            AccessMode::MmapInterleaved => Access::MMapInterleaved,
        };
        Ok(HwParams::set_access(self, access)?)
    }

    fn set_channels(&self, channels: u32) -> Result<(), BackendError> {
        Ok(HwParams::set_channels(self, channels)?)
    }

    fn set_format(&self, encoding: SampleEncoding) -> Result<(), BackendError> {
        Ok(HwParams::set_format(self, alsa_format(encoding))?)
    }

    fn set_rate_near(&self, rate: u32) -> Result<u32, BackendError> {
        Ok(HwParams::set_rate_near(self, rate, ValueOr::Nearest)?)
    }
}

impl SwConfig for SwParams<'_> {
    fn enable_timestamps(&self) -> Result<(), BackendError> {
        Ok(self.set_tstamp_mode(true)?)
    }
}
