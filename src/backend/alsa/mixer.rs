use std::ffi::CString;

use alsa::mixer::{Mixer, Selem};
use nix::errno::Errno;

use crate::core::error::{BackendError, MixerError};
use crate::mixer::{GainElement, MixerBackend, MixerHandle};

/// Opens ALSA simple-element mixers.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlsaMixer;

pub struct AlsaMixerHandle {
    mixer: Mixer,
}

impl MixerBackend for AlsaMixer {
    type Mixer = AlsaMixerHandle;

    fn open_mixer(&self, card: &str) -> Result<AlsaMixerHandle, MixerError> {
        let mut mixer = Mixer::open(false).map_err(|e| MixerError::Open(e.into()))?;

        let name = CString::new(card).map_err(|_| MixerError::Attach {
            card: card.to_string(),
            source: BackendError::from_errno("snd_mixer_attach", Errno::EINVAL),
        })?;
        mixer.attach(&name).map_err(|e| MixerError::Attach {
            card: card.to_string(),
            source: e.into(),
        })?;

        Selem::register(&mut mixer).map_err(|e| MixerError::Register(e.into()))?;
        mixer.load().map_err(|e| MixerError::Load {
            card: card.to_string(),
            source: e.into(),
        })?;

        Ok(AlsaMixerHandle { mixer })
    }
}

impl MixerHandle for AlsaMixerHandle {
    type Element<'a>
        = Selem<'a>
    where
        Self: 'a;

    fn elements(&self) -> Vec<Selem<'_>> {
        self.mixer.iter().filter_map(Selem::new).collect()
    }
}

impl GainElement for Selem<'_> {
    fn name(&self) -> String {
        self.get_id()
            .get_name()
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn index(&self) -> u32 {
        self.get_id().get_index()
    }

    // The crate does not expose snd_mixer_selem_is_active; loaded simple
    // elements are taken as active.
    fn is_active(&self) -> bool {
        true
    }

    // Common volume and switch are not queryable through the crate either.
    fn affects_capture(&self) -> bool {
        self.has_capture_volume() || self.has_capture_switch()
    }

    fn playback_db_range(&self) -> Option<(i64, i64)> {
        if !self.has_playback_volume() {
            return None;
        }
        let (min, max) = self.get_playback_db_range();
        (min != max).then_some((min.0, max.0))
    }

    fn playback_volume_range(&self) -> (i64, i64) {
        self.get_playback_volume_range()
    }

    fn playback_db_at(&self, volume: i64) -> Result<i64, BackendError> {
        Ok(self.ask_playback_vol_db(volume)?.0)
    }
}
