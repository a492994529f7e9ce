use anyhow::{Context, Result};
use alsa::Direction;
use alsa::card;
use alsa::ctl::{Ctl, DeviceIter};
use nix::errno::Errno;

use crate::core::device_enumerator::{DeviceEnumerator, PlaybackDeviceInfo};

/// Walks the sound cards and their playback PCM devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlsaCards;

impl AlsaCards {
    fn card_devices(card: &card::Card) -> Result<Vec<PlaybackDeviceInfo>> {
        let card_index = card.get_index();
        let ctl = Ctl::from_card(card, false)
            .with_context(|| format!("opening control interface of card {}", card_index))?;
        let info = ctl
            .card_info()
            .with_context(|| format!("reading info of card {}", card_index))?;
        let card_id = info.get_id().unwrap_or_default().to_string();
        let card_name = info.get_name().unwrap_or_default().to_string();

        let mut devices = Vec::new();
        for device in DeviceIter::new(&ctl) {
            let Ok(device) = u32::try_from(device) else {
                continue;
            };
            let pcm = match ctl.pcm_info(device, 0, Direction::Playback) {
                Ok(pcm) => pcm,
                // capture-only device
                Err(e) if e.errno() == Errno::ENOENT as i32 => continue,
                Err(e) => {
                    log::warn!(
                        "control digital audio info ({}, {}): {}",
                        card_index,
                        device,
                        e
                    );
                    continue;
                }
            };
            devices.push(PlaybackDeviceInfo {
                card_index: card_index as u32,
                card_id: card_id.clone(),
                card_name: card_name.clone(),
                device,
                pcm_id: pcm.get_id().unwrap_or_default().to_string(),
                pcm_name: pcm.get_name().unwrap_or_default().to_string(),
            });
        }
        Ok(devices)
    }
}

impl DeviceEnumerator for AlsaCards {
    fn playback_devices(&self) -> Result<Vec<PlaybackDeviceInfo>> {
        let mut devices = Vec::new();
        for card in card::Iter::new() {
            let card = card.context("enumerating sound cards")?;
            match Self::card_devices(&card) {
                Ok(found) => devices.extend(found),
                Err(e) => log::warn!("skipping card {}: {:#}", card.get_index(), e),
            }
        }
        log::debug!("found {} playback devices", devices.len());
        Ok(devices)
    }
}
