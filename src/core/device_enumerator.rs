use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One playback PCM device on a sound card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackDeviceInfo {
    pub card_index: u32,
    /// Card id as used in `hw:CARD=<id>`.
    pub card_id: String,
    pub card_name: String,
    pub device: u32,
    pub pcm_id: String,
    pub pcm_name: String,
}

impl PlaybackDeviceInfo {
    /// Name used to open the PCM.
    pub fn pcm_address(&self) -> String {
        format!("hw:{},{}", self.card_index, self.device)
    }

    /// Name used to attach a mixer; mixers belong to the card.
    pub fn mixer_address(&self) -> String {
        format!("hw:{}", self.card_index)
    }

    pub fn long_name(&self) -> String {
        format!("hw:CARD={},DEV={}", self.card_id, self.device)
    }

    pub fn short_name(&self) -> String {
        if self.device > 0 {
            format!("hw:{},{}", self.card_index, self.device)
        } else {
            format!("hw:{}", self.card_index)
        }
    }
}

/// Lists the playback devices on this machine.
pub trait DeviceEnumerator {
    /// An empty list means there are no sound cards at all.
    fn playback_devices(&self) -> Result<Vec<PlaybackDeviceInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(card_index: u32, device: u32) -> PlaybackDeviceInfo {
        PlaybackDeviceInfo {
            card_index,
            card_id: "Headphones".into(),
            card_name: "bcm2835 Headphones".into(),
            device,
            pcm_id: "bcm2835 Headphones".into(),
            pcm_name: "bcm2835 Headphones".into(),
        }
    }

    #[test]
    fn addresses() {
        let first = info(0, 0);
        assert_eq!(first.pcm_address(), "hw:0,0");
        assert_eq!(first.mixer_address(), "hw:0");
        assert_eq!(first.short_name(), "hw:0");
        assert_eq!(first.long_name(), "hw:CARD=Headphones,DEV=0");

        let second = info(2, 3);
        assert_eq!(second.short_name(), "hw:2,3");
        assert_eq!(second.mixer_address(), "hw:2");
    }
}
