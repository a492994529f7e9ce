mod cards;
mod mixer;
mod pcm;

pub use cards::AlsaCards;
pub use mixer::AlsaMixer;
pub use pcm::{AlsaPcm, AlsaPcmHandle};

use crate::core::error::BackendError;

impl From<alsa::Error> for BackendError {
    fn from(e: alsa::Error) -> Self {
        BackendError::new(e.func(), e.errno())
    }
}
