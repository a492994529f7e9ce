//! Hardware backends for the probe, mixer and enumeration seams.

pub mod alsa;

pub use self::alsa::{AlsaCards, AlsaMixer, AlsaPcm};
