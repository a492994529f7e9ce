//! Mixer gain inspector: finds the playback controls with a decibel range.

use serde::Serialize;

use crate::core::error::{BackendError, MixerError};
use crate::core::logging::{ComponentLogger, LogContext};
use crate::probe::Verbosity;

/// The value a driver reports as the minimum dB when the bottom of the range
/// is "mute", in hundredths of a dB (`SND_CTL_TLV_DB_GAIN_MUTE`).
pub const MUTE_SENTINEL: i64 = -9_999_999;

pub trait MixerBackend {
    type Mixer: MixerHandle;

    /// Opens a mixer, attaches it to `card`, registers the simple element
    /// class and loads the element list.
    fn open_mixer(&self, card: &str) -> Result<Self::Mixer, MixerError>;
}

pub trait MixerHandle {
    type Element<'a>: GainElement
    where
        Self: 'a;

    /// Simple elements in registration order.
    fn elements(&self) -> Vec<Self::Element<'_>>;
}

pub trait GainElement {
    fn name(&self) -> String;
    fn index(&self) -> u32;
    fn is_active(&self) -> bool;
    /// Has a capture volume or switch.
    fn affects_capture(&self) -> bool;
    /// Playback range in hundredths of a dB, `None` when the element has no dB
    /// mapping.
    fn playback_db_range(&self) -> Option<(i64, i64)>;
    /// Raw linear playback volume range.
    fn playback_volume_range(&self) -> (i64, i64);
    /// dB value (hundredths) of a raw linear playback volume.
    fn playback_db_at(&self, volume: i64) -> Result<i64, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GainControl {
    pub name: String,
    pub index: u32,
    /// Hundredths of a dB.
    pub min_centibels: i64,
    pub max_centibels: i64,
    pub shared_with_capture: bool,
    /// The driver reported mute as the minimum; `min_centibels` is the first
    /// audible step instead.
    pub mute_floor_resolved: bool,
}

impl GainControl {
    pub fn min_db(&self) -> f64 {
        self.min_centibels as f64 / 100.0
    }

    pub fn max_db(&self) -> f64 {
        self.max_centibels as f64 / 100.0
    }

    pub fn describe(&self) -> String {
        format!(
            "\"{}\" (index {}, {:.2} dB to {:.2} dB{})",
            self.name,
            self.index,
            self.min_db(),
            self.max_db(),
            if self.shared_with_capture {
                ", shared with capture"
            } else {
                ""
            }
        )
    }
}

struct Inspection<'a> {
    card: &'a str,
    verbosity: Verbosity,
}

impl ComponentLogger for Inspection<'_> {
    fn log_context(&self) -> LogContext {
        LogContext::new("mixer", self.card)
    }
}

impl Inspection<'_> {
    fn resolve<E: GainElement>(&self, element: &E) -> Option<GainControl> {
        let (min, max) = element.playback_db_range()?;
        let name = element.name();

        let (floor, resolved) = if min == MUTE_SENTINEL {
            let (min_volume, _) = element.playback_volume_range();
            match element.playback_db_at(min_volume + 1) {
                Ok(db) if db != MUTE_SENTINEL => (db, true),
                Ok(_) => {
                    self.debug(&format!("\"{}\" has no audible step above mute", name));
                    return None;
                }
                Err(e) => {
                    self.debug(&format!("\"{}\" mute floor lookup failed: {}", name, e));
                    return None;
                }
            }
        } else {
            (min, false)
        };

        Some(GainControl {
            name,
            index: element.index(),
            min_centibels: floor,
            max_centibels: max,
            shared_with_capture: element.affects_capture(),
            mute_floor_resolved: resolved,
        })
    }
}

/// Lists the active mixer elements on `card` that expose a playback decibel
/// range.
///
/// With `include_shared_capture` false only elements that do not also control
/// capture are returned, with it true only those that do. Failures to open or
/// load the mixer give an empty list and are logged only when verbose.
pub fn inspect_gain_controls<M: MixerBackend>(
    backend: &M,
    card: &str,
    include_shared_capture: bool,
    verbosity: Verbosity,
) -> Vec<GainControl> {
    let inspection = Inspection { card, verbosity };

    let mixer = match backend.open_mixer(card) {
        Ok(mixer) => mixer,
        Err(e) => {
            if inspection.verbosity == Verbosity::Verbose {
                inspection.debug(&e.to_string());
            }
            return Vec::new();
        }
    };

    let elements = mixer.elements();
    elements
        .iter()
        .filter(|e| e.is_active())
        .filter(|e| e.affects_capture() == include_shared_capture)
        .filter_map(|e| inspection.resolve(e))
        .collect()
}

/// Playback-only controls followed by controls shared with capture.
pub fn all_gain_controls<M: MixerBackend>(
    backend: &M,
    card: &str,
    verbosity: Verbosity,
) -> Vec<GainControl> {
    let mut controls = inspect_gain_controls(backend, card, false, verbosity);
    controls.extend(inspect_gain_controls(backend, card, true, verbosity));
    controls
}
