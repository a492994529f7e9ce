//! Sample encodings and frame rates known to the prober, in probing order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linear PCM sample encodings the streaming service can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleEncoding {
    S8,
    U8,
    /// Native-endian 16 bit.
    S16,
    #[serde(rename = "S16_LE")]
    S16Le,
    #[serde(rename = "S16_BE")]
    S16Be,
    /// Native-endian 24 bit in a 32 bit container.
    S24,
    #[serde(rename = "S24_LE")]
    S24Le,
    #[serde(rename = "S24_BE")]
    S24Be,
    /// 24 bit packed into three bytes.
    #[serde(rename = "S24_3LE")]
    S24_3Le,
    #[serde(rename = "S24_3BE")]
    S24_3Be,
    /// Native-endian 32 bit.
    S32,
    #[serde(rename = "S32_LE")]
    S32Le,
    #[serde(rename = "S32_BE")]
    S32Be,
}

/// Encodings in the order they are probed.
///
/// Widest first, so the first success is also the best one: upconverting the
/// bit depth is lossless, downconverting is not. The native-endian variants are
/// left out because they alias the explicit little/big-endian entries.
pub const FORMAT_CHECK_SEQUENCE: [SampleEncoding; 10] = [
    SampleEncoding::S32Le,
    SampleEncoding::S32Be,
    SampleEncoding::S24Le,
    SampleEncoding::S24Be,
    SampleEncoding::S24_3Le,
    SampleEncoding::S24_3Be,
    SampleEncoding::S16Le,
    SampleEncoding::S16Be,
    SampleEncoding::S8,
    SampleEncoding::U8,
];

pub const ALL_ENCODINGS: [SampleEncoding; 13] = [
    SampleEncoding::S8,
    SampleEncoding::U8,
    SampleEncoding::S16,
    SampleEncoding::S16Le,
    SampleEncoding::S16Be,
    SampleEncoding::S24,
    SampleEncoding::S24Le,
    SampleEncoding::S24Be,
    SampleEncoding::S24_3Le,
    SampleEncoding::S24_3Be,
    SampleEncoding::S32,
    SampleEncoding::S32Le,
    SampleEncoding::S32Be,
];

/// Stereo is the only channel layout probed.
pub const CHANNELS: u32 = 2;

impl SampleEncoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::S8 => "S8",
            Self::U8 => "U8",
            Self::S16 => "S16",
            Self::S16Le => "S16_LE",
            Self::S16Be => "S16_BE",
            Self::S24 => "S24",
            Self::S24Le => "S24_LE",
            Self::S24Be => "S24_BE",
            Self::S24_3Le => "S24_3LE",
            Self::S24_3Be => "S24_3BE",
            Self::S32 => "S32",
            Self::S32Le => "S32_LE",
            Self::S32Be => "S32_BE",
        }
    }

    pub fn bit_depth(self) -> u8 {
        match self {
            Self::S8 | Self::U8 => 8,
            Self::S16 | Self::S16Le | Self::S16Be => 16,
            Self::S24 | Self::S24Le | Self::S24Be | Self::S24_3Le | Self::S24_3Be => 24,
            Self::S32 | Self::S32Le | Self::S32Be => 32,
        }
    }

    pub fn is_signed(self) -> bool {
        !matches!(self, Self::U8)
    }

    /// Bytes per interleaved stereo frame.
    pub fn frame_size(self) -> usize {
        let sample_bytes = match self {
            Self::S8 | Self::U8 => 1,
            Self::S16 | Self::S16Le | Self::S16Be => 2,
            Self::S24_3Le | Self::S24_3Be => 3,
            // 24 bit in a 32 bit container
            Self::S24 | Self::S24Le | Self::S24Be => 4,
            Self::S32 | Self::S32Le | Self::S32Be => 4,
        };
        sample_bytes * CHANNELS as usize
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ENCODINGS
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sample encoding '{}'", s))
    }
}

/// The two families of DAC clocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLadder {
    /// 44100 and its multiples, the rates the streaming service uses.
    #[default]
    Standard,
    /// 48000 and its multiples, plus 8000.
    Alternate,
}

pub const STANDARD_RATES: [u32; 4] = [44100, 88200, 176400, 352800];

pub const ALTERNATE_RATES: [u32; 5] = [48000, 96000, 192000, 384000, 8000];

impl RateLadder {
    pub fn rates(self) -> &'static [u32] {
        match self {
            Self::Standard => &STANDARD_RATES,
            Self::Alternate => &ALTERNATE_RATES,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Standard => Self::Alternate,
            Self::Alternate => Self::Standard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_sequence_is_widest_first() {
        let depths: Vec<u8> = FORMAT_CHECK_SEQUENCE.iter().map(|e| e.bit_depth()).collect();
        let mut sorted = depths.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(depths, sorted);
        assert_eq!(FORMAT_CHECK_SEQUENCE[0], SampleEncoding::S32Le);
    }

    #[test]
    fn signed_before_unsigned_at_eight_bits() {
        let s8 = FORMAT_CHECK_SEQUENCE.iter().position(|e| e.bit_depth() == 8 && e.is_signed());
        let u8 = FORMAT_CHECK_SEQUENCE.iter().position(|e| !e.is_signed());
        assert_eq!(s8.map(|i| FORMAT_CHECK_SEQUENCE[i]), Some(SampleEncoding::S8));
        assert_eq!(u8.map(|i| FORMAT_CHECK_SEQUENCE[i]), Some(SampleEncoding::U8));
        assert!(s8 < u8);
    }

    #[test]
    fn json_uses_alsa_names() {
        for encoding in ALL_ENCODINGS {
            let json = serde_json::to_string(&encoding).unwrap();
            assert_eq!(json, format!("\"{}\"", encoding));
            let back: SampleEncoding = serde_json::from_str(&json).unwrap();
            assert_eq!(back, encoding);
            assert_eq!(json.trim_matches('"').parse::<SampleEncoding>(), Ok(encoding));
        }
    }

    #[test]
    fn frame_sizes() {
        assert_eq!(SampleEncoding::S8.frame_size(), 2);
        assert_eq!(SampleEncoding::U8.frame_size(), 2);
        assert_eq!(SampleEncoding::S16Le.frame_size(), 4);
        assert_eq!(SampleEncoding::S24_3Be.frame_size(), 6);
        assert_eq!(SampleEncoding::S24Le.frame_size(), 8);
        assert_eq!(SampleEncoding::S32Be.frame_size(), 8);
    }

    #[test]
    fn names_parse_back() {
        for encoding in ALL_ENCODINGS {
            assert_eq!(encoding.name().parse::<SampleEncoding>(), Ok(encoding));
        }
        assert!("F32_LE".parse::<SampleEncoding>().is_err());
    }

    #[test]
    fn ladders_are_disjoint() {
        for rate in STANDARD_RATES {
            assert!(!ALTERNATE_RATES.contains(&rate));
            assert_eq!(rate % 44100, 0);
        }
        assert_eq!(RateLadder::default().rates()[0], 44100);
        assert_eq!(RateLadder::Standard.other(), RateLadder::Alternate);
    }
}
