use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::metrics::ChannelMetrics;

/// SNR difference (dB) below which two channels count as equally clean.
pub const SNR_TIE_DB: f64 = 1.0;
/// Speech-ratio difference below which two channels count as equally busy.
pub const SPEECH_RATIO_TIE: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    #[default]
    Auto,
    Left,
    Right,
}

/// Which step of the cascade settled the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Forced,
    Snr,
    SpeechRatio,
    Loudness,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Reason::Forced => "forced",
            Reason::Snr => "snr",
            Reason::SpeechRatio => "speech ratio",
            Reason::Loudness => "loudness",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelSelection {
    pub side: Side,
    pub reason: Reason,
    pub metrics: ChannelMetrics,
}

/// Pick the channel that carries the cleaner speech.
///
/// Order: SNR beyond [`SNR_TIE_DB`], then speech ratio beyond
/// [`SPEECH_RATIO_TIE`], then overall RMS with exact ties going left.
pub fn select(left: &ChannelMetrics, right: &ChannelMetrics, preference: Preference) -> ChannelSelection {
    let pick = |side: Side, reason: Reason| ChannelSelection {
        side,
        reason,
        metrics: match side {
            Side::Left => left.clone(),
            Side::Right => right.clone(),
        },
    };

    match preference {
        Preference::Left => return pick(Side::Left, Reason::Forced),
        Preference::Right => return pick(Side::Right, Reason::Forced),
        Preference::Auto => {}
    }

    if (left.snr_db - right.snr_db).abs() > SNR_TIE_DB {
        let side = if left.snr_db > right.snr_db { Side::Left } else { Side::Right };
        return pick(side, Reason::Snr);
    }

    if (left.speech_ratio - right.speech_ratio).abs() > SPEECH_RATIO_TIE {
        let side = if left.speech_ratio > right.speech_ratio { Side::Left } else { Side::Right };
        return pick(side, Reason::SpeechRatio);
    }

    let side = if left.overall_rms >= right.overall_rms { Side::Left } else { Side::Right };
    pick(side, Reason::Loudness)
}
