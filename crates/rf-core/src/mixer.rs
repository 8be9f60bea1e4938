//! Mixer aggregates: channels, buses, sends and the master strip

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

// ═══════════════════════════════════════════════════════════════════════════════
// RANGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Fader floor (treated as -inf)
pub const MIN_VOLUME_DB: f64 = -144.0;
/// Fader ceiling
pub const MAX_VOLUME_DB: f64 = 12.0;
/// Limiter ceiling range
pub const MIN_CEILING_DB: f64 = -12.0;
pub const MAX_CEILING_DB: f64 = 0.0;
/// Stereo width range (0 = mono, 1 = unchanged, 2 = extra wide)
pub const MAX_STEREO_WIDTH: f64 = 2.0;

#[inline]
pub fn clamp_volume_db(db: f64) -> f64 {
    db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB)
}

#[inline]
pub fn clamp_pan(pan: f64) -> f64 {
    pan.clamp(-1.0, 1.0)
}

#[inline]
pub fn clamp_send_level(level: f64) -> f64 {
    level.clamp(0.0, 1.0)
}

#[inline]
pub fn clamp_ceiling_db(db: f64) -> f64 {
    db.clamp(MIN_CEILING_DB, MAX_CEILING_DB)
}

#[inline]
pub fn clamp_stereo_width(width: f64) -> f64 {
    width.clamp(0.0, MAX_STEREO_WIDTH)
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Channel and bus ids share one allocator; loading either advances it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BusId(pub u64);

static NEXT_MIXER_ID: AtomicU64 = AtomicU64::new(1);

fn next_mixer_id() -> u64 {
    NEXT_MIXER_ID.fetch_add(1, Ordering::Relaxed)
}

fn loaded_mixer_id(raw: u64) -> u64 {
    NEXT_MIXER_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
    raw
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(|raw| Self(loaded_mixer_id(raw)))
    }
}

impl<'de> Deserialize<'de> for BusId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(|raw| Self(loaded_mixer_id(raw)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHANNELS
// ═══════════════════════════════════════════════════════════════════════════════

/// Send from a channel to a bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendState {
    pub target: BusId,
    /// Linear send level (0.0-1.0)
    pub level: f64,
    pub pre_fader: bool,
}

impl SendState {
    pub fn new(target: BusId, level: f64) -> Self {
        Self {
            target,
            level: clamp_send_level(level),
            pre_fader: false,
        }
    }
}

/// Track channel strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerChannel {
    pub id: ChannelId,
    pub name: String,
    pub volume_db: f64,
    pub pan: f64,
    pub mute: bool,
    pub solo: bool,
    /// Color for UI (RGB)
    pub color: Option<u32>,
    pub sends: Vec<SendState>,
}

impl MixerChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ChannelId(next_mixer_id()),
            name: name.into(),
            volume_db: 0.0,
            pan: 0.0,
            mute: false,
            solo: false,
            color: None,
            sends: Vec::new(),
        }
    }

    pub fn with_send(mut self, send: SendState) -> Self {
        self.sends.push(send);
        self
    }
}

/// Group/aux bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusChannel {
    pub id: BusId,
    pub name: String,
    pub volume_db: f64,
    pub pan: f64,
    pub mute: bool,
    pub color: Option<u32>,
}

impl BusChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BusId(next_mixer_id()),
            name: name.into(),
            volume_db: 0.0,
            pan: 0.0,
            mute: false,
            color: None,
        }
    }
}

/// Master output strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterChannel {
    pub volume_db: f64,
    pub limiter_enabled: bool,
    pub limiter_ceiling_db: f64,
    pub stereo_width: f64,
    pub dither_enabled: bool,
}

impl Default for MasterChannel {
    fn default() -> Self {
        Self {
            volume_db: 0.0,
            limiter_enabled: true,
            limiter_ceiling_db: -0.3,
            stereo_width: 1.0,
            dither_enabled: false,
        }
    }
}
