//! Mixer strip commands
//!
//! One generic command, [`SetProperty`], parameterized by a per-strip
//! property enum. Each enum variant is one settable field carrying its new
//! value, so there is no string-keyed dispatch anywhere.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use rf_core::{
    BusChannel, MasterChannel, MixerChannel, RfError, RfResult, clamp_ceiling_db, clamp_pan,
    clamp_send_level, clamp_stereo_width, clamp_volume_db, ensure_finite,
};

use super::Shared;
use crate::undo::{Command, MergePolicy};

/// A settable field of a mixer aggregate, together with a value for it
pub trait PropertyField<T>: Clone + fmt::Debug + Sized {
    /// Same field, holding the target's current value
    fn current(&self, target: &T) -> RfResult<Self>;

    /// Write this value into the target. Returns false if the field no
    /// longer exists (a removed send).
    fn apply(&self, target: &mut T) -> bool;

    /// Reject non-finite numbers and clamp into the field's range
    fn normalized(self) -> RfResult<Self>;

    /// Fader-style fields that fire many times per gesture
    fn is_continuous(&self) -> bool;

    /// Whether both values address the same control
    fn same_control(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Control name for history labels
    fn label(&self) -> &'static str;
}

/// Set one field on a channel, bus or master strip
///
/// Continuous fields merge with the previous command on the same control
/// while inside the merge window. The window is anchored at the first
/// command of the gesture, so an endless drag still splits periodically.
#[derive(Debug)]
pub struct SetProperty<T, P> {
    target: Shared<T>,
    old: P,
    new: P,
    issued_at: Instant,
}

impl<T, P: PropertyField<T>> SetProperty<T, P> {
    pub fn new(target: Shared<T>, value: P) -> RfResult<Self> {
        let new = value.normalized()?;
        let old = new.current(&target.read())?;
        Ok(Self {
            target,
            old,
            new,
            issued_at: Instant::now(),
        })
    }

    /// Override the construction timestamp
    pub fn issued_at(mut self, at: Instant) -> Self {
        self.issued_at = at;
        self
    }

    pub fn old_value(&self) -> &P {
        &self.old
    }

    pub fn new_value(&self) -> &P {
        &self.new
    }

    fn apply(&self, value: &P) {
        if !value.apply(&mut self.target.write()) {
            log::warn!("Set {}: control no longer exists", value.label());
        }
    }
}

impl<T, P: PropertyField<T>> Command for SetProperty<T, P> {
    fn execute(&mut self) {
        self.apply(&self.new);
    }

    fn undo(&mut self) {
        self.apply(&self.old);
    }

    fn description(&self) -> String {
        format!("Change {}", self.new.label())
    }

    fn can_merge_with(&self, other: &Self, policy: &MergePolicy) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
            && self.new.is_continuous()
            && self.new.same_control(&other.new)
            && policy.within_window(self.issued_at, other.issued_at)
    }

    fn merge(&mut self, other: Self) {
        self.new = other.new;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHANNEL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelProperty {
    Volume(f64),
    Pan(f64),
    Mute(bool),
    Solo(bool),
    Name(String),
    Color(Option<u32>),
    SendLevel { index: usize, level: f64 },
}

impl PropertyField<MixerChannel> for ChannelProperty {
    fn current(&self, ch: &MixerChannel) -> RfResult<Self> {
        Ok(match self {
            Self::Volume(_) => Self::Volume(ch.volume_db),
            Self::Pan(_) => Self::Pan(ch.pan),
            Self::Mute(_) => Self::Mute(ch.mute),
            Self::Solo(_) => Self::Solo(ch.solo),
            Self::Name(_) => Self::Name(ch.name.clone()),
            Self::Color(_) => Self::Color(ch.color),
            Self::SendLevel { index, .. } => {
                let send = ch.sends.get(*index).ok_or(RfError::SendNotFound(*index))?;
                Self::SendLevel {
                    index: *index,
                    level: send.level,
                }
            }
        })
    }

    fn apply(&self, ch: &mut MixerChannel) -> bool {
        match self {
            Self::Volume(db) => ch.volume_db = *db,
            Self::Pan(pan) => ch.pan = *pan,
            Self::Mute(mute) => ch.mute = *mute,
            Self::Solo(solo) => ch.solo = *solo,
            Self::Name(name) => ch.name.clone_from(name),
            Self::Color(color) => ch.color = *color,
            Self::SendLevel { index, level } => match ch.sends.get_mut(*index) {
                Some(send) => send.level = *level,
                None => return false,
            },
        }
        true
    }

    fn normalized(self) -> RfResult<Self> {
        Ok(match self {
            Self::Volume(db) => Self::Volume(clamp_volume_db(ensure_finite("volume", db)?)),
            Self::Pan(pan) => Self::Pan(clamp_pan(ensure_finite("pan", pan)?)),
            Self::SendLevel { index, level } => Self::SendLevel {
                index,
                level: clamp_send_level(ensure_finite("send level", level)?),
            },
            other => other,
        })
    }

    fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::Volume(_) | Self::Pan(_) | Self::SendLevel { .. }
        )
    }

    fn same_control(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SendLevel { index: a, .. }, Self::SendLevel { index: b, .. }) => a == b,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Volume(_) => "Volume",
            Self::Pan(_) => "Pan",
            Self::Mute(_) => "Mute",
            Self::Solo(_) => "Solo",
            Self::Name(_) => "Channel Name",
            Self::Color(_) => "Channel Color",
            Self::SendLevel { .. } => "Send Level",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum BusProperty {
    Volume(f64),
    Pan(f64),
    Mute(bool),
    Name(String),
    Color(Option<u32>),
}

impl PropertyField<BusChannel> for BusProperty {
    fn current(&self, bus: &BusChannel) -> RfResult<Self> {
        Ok(match self {
            Self::Volume(_) => Self::Volume(bus.volume_db),
            Self::Pan(_) => Self::Pan(bus.pan),
            Self::Mute(_) => Self::Mute(bus.mute),
            Self::Name(_) => Self::Name(bus.name.clone()),
            Self::Color(_) => Self::Color(bus.color),
        })
    }

    fn apply(&self, bus: &mut BusChannel) -> bool {
        match self {
            Self::Volume(db) => bus.volume_db = *db,
            Self::Pan(pan) => bus.pan = *pan,
            Self::Mute(mute) => bus.mute = *mute,
            Self::Name(name) => bus.name.clone_from(name),
            Self::Color(color) => bus.color = *color,
        }
        true
    }

    fn normalized(self) -> RfResult<Self> {
        Ok(match self {
            Self::Volume(db) => Self::Volume(clamp_volume_db(ensure_finite("volume", db)?)),
            Self::Pan(pan) => Self::Pan(clamp_pan(ensure_finite("pan", pan)?)),
            other => other,
        })
    }

    fn is_continuous(&self) -> bool {
        matches!(self, Self::Volume(_) | Self::Pan(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Volume(_) => "Bus Volume",
            Self::Pan(_) => "Bus Pan",
            Self::Mute(_) => "Bus Mute",
            Self::Name(_) => "Bus Name",
            Self::Color(_) => "Bus Color",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MASTER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum MasterProperty {
    Volume(f64),
    LimiterEnabled(bool),
    LimiterCeiling(f64),
    StereoWidth(f64),
    DitherEnabled(bool),
}

impl PropertyField<MasterChannel> for MasterProperty {
    fn current(&self, master: &MasterChannel) -> RfResult<Self> {
        Ok(match self {
            Self::Volume(_) => Self::Volume(master.volume_db),
            Self::LimiterEnabled(_) => Self::LimiterEnabled(master.limiter_enabled),
            Self::LimiterCeiling(_) => Self::LimiterCeiling(master.limiter_ceiling_db),
            Self::StereoWidth(_) => Self::StereoWidth(master.stereo_width),
            Self::DitherEnabled(_) => Self::DitherEnabled(master.dither_enabled),
        })
    }

    fn apply(&self, master: &mut MasterChannel) -> bool {
        match self {
            Self::Volume(db) => master.volume_db = *db,
            Self::LimiterEnabled(on) => master.limiter_enabled = *on,
            Self::LimiterCeiling(db) => master.limiter_ceiling_db = *db,
            Self::StereoWidth(width) => master.stereo_width = *width,
            Self::DitherEnabled(on) => master.dither_enabled = *on,
        }
        true
    }

    fn normalized(self) -> RfResult<Self> {
        Ok(match self {
            Self::Volume(db) => Self::Volume(clamp_volume_db(ensure_finite("volume", db)?)),
            Self::LimiterCeiling(db) => {
                Self::LimiterCeiling(clamp_ceiling_db(ensure_finite("ceiling", db)?))
            }
            Self::StereoWidth(width) => {
                Self::StereoWidth(clamp_stereo_width(ensure_finite("stereo width", width)?))
            }
            other => other,
        })
    }

    fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::Volume(_) | Self::LimiterCeiling(_) | Self::StereoWidth(_)
        )
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Volume(_) => "Master Volume",
            Self::LimiterEnabled(_) => "Limiter",
            Self::LimiterCeiling(_) => "Limiter Ceiling",
            Self::StereoWidth(_) => "Stereo Width",
            Self::DitherEnabled(_) => "Dither",
        }
    }
}

pub type SetChannelProperty = SetProperty<MixerChannel, ChannelProperty>;
pub type SetBusProperty = SetProperty<BusChannel, BusProperty>;
pub type SetMasterProperty = SetProperty<MasterChannel, MasterProperty>;
