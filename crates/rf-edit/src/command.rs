//! Closed command family recorded by [`UndoManager`](crate::UndoManager)
//!
//! Every concrete command converts into [`EditCommand`] through `From`, so
//! callers pass them straight to `record`. Merging is only ever attempted
//! between two commands of the same concrete kind.

use crate::commands::*;
use crate::undo::{Command, CommandGroup, MergePolicy};

macro_rules! command_family {
    ($(#[$meta:meta])* $family:ident { $($variant:ident($ty:ty)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $family {
            $($variant($ty)),+
        }

        impl Command for $family {
            fn execute(&mut self) {
                match self {
                    $(Self::$variant(cmd) => cmd.execute()),+
                }
            }

            fn undo(&mut self) {
                match self {
                    $(Self::$variant(cmd) => cmd.undo()),+
                }
            }

            fn description(&self) -> String {
                match self {
                    $(Self::$variant(cmd) => cmd.description()),+
                }
            }

            fn can_merge_with(&self, other: &Self, policy: &MergePolicy) -> bool {
                match (self, other) {
                    $((Self::$variant(a), Self::$variant(b)) => a.can_merge_with(b, policy),)+
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }

            fn merge(&mut self, other: Self) {
                match (self, other) {
                    $((Self::$variant(a), Self::$variant(b)) => a.merge(b),)+
                    #[allow(unreachable_patterns)]
                    (this, other) => log::warn!(
                        "Refusing to merge '{}' into '{}'",
                        other.description(),
                        this.description()
                    ),
                }
            }
        }

        $(
            impl From<$ty> for $family {
                fn from(cmd: $ty) -> Self {
                    Self::$variant(cmd)
                }
            }

            impl From<$ty> for EditCommand {
                fn from(cmd: $ty) -> Self {
                    EditCommand::from($family::$variant(cmd))
                }
            }
        )+
    };
}

command_family! {
    /// Automation lane edits
    CurveCommand {
        AddPoint(AddPoint),
        DeletePoints(DeletePoints),
        MovePoint(MovePoint),
        SetCurveType(SetCurveType),
        ClearPoints(ClearPoints),
        CopyPoints(CopyPoints),
        PastePoints(PastePoints),
        ScalePoints(ScalePoints),
        ShiftPoints(ShiftPoints),
        SimplifyCurve(SimplifyCurve),
    }
}

command_family! {
    /// Piano roll edits
    NoteCommand {
        AddNotes(AddNotes),
        DeleteNotes(DeleteNotes),
        MoveNotes(MoveNotes),
        ResizeNotes(ResizeNotes),
        SetNoteVelocity(SetNoteVelocity),
    }
}

command_family! {
    /// Mixer strip edits
    MixerCommand {
        Channel(SetChannelProperty),
        Bus(SetBusProperty),
        Master(SetMasterProperty),
    }
}

command_family! {
    /// Arranger track edits
    SectionCommand {
        AddSection(AddSection),
        DeleteSection(DeleteSection),
        MoveSection(MoveSection),
        SetSectionProperty(SetSectionProperty),
    }
}

/// Any recordable edit
#[derive(Debug)]
pub enum EditCommand {
    Curve(CurveCommand),
    Note(NoteCommand),
    Mixer(MixerCommand),
    Section(SectionCommand),
    Group(CommandGroup),
}

impl Command for EditCommand {
    fn execute(&mut self) {
        match self {
            Self::Curve(cmd) => cmd.execute(),
            Self::Note(cmd) => cmd.execute(),
            Self::Mixer(cmd) => cmd.execute(),
            Self::Section(cmd) => cmd.execute(),
            Self::Group(cmd) => cmd.execute(),
        }
    }

    fn undo(&mut self) {
        match self {
            Self::Curve(cmd) => cmd.undo(),
            Self::Note(cmd) => cmd.undo(),
            Self::Mixer(cmd) => cmd.undo(),
            Self::Section(cmd) => cmd.undo(),
            Self::Group(cmd) => cmd.undo(),
        }
    }

    fn description(&self) -> String {
        match self {
            Self::Curve(cmd) => cmd.description(),
            Self::Note(cmd) => cmd.description(),
            Self::Mixer(cmd) => cmd.description(),
            Self::Section(cmd) => cmd.description(),
            Self::Group(cmd) => cmd.description(),
        }
    }

    fn can_merge_with(&self, other: &Self, policy: &MergePolicy) -> bool {
        match (self, other) {
            (Self::Curve(a), Self::Curve(b)) => a.can_merge_with(b, policy),
            (Self::Note(a), Self::Note(b)) => a.can_merge_with(b, policy),
            (Self::Mixer(a), Self::Mixer(b)) => a.can_merge_with(b, policy),
            (Self::Section(a), Self::Section(b)) => a.can_merge_with(b, policy),
            _ => false,
        }
    }

    fn merge(&mut self, other: Self) {
        match (self, other) {
            (Self::Curve(a), Self::Curve(b)) => a.merge(b),
            (Self::Note(a), Self::Note(b)) => a.merge(b),
            (Self::Mixer(a), Self::Mixer(b)) => a.merge(b),
            (Self::Section(a), Self::Section(b)) => a.merge(b),
            (this, other) => log::warn!(
                "Refusing to merge '{}' into '{}'",
                other.description(),
                this.description()
            ),
        }
    }
}

impl From<CurveCommand> for EditCommand {
    fn from(cmd: CurveCommand) -> Self {
        Self::Curve(cmd)
    }
}

impl From<NoteCommand> for EditCommand {
    fn from(cmd: NoteCommand) -> Self {
        Self::Note(cmd)
    }
}

impl From<MixerCommand> for EditCommand {
    fn from(cmd: MixerCommand) -> Self {
        Self::Mixer(cmd)
    }
}

impl From<SectionCommand> for EditCommand {
    fn from(cmd: SectionCommand) -> Self {
        Self::Section(cmd)
    }
}

impl From<CommandGroup> for EditCommand {
    fn from(group: CommandGroup) -> Self {
        Self::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_core::{AutomationLane, AutomationPoint, MixerChannel};

    #[test]
    fn test_conversions_pick_family() {
        let lane = shared(AutomationLane::default());
        let cmd: EditCommand = AddPoint::new(lane, AutomationPoint::new(0.0, 0.5))
            .unwrap()
            .into();
        assert!(matches!(cmd, EditCommand::Curve(CurveCommand::AddPoint(_))));

        let channel = shared(MixerChannel::new("Vox"));
        let cmd: EditCommand = SetChannelProperty::new(channel, ChannelProperty::Mute(true))
            .unwrap()
            .into();
        assert!(matches!(cmd, EditCommand::Mixer(MixerCommand::Channel(_))));
    }

    #[test]
    fn test_different_kinds_never_merge() {
        let lane = shared(AutomationLane::default());
        let id = lane.write().add_point(AutomationPoint::new(0.0, 0.5));

        let moved: EditCommand = MovePoint::new(lane.clone(), id, 0.0, 0.6).unwrap().into();
        let retyped: EditCommand =
            SetCurveType::new(lane.clone(), id, rf_core::CurveType::Step).unwrap().into();
        assert!(!moved.can_merge_with(&retyped, &MergePolicy::default()));

        let channel = shared(MixerChannel::new("Vox"));
        let muted: EditCommand = SetChannelProperty::new(channel, ChannelProperty::Mute(true))
            .unwrap()
            .into();
        assert!(!moved.can_merge_with(&muted, &MergePolicy::default()));
    }
}
