//! Undo/Redo system using command pattern

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::command::EditCommand;
use crate::config::{DEFAULT_MAX_UNDO_HISTORY, DEFAULT_MERGE_WINDOW_MS, HistoryConfig};

/// Reversible edit
///
/// `execute(); undo()` must leave the target exactly as it was before
/// `execute()`. Targets that vanished out of band are skipped, never
/// reported: once constructed, a command always runs.
pub trait Command {
    /// Apply the forward mutation
    fn execute(&mut self);

    /// Apply the exact inverse of the last `execute`
    fn undo(&mut self);

    /// Label for menus and history lists
    fn description(&self) -> String;

    /// Whether `other`, recorded right after `self`, can be folded into it
    fn can_merge_with(&self, _other: &Self, _policy: &MergePolicy) -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Fold `other` into `self`, keeping this command's pre-state and the
    /// other's post-state. Only called after `can_merge_with` returned true.
    fn merge(&mut self, _other: Self)
    where
        Self: Sized,
    {
    }
}

/// Parameters for recency-based coalescing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// Continuous-control edits closer than this to the first edit of a
    /// gesture collapse into one undo step
    pub window: Duration,
}

impl MergePolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Whether `next` falls inside the window opened at `first`
    pub fn within_window(&self, first: Instant, next: Instant) -> bool {
        next.saturating_duration_since(first) <= self.window
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MERGE_WINDOW_MS))
    }
}

/// Undo/Redo manager
pub struct UndoManager {
    undo_stack: VecDeque<EditCommand>,
    redo_stack: Vec<EditCommand>,
    max_history: usize,
    policy: MergePolicy,
    group_depth: usize,
    group_commands: Vec<EditCommand>,
}

impl UndoManager {
    pub fn new(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_history.min(1024)),
            redo_stack: Vec::new(),
            max_history,
            policy: MergePolicy::default(),
            group_depth: 0,
            group_commands: Vec::new(),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.max_undo_history).with_policy(config.merge_policy())
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Execute a command and add it to the undo stack
    ///
    /// The command runs against live state first; it is then either folded
    /// into the top of the stack or pushed. Either way the redo stack is
    /// cleared.
    pub fn record(&mut self, command: impl Into<EditCommand>) {
        let mut command = command.into();
        command.execute();

        if self.group_depth > 0 {
            self.group_commands.push(command);
        } else {
            self.push_command(command);
        }

        self.redo_stack.clear();
    }

    fn push_command(&mut self, command: EditCommand) {
        // Try to merge with previous command
        if let Some(last) = self.undo_stack.back_mut()
            && last.can_merge_with(&command, &self.policy)
        {
            log::debug!("Merged '{}' into '{}'", command.description(), last.description());
            last.merge(command);
            return;
        }

        // Enforce max history
        while self.undo_stack.len() >= self.max_history {
            if let Some(dropped) = self.undo_stack.pop_front() {
                log::trace!("History full, dropping '{}'", dropped.description());
            }
        }

        log::debug!("Recorded '{}'", command.description());
        self.undo_stack.push_back(command);
    }

    /// Undo the last command
    pub fn undo(&mut self) -> bool {
        if let Some(mut command) = self.undo_stack.pop_back() {
            log::debug!("Undo '{}'", command.description());
            command.undo();
            self.redo_stack.push(command);
            true
        } else {
            false
        }
    }

    /// Redo the last undone command
    pub fn redo(&mut self) -> bool {
        if let Some(mut command) = self.redo_stack.pop() {
            log::debug!("Redo '{}'", command.description());
            command.execute();
            self.undo_stack.push_back(command);
            true
        } else {
            false
        }
    }

    /// Start a command group (grouped commands are undone/redone together)
    pub fn begin_group(&mut self) {
        self.group_depth += 1;
    }

    /// End a command group
    pub fn end_group(&mut self, name: &str) {
        if self.group_depth > 0 {
            self.group_depth -= 1;

            if self.group_depth == 0 && !self.group_commands.is_empty() {
                let commands = std::mem::take(&mut self.group_commands);
                let group = CommandGroup::new(name.to_string(), commands);
                self.push_command(EditCommand::Group(group));
            }
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the description of the next undo command
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Get the description of the next redo command
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.group_commands.clear();
        self.group_depth = 0;
    }

    /// Get number of undo steps
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get number of redo steps
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_HISTORY)
    }
}

/// Group of commands that are undone/redone together
#[derive(Debug)]
pub struct CommandGroup {
    name: String,
    commands: Vec<EditCommand>,
}

impl CommandGroup {
    pub fn new(name: String, commands: Vec<EditCommand>) -> Self {
        Self { name, commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for CommandGroup {
    fn execute(&mut self) {
        for cmd in &mut self.commands {
            cmd.execute();
        }
    }

    fn undo(&mut self) {
        for cmd in self.commands.iter_mut().rev() {
            cmd.undo();
        }
    }

    fn description(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{
        ChannelProperty, MasterProperty, SetChannelProperty, SetMasterProperty, shared,
    };
    use rf_core::{MasterChannel, MixerChannel};

    #[test]
    fn test_undo_redo() {
        let mut manager = UndoManager::new(100);
        let master = shared(MasterChannel::default());

        manager.record(
            SetMasterProperty::new(master.clone(), MasterProperty::LimiterEnabled(false)).unwrap(),
        );
        assert!(!master.read().limiter_enabled);

        manager.record(
            SetMasterProperty::new(master.clone(), MasterProperty::DitherEnabled(true)).unwrap(),
        );
        assert!(master.read().dither_enabled);

        assert!(manager.undo());
        assert!(!master.read().dither_enabled);
        assert!(!master.read().limiter_enabled);

        assert!(manager.redo());
        assert!(master.read().dither_enabled);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut manager = UndoManager::default();
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
        assert!(!manager.undo());
        assert!(!manager.redo());
        assert_eq!(manager.undo_description(), None);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut manager = UndoManager::new(100);
        let channel = shared(MixerChannel::new("Lead"));

        manager.record(SetChannelProperty::new(channel.clone(), ChannelProperty::Mute(true)).unwrap());
        manager.undo();
        assert!(manager.can_redo());

        manager.record(SetChannelProperty::new(channel.clone(), ChannelProperty::Solo(true)).unwrap());
        assert!(!manager.can_redo());
        assert_eq!(manager.undo_count(), 1);
    }

    #[test]
    fn test_max_history_drops_oldest() {
        let mut manager = UndoManager::new(2);
        let channel = shared(MixerChannel::new("Bass"));

        for name in ["A", "B", "C"] {
            manager.record(
                SetChannelProperty::new(channel.clone(), ChannelProperty::Name(name.to_string()))
                    .unwrap(),
            );
        }
        assert_eq!(manager.undo_count(), 2);

        manager.undo();
        manager.undo();
        assert_eq!(channel.read().name, "A");
        assert!(!manager.undo());
    }

    #[test]
    fn test_group() {
        let mut manager = UndoManager::new(100);
        let channel = shared(MixerChannel::new("Keys"));

        manager.begin_group();
        manager.record(SetChannelProperty::new(channel.clone(), ChannelProperty::Mute(true)).unwrap());
        manager.record(SetChannelProperty::new(channel.clone(), ChannelProperty::Solo(true)).unwrap());
        manager.end_group("Mute and Solo");

        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.undo_description().as_deref(), Some("Mute and Solo"));

        assert!(manager.undo());
        let c = channel.read().clone();
        assert!(!c.mute && !c.solo);

        assert!(manager.redo());
        let c = channel.read().clone();
        assert!(c.mute && c.solo);
    }

    #[test]
    fn test_nested_groups_flatten() {
        let mut manager = UndoManager::new(100);
        let channel = shared(MixerChannel::new("Pad"));

        manager.begin_group();
        manager.record(SetChannelProperty::new(channel.clone(), ChannelProperty::Mute(true)).unwrap());
        manager.begin_group();
        manager.record(SetChannelProperty::new(channel.clone(), ChannelProperty::Solo(true)).unwrap());
        manager.end_group("Inner");
        assert_eq!(manager.undo_count(), 0);
        manager.end_group("Outer");

        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.undo_description().as_deref(), Some("Outer"));
    }

    #[test]
    fn test_record_merges_only_into_mergeable_top() {
        let mut manager = UndoManager::new(100);
        let channel = shared(MixerChannel::new("Strings"));
        let start = channel.read().volume_db;

        for db in [-3.0, -6.0, -9.0] {
            manager.record(
                SetChannelProperty::new(channel.clone(), ChannelProperty::Volume(db)).unwrap(),
            );
        }
        assert_eq!(manager.undo_count(), 1);

        manager.record(SetChannelProperty::new(channel.clone(), ChannelProperty::Mute(true)).unwrap());
        assert_eq!(manager.undo_count(), 2);

        manager.undo();
        manager.undo();
        assert_eq!(channel.read().volume_db, start);
    }

    #[test]
    fn test_merge_policy_window() {
        let policy = MergePolicy::new(Duration::from_millis(500));
        let start = Instant::now();
        assert!(policy.within_window(start, start + Duration::from_millis(499)));
        assert!(!policy.within_window(start, start + Duration::from_millis(501)));
    }
}
