//! Trigger-to-message mapping

use std::collections::HashMap;

use crate::hub::Msg;

/// Client code for "skip to next track"
pub const NEXT_TRACK: &str = "19";

/// Client code for "skip to previous track"
pub const PREV_TRACK: &str = "20";

/// Client code for "toggle play/pause"
///
/// Play and pause keys both map to this one code; the client keeps the
/// actual playback state.
pub const PLAY_PAUSE: &str = "16";

/// Maps named triggers to the message broadcast when they fire
///
/// The mapping is configuration, not protocol: the map never interprets
/// either side, it only looks names up.
#[derive(Debug, Clone, Default)]
pub struct TriggerMap {
    bindings: HashMap<String, Msg>,
}

impl TriggerMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a trigger name to a message, replacing any previous binding
    pub fn bind(mut self, trigger: impl Into<String>, message: impl Into<Msg>) -> Self {
        self.bindings.insert(trigger.into(), message.into());
        self
    }

    /// Look up the message for a trigger
    pub fn resolve(&self, trigger: &str) -> Option<&str> {
        self.bindings.get(trigger).map(String::as_str)
    }

    /// Number of bound triggers
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no triggers are bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
