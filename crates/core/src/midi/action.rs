use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic meaning of a control message, independent of the device that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    RecordStart,
    RecordStop,
    Play,
    Stop,
    TrackLeft,
    TrackRight,
    SnareOn,
    SnareOff,
    /// Panic button. Turns everything off and shuts the process down.
    AllNotesOff,
    /// Put every device in a known state. Issued once at startup.
    ResetAll,
    Unknown,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::RecordStart,
        Action::RecordStop,
        Action::Play,
        Action::Stop,
        Action::TrackLeft,
        Action::TrackRight,
        Action::SnareOn,
        Action::SnareOff,
        Action::AllNotesOff,
        Action::ResetAll,
        Action::Unknown,
    ];

    /// Whether dispatching this action should stop the process.
    pub fn requests_shutdown(&self) -> bool {
        matches!(self, Action::AllNotesOff)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::RecordStart => "record_start",
            Action::RecordStop => "record_stop",
            Action::Play => "play",
            Action::Stop => "stop",
            Action::TrackLeft => "track_left",
            Action::TrackRight => "track_right",
            Action::SnareOn => "snare_on",
            Action::SnareOff => "snare_off",
            Action::AllNotesOff => "all_notes_off",
            Action::ResetAll => "reset_all",
            Action::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
