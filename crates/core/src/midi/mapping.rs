//! Control message → [`Action`] decision table.
//!
//! The default table matches the Logic Pro X "Recording Light" control
//! surface plus a Roland TD-07 snare pad:
//!
//! ```text
//! data1 25  / data2 127      Record start
//! data1 25  / data2 0        Record stop
//! data1 106 / data2 127      Play
//! data1 105 / data2 127      Stop
//! data1 109 / data2 127      Track left
//! data1 110 / data2 127      Track right
//! CC 123 / 0 on any channel  All notes off (panic)
//! note 38, status 153 / 137  Snare on / off (channel 10)
//! ```
//!
//! Other controllers are supported by loading a different table from the
//! configuration file, never by editing the dispatcher.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::message::RawControlMessage;

/// Logic Pro X control surface and TD-07 constants.
pub struct LogicProMapping;

impl LogicProMapping {
    // data1 values
    pub const RECORD: u8 = 25;
    pub const STOP: u8 = 105;
    pub const PLAY: u8 = 106;
    pub const TRACK_LEFT: u8 = 109;
    pub const TRACK_RIGHT: u8 = 110;
    pub const ALL_NOTES_OFF: u8 = 123;
    pub const SNARE: u8 = 38;

    // data2 values
    pub const PRESSED: u8 = 127;
    pub const RELEASED: u8 = 0;

    // Control change on channels 1-16
    pub const CONTROL_CHANGE_FIRST: u8 = 0xB0;
    pub const CONTROL_CHANGE_LAST: u8 = 0xBF;

    // Note on / note off on channel 10 (drums)
    pub const DRUM_NOTE_ON: u8 = 0x99;
    pub const DRUM_NOTE_OFF: u8 = 0x89;

    pub fn table() -> ActionTable {
        ActionTable::new(vec![
            ActionRule::new(Self::RECORD, Some(Self::PRESSED), Action::RecordStart),
            ActionRule::new(Self::RECORD, Some(Self::RELEASED), Action::RecordStop),
            ActionRule::new(Self::PLAY, Some(Self::PRESSED), Action::Play),
            ActionRule::new(Self::STOP, Some(Self::PRESSED), Action::Stop),
            ActionRule::new(Self::TRACK_LEFT, Some(Self::PRESSED), Action::TrackLeft),
            ActionRule::new(Self::TRACK_RIGHT, Some(Self::PRESSED), Action::TrackRight),
            ActionRule::new(Self::ALL_NOTES_OFF, Some(Self::RELEASED), Action::AllNotesOff)
                .with_status(StatusMatch::Range {
                    min: Self::CONTROL_CHANGE_FIRST,
                    max: Self::CONTROL_CHANGE_LAST,
                }),
            ActionRule::new(Self::SNARE, None, Action::SnareOn)
                .with_status(StatusMatch::Exact(Self::DRUM_NOTE_ON)),
            ActionRule::new(Self::SNARE, None, Action::SnareOff)
                .with_status(StatusMatch::Exact(Self::DRUM_NOTE_OFF)),
        ])
    }
}

/// Which status bytes a rule accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMatch {
    #[default]
    Any,
    Exact(u8),
    /// Inclusive range.
    Range { min: u8, max: u8 },
}

impl StatusMatch {
    pub fn matches(&self, status: u8) -> bool {
        match *self {
            StatusMatch::Any => true,
            StatusMatch::Exact(expected) => status == expected,
            StatusMatch::Range { min, max } => (min..=max).contains(&status),
        }
    }
}

/// One row of the decision table. `data2: None` accepts any value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    #[serde(default)]
    pub status: StatusMatch,
    pub data1: u8,
    #[serde(default)]
    pub data2: Option<u8>,
    pub action: Action,
}

impl ActionRule {
    pub fn new(data1: u8, data2: Option<u8>, action: Action) -> Self {
        Self {
            status: StatusMatch::Any,
            data1,
            data2,
            action,
        }
    }

    pub fn with_status(mut self, status: StatusMatch) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, msg: &RawControlMessage) -> bool {
        self.data1 == msg.data1
            && self.data2.map_or(true, |data2| data2 == msg.data2)
            && self.status.matches(msg.status)
    }
}

/// Ordered decision table; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTable {
    pub rules: Vec<ActionRule>,
}

impl ActionTable {
    pub fn new(rules: Vec<ActionRule>) -> Self {
        Self { rules }
    }

    /// Classify a message. Pure: the same input always yields the same action,
    /// and anything unmatched is [`Action::Unknown`].
    pub fn classify(&self, msg: &RawControlMessage) -> Action {
        self.rules
            .iter()
            .find(|rule| rule.matches(msg))
            .map(|rule| rule.action)
            .unwrap_or(Action::Unknown)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(i, rule)| match rule.status {
                StatusMatch::Range { min, max } if min > max => Some(format!(
                    "rule {} ({}): status range {}..={} is empty",
                    i, rule.action, min, max
                )),
                _ => None,
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        LogicProMapping::table()
    }
}

/// Classify with the built-in table.
pub fn classify(msg: &RawControlMessage) -> Action {
    static DEFAULT_TABLE: OnceLock<ActionTable> = OnceLock::new();
    DEFAULT_TABLE.get_or_init(ActionTable::default).classify(msg)
}
