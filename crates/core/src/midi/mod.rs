pub mod action;
pub mod input;
pub mod mapping;
pub mod message;

pub use action::Action;
pub use input::{MidiSource, MidiSourceError};
pub use mapping::{classify, ActionRule, ActionTable, LogicProMapping, StatusMatch};
pub use message::RawControlMessage;
