use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw 3-byte MIDI control message `(status, data1, data2)`.
///
/// Carried verbatim from the MIDI source across the wire to the controller
/// host. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawControlMessage {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl RawControlMessage {
    pub const fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            status,
            data1,
            data2,
        }
    }

    /// Build a message from the bytes handed to us by a MIDI input callback.
    ///
    /// Only 3-byte messages are control messages; clock ticks, program changes
    /// and SysEx are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [status, data1, data2] => Some(Self::new(*status, *data1, *data2)),
            _ => None,
        }
    }

    pub fn as_array(&self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }

    /// MIDI channel (0-15) encoded in the low nibble of the status byte.
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }
}

impl From<[u8; 3]> for RawControlMessage {
    fn from(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }
}

impl fmt::Display for RawControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.status, self.data1, self.data2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_requires_three_bytes() {
        assert_eq!(
            RawControlMessage::from_bytes(&[144, 25, 127]),
            Some(RawControlMessage::new(144, 25, 127))
        );
        assert_eq!(RawControlMessage::from_bytes(&[0xF8]), None);
        assert_eq!(RawControlMessage::from_bytes(&[0xC0, 4]), None);
        assert_eq!(RawControlMessage::from_bytes(&[0xF0, 1, 2, 3, 0xF7]), None);
    }

    #[test]
    fn test_display_and_channel() {
        let msg = RawControlMessage::new(0xB3, 123, 0);
        assert_eq!(msg.to_string(), "[179, 123, 0]");
        assert_eq!(msg.channel(), 3);
    }
}
