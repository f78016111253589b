//! OSC encoding of control messages.
//!
//! One OSC message per datagram: the address is the channel (e.g. `/midi`) and
//! the arguments are exactly three integers `status, data1, data2`.

use rosc::{OscMessage, OscPacket, OscType};

use super::TransportError;
use crate::midi::RawControlMessage;

pub fn encode(channel: &str, msg: &RawControlMessage) -> Result<Vec<u8>, TransportError> {
    let packet = OscPacket::Message(OscMessage {
        addr: channel.to_string(),
        args: msg
            .as_array()
            .iter()
            .map(|byte| OscType::Int(*byte as i32))
            .collect(),
    });
    rosc::encoder::encode(&packet).map_err(|e| TransportError::Encode(format!("{:?}", e)))
}

/// Decode a datagram into its OSC messages, unpacking bundles.
pub fn decode(datagram: &[u8]) -> Result<Vec<OscMessage>, TransportError> {
    let (_, packet) =
        rosc::decoder::decode_udp(datagram).map_err(|e| TransportError::Decode(format!("{:?}", e)))?;

    let mut messages = Vec::new();
    flatten(packet, &mut messages);
    Ok(messages)
}

fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(msg),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

/// Extract the control message carried by an OSC message.
///
/// Any numeric argument type is accepted as long as it holds a whole number
/// that fits in a byte.
pub fn payload(msg: &OscMessage) -> Result<RawControlMessage, TransportError> {
    if msg.args.len() != 3 {
        return Err(TransportError::Arity {
            addr: msg.addr.clone(),
            count: msg.args.len(),
        });
    }

    let mut bytes = [0u8; 3];
    for (index, arg) in msg.args.iter().enumerate() {
        bytes[index] = byte_arg(&msg.addr, index, arg)?;
    }
    Ok(RawControlMessage::from(bytes))
}

fn byte_arg(addr: &str, index: usize, arg: &OscType) -> Result<u8, TransportError> {
    let value = match arg {
        OscType::Int(v) => *v as i64,
        OscType::Long(v) => *v,
        OscType::Float(v) if v.is_finite() && v.fract() == 0.0 => *v as i64,
        OscType::Double(v) if v.is_finite() && v.fract() == 0.0 => *v as i64,
        other => {
            return Err(TransportError::ArgumentType {
                addr: addr.to_string(),
                index,
                found: format!("{:?}", other),
            })
        }
    };

    u8::try_from(value).map_err(|_| TransportError::OutOfRange {
        addr: addr.to_string(),
        index,
        value,
    })
}
