//! Newline-delimited JSON framing
//!
//! Outbound events are encoded exactly once into a newline-terminated
//! [`Bytes`] frame. `Bytes` is reference counted, so broadcasting a frame to
//! a room clones only the handle; every member shares the same allocation.

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::message::ServerEvent;

/// Encode an event into a single wire frame (JSON line)
pub fn encode_event(event: &ServerEvent) -> Result<Bytes> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::Ack;

    #[test]
    fn test_frame_is_newline_terminated() {
        let frame = encode_event(&ServerEvent::Ack(Ack::ok_silent())).unwrap();
        assert_eq!(frame.last(), Some(&b'\n'));

        // Exactly one line per frame
        assert_eq!(frame.iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn test_frame_round_trips() {
        let frame = encode_event(&ServerEvent::Error {
            message: "nope".into(),
        })
        .unwrap();

        let parsed: ServerEvent = serde_json::from_slice(&frame).unwrap();
        match parsed {
            ServerEvent::Error { message } => assert_eq!(message, "nope"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
