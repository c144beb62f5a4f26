//! # Envelope
//!
//! ```text
//! ┌──────────┬──────────────────────────────┐
//! │ tag u16  │ payload (typed by the tag)   │
//! └──────────┴──────────────────────────────┘
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::WireMessage;
use crate::serialization::PacketReader;
use crate::tags::GameAction;

/// Tagged payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Raw tag; may be unknown to this build.
    pub tag: u16,
    /// Encoded record.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Wraps `message` under `action`.
    ///
    /// # Errors
    ///
    /// Any encode failure of `message`.
    pub fn new(action: GameAction, message: &impl WireMessage) -> ProtocolResult<Self> {
        Ok(Self {
            tag: action.tag(),
            payload: message.to_bytes()?,
        })
    }

    /// An envelope with no payload.
    #[must_use]
    pub const fn empty(action: GameAction) -> Self {
        Self {
            tag: action.tag(),
            payload: Vec::new(),
        }
    }

    /// The known action for this tag.
    #[must_use]
    pub fn action(&self) -> Option<GameAction> {
        GameAction::from_tag(self.tag)
    }

    /// Decodes the payload as `M`.
    ///
    /// # Errors
    ///
    /// Any decode failure, including trailing bytes.
    pub fn read<M: WireMessage>(&self) -> ProtocolResult<M> {
        M::from_bytes(&self.payload)
    }

    /// Tag followed by payload.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.payload.len());
        bytes.extend_from_slice(&self.tag.to_le_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Splits a frame into tag and payload. The tag is not checked.
    ///
    /// # Errors
    ///
    /// `Truncated` for a frame shorter than the tag.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let mut r = PacketReader::new(bytes);
        let tag = r.read_u16()?;
        let payload = bytes.get(2..).ok_or(ProtocolError::Truncated {
            needed: 2,
            remaining: bytes.len(),
        })?;
        Ok(Self {
            tag,
            payload: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MsgChat;

    #[test]
    fn test_frame_layout() {
        let env = Envelope::new(
            GameAction::ChatMessage,
            &MsgChat {
                player_id: 0,
                msg: "gl".into(),
            },
        )
        .unwrap();
        let frame = env.encode();
        assert_eq!(&frame[..2], &1090u16.to_le_bytes());

        let back = Envelope::decode(&frame).unwrap();
        assert_eq!(back.action(), Some(GameAction::ChatMessage));
        assert_eq!(back.read::<MsgChat>().unwrap().msg, "gl");
    }

    #[test]
    fn test_unknown_tag_survives_decode() {
        let frame = [0x39, 0x30, 1, 2, 3];
        let env = Envelope::decode(&frame).unwrap();
        assert_eq!(env.tag, 0x3039);
        assert_eq!(env.action(), None);
        assert_eq!(env.payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_short_frame() {
        assert!(matches!(
            Envelope::decode(&[7]),
            Err(ProtocolError::Truncated { .. })
        ));
    }
}
