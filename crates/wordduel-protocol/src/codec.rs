//! JSON encoding of outbound messages and lenient decoding of inbound ones.
//!
//! Inbound frames are decoded in two steps: first into a loose [`Frame`]
//! (`type` plus an untyped `payload`), then the payload is parsed into the
//! shape that `type` requires. Browser clients attach extra fields such as
//! `username` and often omit `payload` entirely on `create-room`; a derived
//! adjacently-tagged `Deserialize` would reject some of those frames.

use serde::Deserialize;

use crate::{ClientMessage, ProtocolError, RoomId, ServerMessage};

/// The outer shape shared by every inbound frame.
#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRef {
    room_id: RoomId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuessPayload {
    room_id: RoomId,
    #[serde(default)]
    guess: serde_json::Value,
}

/// Decodes one inbound frame.
///
/// # Errors
/// - [`ProtocolError::Decode`]: not JSON, no `type`, or a payload missing
///   fields its type needs.
/// - [`ProtocolError::UnknownType`]: well-formed but unrecognized `type`.
pub fn decode_client(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let frame: Frame = serde_json::from_slice(data).map_err(ProtocolError::Decode)?;

    let msg = match frame.kind.as_str() {
        "create-room" => ClientMessage::CreateRoom,
        "join-room" => {
            let RoomRef { room_id } = parse_payload(frame.payload)?;
            ClientMessage::JoinRoom { room_id }
        }
        "send-guess" => {
            let GuessPayload { room_id, guess } = parse_payload(frame.payload)?;
            ClientMessage::SendGuess { room_id, guess }
        }
        "player-finished" => {
            let RoomRef { room_id } = parse_payload(frame.payload)?;
            ClientMessage::PlayerFinished { room_id }
        }
        _ => return Err(ProtocolError::UnknownType(frame.kind)),
    };
    Ok(msg)
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    payload: serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(ProtocolError::Decode)
}

/// Encodes an outbound message as a JSON text frame.
pub fn encode_server(msg: &ServerMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_create_room_without_payload() {
        let msg = decode_client(br#"{"type":"create-room","username":"ana"}"#).unwrap();
        assert_eq!(msg, ClientMessage::CreateRoom);
    }

    #[test]
    fn test_decode_create_room_with_empty_payload() {
        let msg = decode_client(br#"{"type":"create-room","payload":{}}"#).unwrap();
        assert_eq!(msg, ClientMessage::CreateRoom);
    }

    #[test]
    fn test_decode_join_room_ignores_extra_fields() {
        let msg = decode_client(
            br#"{"type":"join-room","payload":{"roomId":"a1b2c3"},"username":"bo"}"#,
        )
        .unwrap();
        assert_eq!(msg, ClientMessage::JoinRoom { room_id: RoomId::new("a1b2c3") });
    }

    #[test]
    fn test_decode_send_guess_keeps_guess_verbatim() {
        let msg = decode_client(
            br#"{"type":"send-guess","payload":{"roomId":"a1b2c3","guess":{"word":"STONE","row":2}}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SendGuess {
                room_id: RoomId::new("a1b2c3"),
                guess: json!({"word": "STONE", "row": 2}),
            }
        );
    }

    #[test]
    fn test_decode_player_finished() {
        let msg =
            decode_client(br#"{"type":"player-finished","payload":{"roomId":"ffff00"}}"#).unwrap();
        assert_eq!(msg, ClientMessage::PlayerFinished { room_id: RoomId::new("ffff00") });
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_client(b"not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_missing_room_id() {
        let err = decode_client(br#"{"type":"join-room"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let err = decode_client(br#"{"type":"new-player","payload":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(t) if t == "new-player"));
    }

    #[test]
    fn test_encode_server_is_text_json() {
        let text = encode_server(&ServerMessage::RoomJoined {
            room_id: RoomId::new("a1b2c3"),
            word: "CRANE".into(),
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"type": "room-joined", "payload": {"roomId": "a1b2c3", "word": "CRANE"}})
        );
    }
}
