use super::polling::map_message;
use super::types::{TgMessage, TgResponse, TgUpdate};
use florence_core::message::ContentKind;

fn parse_message(json: &str) -> TgMessage {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_text_message_maps_to_text_kind() {
    let msg = parse_message(
        r#"{
            "message_id": 1,
            "from": {"id": 42, "first_name": "Ada", "last_name": "Lovelace"},
            "chat": {"id": 42, "type": "private"},
            "text": "What is photosynthesis?"
        }"#,
    );
    let incoming = map_message(msg).unwrap();
    assert_eq!(incoming.channel, "telegram");
    assert_eq!(incoming.sender_id, "42");
    assert_eq!(incoming.sender_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(incoming.content, ContentKind::Text);
    assert_eq!(incoming.text, "What is photosynthesis?");
    assert!(incoming.attachments.is_empty());
    assert_eq!(incoming.reply_target.as_deref(), Some("42"));
}

#[test]
fn test_photo_message_uses_largest_size() {
    let msg = parse_message(
        r#"{
            "message_id": 2,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42, "type": "private"},
            "photo": [
                {"file_id": "small", "width": 90, "height": 90},
                {"file_id": "large", "width": 800, "height": 800}
            ],
            "caption": "receipt"
        }"#,
    );
    let incoming = map_message(msg).unwrap();
    assert_eq!(incoming.content, ContentKind::Image);
    assert_eq!(incoming.text, "receipt");
    assert_eq!(incoming.attachments.len(), 1);
    assert_eq!(incoming.attachments[0].id, "large");
}

#[test]
fn test_document_message_carries_metadata() {
    let msg = parse_message(
        r#"{
            "message_id": 3,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42, "type": "private"},
            "document": {"file_id": "doc1", "file_name": "receipt.txt", "mime_type": "text/plain"}
        }"#,
    );
    let incoming = map_message(msg).unwrap();
    assert_eq!(incoming.content, ContentKind::Document);
    assert_eq!(incoming.attachments[0].id, "doc1");
    assert_eq!(incoming.attachments[0].filename.as_deref(), Some("receipt.txt"));
    assert_eq!(incoming.attachments[0].mime_type.as_deref(), Some("text/plain"));
}

#[test]
fn test_sticker_maps_to_other_kind() {
    let msg = parse_message(
        r#"{
            "message_id": 4,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42, "type": "private"},
            "sticker": {"file_id": "st1"}
        }"#,
    );
    let incoming = map_message(msg).unwrap();
    assert_eq!(incoming.content, ContentKind::Other);
    assert!(incoming.attachments.is_empty());
}

#[test]
fn test_group_messages_are_dropped() {
    let msg = parse_message(
        r#"{
            "message_id": 5,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": -100, "type": "supergroup"},
            "text": "hi all"
        }"#,
    );
    assert!(map_message(msg).is_none());
}

#[test]
fn test_service_messages_are_dropped() {
    let msg = parse_message(
        r#"{
            "message_id": 6,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42, "type": "private"}
        }"#,
    );
    assert!(map_message(msg).is_none());
}

#[test]
fn test_update_envelope_parses() {
    let json = r#"{
        "ok": true,
        "result": [
            {"update_id": 7, "message": {"message_id": 1, "chat": {"id": 1, "type": "private"}, "text": "hi"}}
        ]
    }"#;
    let body: TgResponse<Vec<TgUpdate>> = serde_json::from_str(json).unwrap();
    assert!(body.ok);
    assert_eq!(body.result.unwrap()[0].update_id, 7);
}
