#![allow(clippy::unwrap_used, clippy::expect_used)]

use ragchat_core::*;

// ---------------------------------------------------------------------------
// 1. Message serialization roundtrip
// ---------------------------------------------------------------------------

#[test]
fn message_serialization_roundtrip() {
    let msg = Message::user("Hello, Ragchat!");

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: Message = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized.id, msg.id);
    assert_eq!(deserialized.role, Role::User);
    assert_eq!(deserialized.content, "Hello, Ragchat!");
    assert_eq!(deserialized.timestamp, msg.timestamp);
}

// ---------------------------------------------------------------------------
// 2. Error messages carry the offending value
// ---------------------------------------------------------------------------

#[test]
fn error_messages_carry_details() {
    let err = RagError::source_load("docs/missing.txt", "No such file or directory");
    assert_eq!(
        err.to_string(),
        "Failed to load source 'docs/missing.txt': No such file or directory"
    );

    let err = RagError::Cancelled {
        stage: "rephrase".into(),
    };
    assert_eq!(err.to_string(), "Cancelled during rephrase");
}

#[test]
fn io_error_converts() {
    fn open() -> RagResult<()> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
        Ok(())
    }
    assert!(matches!(open().unwrap_err(), RagError::Io(_)));
}

// ---------------------------------------------------------------------------
// 3. Cancellation token is shared across clones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_is_visible_through_clones() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
    // Resolves immediately once cancelled.
    clone.cancelled().await;
}
