use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestPeer;
use anyhow::Result;
use std::time::Duration;

#[tokio::test]
async fn test_chat_reaches_room() -> Result<()> {
    init_tracing();
    let relay = create_test_relay();

    let a = TestPeer::connect(&relay, "alice").await?;
    let b = TestPeer::connect(&relay, "bob").await?;
    let outsider = TestPeer::connect(&relay, "mallory").await?;
    a.handle.join_room("standup").await?;
    b.handle.join_room("standup").await?;
    outsider.handle.join_room("elsewhere").await?;

    a.handle.send_chat("morning all").await?;

    let view_b = b.wait_for(|view| !view.chat.is_empty()).await?;
    assert_eq!(view_b.chat[0].author, "alice");
    assert_eq!(view_b.chat[0].text, "morning all");
    assert_eq!(view_b.chat[0].sender_id, Some(a.client_id));
    assert!(!view_b.chat[0].is_local);

    // The relay does not echo chat back to its author.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let view_a = a.handle.view();
    assert_eq!(view_a.chat.len(), 1);
    assert!(view_a.chat[0].is_local);
    assert!(outsider.handle.view().chat.is_empty());
    Ok(())
}
