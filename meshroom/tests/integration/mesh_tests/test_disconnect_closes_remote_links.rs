use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestPeer;
use anyhow::Result;
use meshroom_client::ClientError;

#[tokio::test]
async fn test_disconnect_closes_remote_links() -> Result<()> {
    init_tracing();
    let relay = create_test_relay();

    let a = TestPeer::connect(&relay, "alice").await?;
    let b = TestPeer::connect(&relay, "bob").await?;
    let c = TestPeer::connect(&relay, "carol").await?;
    for peer in [&a, &b, &c] {
        peer.handle.join_room("standup").await?;
        peer.wait_for(|view| view.room_id.is_some()).await?;
    }
    a.wait_connected_to(&[b.client_id, c.client_id]).await?;
    c.wait_connected_to(&[a.client_id, b.client_id]).await?;

    b.disconnect();

    let view_a = a.wait_connected_to(&[c.client_id]).await?;
    let view_c = c.wait_connected_to(&[a.client_id]).await?;
    assert!(!view_a.remote_streams.contains_key(&b.client_id));
    assert!(!view_c.remote_streams.contains_key(&b.client_id));

    let session = a.media.session_for(b.client_id).await.unwrap();
    assert!(session.state().await.closed);

    // The relay closed B's channel, so B's coordinator is gone too.
    let stopped = b.handle.wait_for(|_| false).await;
    assert!(matches!(stopped, Err(ClientError::CoordinatorStopped)));
    assert_eq!(relay.directory().members(&"standup".into()).len(), 2);
    Ok(())
}
