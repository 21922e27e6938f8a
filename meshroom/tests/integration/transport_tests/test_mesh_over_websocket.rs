use crate::integration::{create_test_relay, init_tracing};
use crate::utils::MESH_TIMEOUT_MS;
use anyhow::{Context, Result};
use meshroom_client::testing::MockMediaStack;
use meshroom_client::{MeshConfig, MeshHandle, NegotiationState, RoomView};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn spawn_relay() -> Result<SocketAddr> {
    let app = meshroom_server::router(create_test_relay(), None)?;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(addr)
}

async fn wait_for(
    handle: &MeshHandle,
    predicate: impl FnMut(&RoomView) -> bool,
) -> Result<RoomView> {
    let view = tokio::time::timeout(
        Duration::from_millis(MESH_TIMEOUT_MS),
        handle.wait_for(predicate),
    )
    .await
    .context("Timeout waiting for room view")??;
    Ok(view)
}

#[tokio::test]
async fn test_mesh_over_websocket() -> Result<()> {
    init_tracing();
    let addr = spawn_relay().await?;
    let url = format!("ws://{}/ws", addr);

    let a = MeshHandle::connect(
        &url,
        MeshConfig::default().with_display_name("alice"),
        Arc::new(MockMediaStack::new()),
    )
    .await?;
    let b = MeshHandle::connect(
        &url,
        MeshConfig::default().with_display_name("bob"),
        Arc::new(MockMediaStack::new()),
    )
    .await?;

    let a_id = wait_for(&a, |view| view.local_id.is_some())
        .await?
        .local_id
        .unwrap();
    let b_id = wait_for(&b, |view| view.local_id.is_some())
        .await?
        .local_id
        .unwrap();

    a.join_room("standup").await?;
    b.join_room("standup").await?;

    wait_for(&a, |view| {
        view.peers.get(&b_id).map(|status| status.state) == Some(NegotiationState::Connected)
    })
    .await?;
    wait_for(&b, |view| {
        view.peers.get(&a_id).map(|status| status.state) == Some(NegotiationState::Connected)
    })
    .await?;

    b.send_chat("over the wire").await?;
    let view_a = wait_for(&a, |view| !view.chat.is_empty()).await?;
    assert_eq!(view_a.chat[0].author, "bob");

    drop(b);
    wait_for(&a, |view| view.peers.is_empty()).await?;
    Ok(())
}
