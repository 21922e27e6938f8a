use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use meshroom_client::{
    MeshConfig, MeshHandle, NegotiationState, RoomView, WebRtcMediaStack, DEFAULT_DISPLAY_NAME,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER: &str = "ws://127.0.0.1:8080/ws";

#[derive(Parser)]
#[command(name = "meshroom", about = "Sit in a full-mesh room from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room, report who comes and goes, and send stdin lines as chat.
    Join {
        #[arg(long, env = "MESHROOM_SERVER", default_value = DEFAULT_SERVER)]
        server: String,

        #[arg(short, long)]
        room: String,

        #[arg(short, long, default_value = DEFAULT_DISPLAY_NAME)]
        name: String,

        /// Drop peers that have not finished negotiating after this many seconds.
        #[arg(long)]
        negotiation_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Join {
            server,
            room,
            name,
            negotiation_timeout,
        } => {
            let mut config = MeshConfig::default().with_display_name(name);
            if let Some(secs) = negotiation_timeout {
                config = config.with_negotiation_timeout(Duration::from_secs(secs));
            }
            join(&server, &room, config).await
        }
    }
}

async fn join(server: &str, room: &str, config: MeshConfig) -> Result<()> {
    println!("{}", format!("🔌 Connecting to {}...", server).cyan());

    // No capture devices here: every link is receive-only.
    let handle = MeshHandle::connect(server, config, Arc::new(WebRtcMediaStack::receive_only()))
        .await
        .with_context(|| format!("Failed to connect to {}", server))?;
    handle
        .join_room(room)
        .await
        .with_context(|| format!("Failed to join '{}'", room))?;

    println!(
        "{}",
        format!("🚪 Joined '{}'. Type to chat, /quit to leave.", room)
            .green()
            .bold()
    );

    let mut views = handle.subscribe();
    let mut shown = RoomView::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    println!("{}", "⚠️  Lost the connection to the relay".red().bold());
                    return Ok(());
                }
                let view = views.borrow_and_update().clone();
                report_changes(&shown, &view);
                shown = view;
            }

            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim() == "/quit" => break,
                    Some(line) => {
                        if let Err(e) = handle.send_chat(line).await {
                            eprintln!("{} {}", "Could not send:".red(), e);
                        }
                    }
                    None => break,
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.leave_room().await.context("Failed to leave the room")?;
    println!("{}", "👋 Left the room".yellow());
    Ok(())
}

fn report_changes(before: &RoomView, after: &RoomView) {
    if before.local_id != after.local_id {
        if let Some(id) = after.local_id {
            println!("{} {}", "🆔 You are".dimmed(), id);
        }
    }

    if before.media_error != after.media_error {
        if let Some(error) = &after.media_error {
            println!("{}", format!("🎙️  No local media: {}", error).yellow());
        }
    }

    for (peer, status) in &after.peers {
        match before.peers.get(peer) {
            None => println!("{} {} ({:?})", "➕ Peer joined:".cyan(), peer, status.role),
            Some(previous)
                if previous.state != status.state
                    && status.state == NegotiationState::Connected =>
            {
                println!("{} {}", "✅ Connected to".green(), peer)
            }
            _ => {}
        }
    }
    for peer in before.peers.keys() {
        if !after.peers.contains_key(peer) {
            println!("{} {}", "➖ Peer left:".yellow(), peer);
        }
    }

    for (peer, stream) in &after.remote_streams {
        let before_tracks = before
            .remote_streams
            .get(peer)
            .map_or(0, |stream| stream.tracks.len());
        if stream.tracks.len() > before_tracks {
            println!(
                "{} {} track(s) from {}",
                "📺 Receiving".cyan(),
                stream.tracks.len(),
                peer
            );
        }
    }

    for entry in after.chat.iter().skip(before.chat.len()) {
        if !entry.is_local {
            println!("{} {}", format!("[{}]", entry.author).blue().bold(), entry.text);
        }
    }
}
