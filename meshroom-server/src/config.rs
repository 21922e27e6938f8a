//! Relay configuration.
//!
//! Every option can come from a command-line flag or its environment variable.
//! The TURN credential is redacted in Debug output.

use clap::Parser;
use meshroom_core::IceServerConfig;
use std::fmt;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

#[derive(Clone, Parser)]
#[command(name = "meshroom-server", about = "Signaling relay for full-mesh rooms")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "MESHROOM_BIND", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: SocketAddr,

    /// Origin allowed by CORS. Any origin when unset.
    #[arg(long, env = "MESHROOM_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// STUN servers handed to clients (comma separated in the environment).
    #[arg(
        long = "stun-url",
        env = "MESHROOM_STUN_URL",
        value_delimiter = ',',
        default_value = DEFAULT_STUN_URL
    )]
    pub stun_urls: Vec<String>,

    #[arg(long, env = "TURN_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL", hide_env_values = true)]
    pub turn_credential: Option<String>,
}

impl ServerConfig {
    /// ICE servers announced to every client on connect.
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = Vec::new();

        let stun_urls: Vec<String> = self
            .stun_urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_owned)
            .collect();
        if !stun_urls.is_empty() {
            servers.push(IceServerConfig {
                urls: stun_urls,
                username: None,
                credential: None,
            });
        }

        if let Some(turn_url) = &self.turn_url {
            servers.push(IceServerConfig {
                urls: vec![turn_url.clone()],
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }

        servers
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("allowed_origin", &self.allowed_origin)
            .field("stun_urls", &self.stun_urls)
            .field("turn_url", &self.turn_url)
            .field("turn_username", &self.turn_username)
            .field(
                "turn_credential",
                &self.turn_credential.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
