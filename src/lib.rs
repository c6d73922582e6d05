//! Pure Rust async client for the [Source A2S Query Protocol](https://developer.valvesoftware.com/wiki/Server_queries).
//!
//! Supports A2S_INFO (including the optional extra data block and the
//! S2C_CHALLENGE handshake) and A2S_PLAYER.
//!
//! ```no_run
//! # async fn run() -> Result<(), a2squery::SourceQueryError> {
//! use a2squery::{Endpoint, QueryClient};
//!
//! let client = QueryClient::new(Endpoint::new("nyc-1.us.uncletopia.com", 27015));
//! let info = client.get_info().await?;
//! println!("{} on {}", info.hostname, info.map);
//!
//! for player in client.players().await? {
//!     let player = player?;
//!     println!("{} {} {}", player.id, player.name, player.frags);
//! }
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod info;
pub mod packet;
pub mod parse;
pub mod players;
pub mod query;

pub use error::SourceQueryError;
pub use info::{ExtendedInfo, ServerInfo};
pub use packet::ChallengeToken;
pub use parse::BinaryCursor;
pub use players::{Player, Players};
pub use query::{Endpoint, EndpointParseError, QueryClient, DEFAULT_PORT, DEFAULT_TIMEOUT};
