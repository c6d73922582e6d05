use crate::error::SourceQueryError;
use crate::packet::{PacketType, ResponsePacket};
use crate::parse::BinaryCursor;

/// Server information as obtained by [QueryClient::get_info](crate::query::QueryClient::get_info).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    /// A2S_INFO protocol version
    pub protocol: u8,
    /// Server hostname
    pub hostname: String,
    /// Current map
    pub map: String,
    /// Location of server files
    pub folder: String,
    /// Name of game
    pub game: String,
    /// Steam ID of game
    pub game_id: u16,
    /// Current players
    pub players: u8,
    /// Max players
    pub max_players: u8,
    /// Current bots
    pub bots: u8,
    /// Server type:
    /// - `d`: Dedicated
    /// - `l`: Listen (non-dedicated)
    /// - `p`: SourceTV relay (proxy)
    pub server_type: char,
    /// Server environment:
    /// - `l`: Linux
    /// - `w`: Windows
    /// - `m` or `o`: Mac
    pub server_env: char,
    /// Is the server password protected?
    pub password_protected: bool,
    /// Is the server VAC enabled?
    pub vac_enabled: bool,
    /// Version of the game installed on the server
    pub version: String,
    /// Present only when the reply's extra data flag is nonzero.
    pub extended: Option<ExtendedInfo>,
}

/// The optional trailing block of an A2S_INFO reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedInfo {
    /// The server's game port
    pub port: u16,
    /// The server's 64-bit Steam ID
    pub steam_id: u64,
    /// SourceTV spectator port
    pub spectator_port: u16,
    /// SourceTV spectator server name
    pub spectator_name: String,
    /// Tags that describe the game according to the server
    pub keywords: String,
}

impl ServerInfo {
    /// Parse a [ResponsePacket] into its corresponding [ServerInfo].
    ///
    /// Fails with [SourceQueryError::InvalidServer] unless the packet is an
    /// A2S_INFO response.
    pub fn parse(packet: &ResponsePacket) -> Result<ServerInfo, SourceQueryError> {
        let expected = PacketType::InfoResponse.to_byte();
        if packet.header() != expected {
            return Err(SourceQueryError::InvalidServer {
                expected,
                found: packet.header(),
            });
        }

        Self::parse_body(&mut BinaryCursor::new(packet.body()))
    }

    fn parse_body(data: &mut BinaryCursor<&[u8]>) -> Result<ServerInfo, SourceQueryError> {
        let protocol = data.byte()?;
        let hostname = data.string()?;
        let map = data.string()?;
        let folder = data.string()?;
        let game = data.string()?;
        let game_id = data.short()?;
        let players = data.byte()?;
        let max_players = data.byte()?;
        let bots = data.byte()?;
        let server_type = char::from(data.byte()?);
        let server_env = char::from(data.byte()?);
        let password_protected = data.byte()? != 0;
        let vac_enabled = data.byte()? != 0;
        let version = data.string()?;

        let extended = if data.byte()? != 0 {
            Some(ExtendedInfo {
                port: data.short()?,
                steam_id: data.long_long()? as u64,
                spectator_port: data.short()?,
                spectator_name: data.string()?,
                keywords: data.string()?,
            })
        } else {
            None
        };

        Ok(ServerInfo {
            protocol,
            hostname,
            map,
            folder,
            game,
            game_id,
            players,
            max_players,
            bots,
            server_type,
            server_env,
            password_protected,
            vac_enabled,
            version,
            extended,
        })
    }

    pub fn is_dedicated(&self) -> bool {
        self.server_type == 'd'
    }

    pub fn has_extended(&self) -> bool {
        self.extended.is_some()
    }
}
