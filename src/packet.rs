use crate::error::SourceQueryError;
use crate::parse::BinaryCursor;

/// Every single-packet request and reply starts with these four bytes.
pub const PACKET_PREFIX: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// According to the Valve wiki, Source query responses use 1400 bytes + IP/UDP headers.
pub const MAX_PACKET_SIZE: usize = 1400;

/// Payload of an A2S_INFO request, after its header byte.
const INFO_QUERY: &[u8] = b"Source Engine Query\0";

/// Placeholder sent in an A2S_PLAYER request to ask for a challenge token.
const CHALLENGE_REQUEST: &[u8] = b"0xFFFFFFFF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// A2S_INFO request -- https://developer.valvesoftware.com/wiki/Server_queries#A2S_INFO
    InfoRequest,
    /// A2S_INFO response, decoded by [ServerInfo::parse](crate::info::ServerInfo::parse).
    InfoResponse,
    /// A2S_PLAYER request -- https://developer.valvesoftware.com/wiki/Server_queries#A2S_PLAYER
    ///
    /// Used both to obtain a challenge and, with a challenge, the player list.
    PlayerRequest,
    /// A2S_PLAYER response, decoded by [Players](crate::players::Players).
    PlayerResponse,
    /// S2C_CHALLENGE
    ///
    /// the server may reply with a challenge to the client using S2C_CHALLENGE
    /// ('A' or 0x41). In that case, the client should repeat the request by appending the challenge number.
    Challenge,
}

impl PacketType {
    pub fn to_byte(self) -> u8 {
        match self {
            PacketType::InfoRequest => 0x54,    // 'T'
            PacketType::InfoResponse => 0x49,   // 'I'
            PacketType::PlayerRequest => 0x55,  // 'U'
            PacketType::PlayerResponse => 0x44, // 'D'
            PacketType::Challenge => 0x41,      // 'A'
        }
    }

    /// Map a reply header byte to its type, if it is one we know.
    pub fn from_byte(byte: u8) -> Option<PacketType> {
        match byte {
            0x54 => Some(PacketType::InfoRequest),
            0x49 => Some(PacketType::InfoResponse),
            0x55 => Some(PacketType::PlayerRequest),
            0x44 => Some(PacketType::PlayerResponse),
            0x41 => Some(PacketType::Challenge),
            _ => None,
        }
    }
}

/// Opaque token a server hands out to be echoed back in later requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeToken(Vec<u8>);

impl ChallengeToken {
    pub fn new(bytes: Vec<u8>) -> Self {
        ChallengeToken(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPacket {
    /// A2S_INFO, with the token from an S2C_CHALLENGE reply if the server sent one.
    Info { challenge: Option<ChallengeToken> },
    /// A2S_PLAYER asking for a fresh challenge token.
    Challenge,
    /// A2S_PLAYER carrying a previously issued token.
    Players { challenge: ChallengeToken },
}

impl RequestPacket {
    /// Serializes a request packet into an array of bytes.
    pub fn pack(&self) -> Vec<u8> {
        let mut payload: Vec<u8> = Vec::with_capacity(32);
        payload.extend_from_slice(&PACKET_PREFIX);

        match self {
            RequestPacket::Info { challenge } => {
                payload.push(PacketType::InfoRequest.to_byte());
                payload.extend_from_slice(INFO_QUERY);
                if let Some(c) = challenge {
                    payload.extend_from_slice(c.as_bytes());
                }
            }
            RequestPacket::Challenge => {
                payload.push(PacketType::PlayerRequest.to_byte());
                payload.extend_from_slice(CHALLENGE_REQUEST);
            }
            RequestPacket::Players { challenge } => {
                payload.push(PacketType::PlayerRequest.to_byte());
                payload.extend_from_slice(challenge.as_bytes());
            }
        }

        payload
    }
}

/// A reply split into its header byte and the type-specific body.
///
/// The 4-byte prefix is dropped without being checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePacket {
    header: u8,
    body: Vec<u8>,
}

impl ResponsePacket {
    /// Deserializes an incoming datagram, splitting it up into header and body.
    pub fn unpack(incoming: &[u8]) -> Result<Self, SourceQueryError> {
        let mut cursor = BinaryCursor::new(incoming);
        cursor.skip(PACKET_PREFIX.len())?;
        let header = cursor.byte()?;
        let body = cursor.rest();

        Ok(ResponsePacket { header, body })
    }

    /// The raw header byte.
    pub fn header(&self) -> u8 {
        self.header
    }

    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::from_byte(self.header)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_request_bytes() {
        let packed = RequestPacket::Info { challenge: None }.pack();
        let mut expected = vec![0xFF, 0xFF, 0xFF, 0xFF];
        expected.extend_from_slice(b"TSource Engine Query\0");
        assert_eq!(packed, expected);
    }

    #[test]
    fn request_headers_map_back_to_types() {
        let info = RequestPacket::Info { challenge: None }.pack();
        assert_eq!(PacketType::from_byte(info[4]), Some(PacketType::InfoRequest));

        let challenge = RequestPacket::Challenge.pack();
        assert_eq!(
            PacketType::from_byte(challenge[4]),
            Some(PacketType::PlayerRequest)
        );
    }

    #[test]
    fn info_request_appends_challenge() {
        let token = ChallengeToken::new(vec![0x0A, 0x0B, 0x0C, 0x0D]);
        let packed = RequestPacket::Info {
            challenge: Some(token),
        }
        .pack();
        assert!(packed.ends_with(b"Query\0\x0A\x0B\x0C\x0D"));
    }

    #[test]
    fn challenge_request_bytes() {
        let packed = RequestPacket::Challenge.pack();
        assert_eq!(packed, b"\xFF\xFF\xFF\xFF\x550xFFFFFFFF".to_vec());
    }

    #[test]
    fn players_request_carries_token() {
        let packed = RequestPacket::Players {
            challenge: ChallengeToken::new(vec![1, 2, 3, 4]),
        }
        .pack();
        assert_eq!(packed, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x55, 1, 2, 3, 4]);
    }

    #[test]
    fn unpack_splits_header_and_body() {
        let packet = ResponsePacket::unpack(&[0xFF, 0xFF, 0xFF, 0xFF, 0x41, 9, 8, 7, 6]).unwrap();
        assert_eq!(packet.header(), 0x41);
        assert_eq!(packet.packet_type(), Some(PacketType::Challenge));
        assert_eq!(packet.body(), &[9, 8, 7, 6]);
    }

    #[test]
    fn unpack_unknown_header_is_kept() {
        let packet = ResponsePacket::unpack(&[0xFF, 0xFF, 0xFF, 0xFF, 0x6D]).unwrap();
        assert_eq!(packet.header(), 0x6D);
        assert_eq!(packet.packet_type(), None);
        assert!(packet.body().is_empty());
    }

    #[test]
    fn unpack_short_datagram_is_malformed() {
        assert!(matches!(
            ResponsePacket::unpack(&[0xFF, 0xFF, 0xFF, 0xFF]),
            Err(SourceQueryError::MalformedResponse(_))
        ));
    }
}
