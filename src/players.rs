use std::time::Duration;

use log::debug;

use crate::error::SourceQueryError;
use crate::packet::{PacketType, ResponsePacket};
use crate::parse::BinaryCursor;

/// One entry of an A2S_PLAYER reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// 1-based position in the reply. The server's own slot index is not exposed.
    pub id: u8,
    /// Name of the player
    pub name: String,
    /// Player's score (usually "frags" or "kills")
    pub frags: i32,
    /// Time (in seconds) player has been connected to the server
    pub time: f32,
}

impl Player {
    /// [Player::time] as a [Duration], or `None` if the server sent a negative or non-finite value.
    pub fn connected_for(&self) -> Option<Duration> {
        Duration::try_from_secs_f32(self.time).ok()
    }
}

/// Lazily decoded player list.
///
/// The whole reply has already been received; entries are decoded one at a
/// time as the iterator is advanced. Decoding stops after the first error.
#[derive(Debug, Clone)]
pub struct Players {
    data: BinaryCursor<Vec<u8>>,
    count: u8,
    next_id: u8,
    failed: bool,
}

impl Players {
    /// Read the player count from an A2S_PLAYER reply.
    ///
    /// The header byte is part of the envelope and is not checked.
    pub fn parse(packet: ResponsePacket) -> Result<Players, SourceQueryError> {
        if packet.packet_type() != Some(PacketType::PlayerResponse) {
            debug!(
                "decoding player reply with unexpected header {:#04x}",
                packet.header()
            );
        }
        let mut data = BinaryCursor::new(packet.into_body());
        let count = data.byte()?;

        Ok(Players {
            data,
            count,
            next_id: 0,
            failed: false,
        })
    }

    /// The player count announced by the server.
    pub fn player_count(&self) -> u8 {
        self.count
    }

    fn parse_player(&mut self) -> Result<Player, SourceQueryError> {
        // server-side slot index, meaningless to clients
        self.data.byte()?;

        Ok(Player {
            id: self.next_id,
            name: self.data.string()?,
            frags: self.data.long()?,
            time: self.data.float()?,
        })
    }
}

impl Iterator for Players {
    type Item = Result<Player, SourceQueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_id >= self.count {
            return None;
        }
        self.next_id += 1;

        let player = self.parse_player();
        self.failed = player.is_err();
        Some(player)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.failed {
            0
        } else {
            usize::from(self.count - self.next_id)
        };
        (0, Some(left))
    }
}

impl std::iter::FusedIterator for Players {}
