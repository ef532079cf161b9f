//! Session identity: peer ids, room ids and the role → player-number mapping.

use dd_core::PlayerNo;
use dd_proto::PlayerId;
use rand::Rng;
use serde::{Deserialize, Serialize};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ROOM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random part of a generated peer id.
pub const PLAYER_ID_RAND_LEN: usize = 9;

/// `player_<9 base36 chars>_<unix ms>`.
pub fn generate_player_id<R: Rng + ?Sized>(rng: &mut R, now_ms: u64) -> PlayerId {
    let tag: String = (0..PLAYER_ID_RAND_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    PlayerId(format!("player_{tag}_{now_ms}"))
}

/// `len` uppercase alphanumeric characters.
pub fn generate_room_id<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ROOM_ALPHABET[rng.gen_range(0..ROOM_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created the room.
    Host,
    /// Joined an existing room.
    Guest,
}

impl Role {
    pub fn player_no(self) -> PlayerNo {
        match self {
            Role::Host => PlayerNo::One,
            Role::Guest => PlayerNo::Two,
        }
    }
}

/// Identity fixed for the lifetime of the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSession {
    pub player_id: PlayerId,
    pub role: Role,
    pub player_no: PlayerNo,
}

impl PlayerSession {
    pub fn new(player_id: PlayerId, role: Role) -> Self {
        Self {
            player_id,
            role,
            player_no: role.player_no(),
        }
    }
}

/// Snapshot of connection status for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub room_id: String,
    pub player_id: PlayerId,
    pub role: Role,
    pub is_connected: bool,
    pub peer_connected: bool,
    pub game_player_number: PlayerNo,
    pub is_ready: bool,
    pub opponent_ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    #[test]
    fn player_id_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let id = generate_player_id(&mut rng, 1_700_000_000_123);
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "player");
        assert_eq!(parts[1].len(), PLAYER_ID_RAND_LEN);
        assert!(parts[1].bytes().all(|b| BASE36.contains(&b)));
        assert_eq!(parts[2], "1700000000123");
    }

    #[test]
    fn room_id_is_uppercase_alnum() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let room = generate_room_id(&mut rng, 6);
        assert_eq!(room.len(), 6);
        assert!(room
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn host_is_player_one() {
        let host = PlayerSession::new(PlayerId::from("a"), Role::Host);
        let guest = PlayerSession::new(PlayerId::from("b"), Role::Guest);
        assert_eq!(host.player_no, PlayerNo::One);
        assert_eq!(guest.player_no, PlayerNo::Two);
    }
}
