//! Binary codec for the peer protocol (payload inside a length-delimited frame).
//!
//! Layout: u32 version | u8 kind | u8 flags | u16 reserved | body.
//! All integers little-endian. Strings are u16 length + UTF-8 bytes.
//! Dice selections are a 5-bit mask (bit i = die i held).

use thiserror::Error;

use dd_core::dice::{is_valid_face, NUM_DICE};
use dd_core::engine::validate_state;
use dd_core::{Category, GamePhase, GameState, PlayerNo, RollResults};

use crate::protocol::{
    Activity, DiceSelect, DurationUpdate, Message, MsgKind, PlayerAction, PlayerId, Ready,
    RollStart, ScoreOpts, ScoreUpdate, HELD_SENTINEL, MAX_PLAYER_ID_LEN, PROTOCOL_VERSION,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload too short")]
    TooShort,
    #[error("unsupported protocol version: {0}")]
    BadVersion(u32),
    #[error("unknown message kind: {0}")]
    BadKind(u8),
    #[error("invalid boolean byte: {0}")]
    BadBool(u8),
    #[error("invalid dice mask: {0:#04x}")]
    BadMask(u8),
    #[error("invalid die face: {0}")]
    BadFace(i8),
    #[error("invalid category index: {0}")]
    BadCategory(u8),
    #[error("invalid activity: {0}")]
    BadActivity(u8),
    #[error("player id too long: {0} bytes")]
    PlayerIdTooLong(usize),
    #[error("player id is not valid UTF-8")]
    BadUtf8,
    #[error("roll results disagree with the held mask")]
    InconsistentRoll,
    #[error("invalid game state: {0}")]
    BadState(String),
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

pub fn encode(msg: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    encode_into(&mut out, msg);
    out
}

pub fn encode_into(out: &mut Vec<u8>, msg: &Message) {
    out.clear();
    out.extend_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    out.push(msg.kind() as u8);
    out.push(0); // flags
    out.extend_from_slice(&[0, 0]); // reserved

    match msg {
        Message::Ready(m) => {
            put_player_id(out, &m.player_id);
            out.push(m.is_ready as u8);
            out.extend_from_slice(&m.timestamp.to_le_bytes());
        }
        Message::DiceSelect(m) => {
            put_player_id(out, &m.player_id);
            out.push(mask_from_bools(&m.selected_dice));
            out.extend_from_slice(&m.timestamp.to_le_bytes());
        }
        Message::RollStart(m) => {
            put_player_id(out, &m.player_id);
            out.push(mask_from_bools(&m.selected_dice));
            out.extend_from_slice(&m.duration.to_le_bytes());
            out.push(m.roll_number);
            for r in m.results.0 {
                let b = r.map(|f| f as i8).unwrap_or(HELD_SENTINEL);
                out.push(b as u8);
            }
            out.extend_from_slice(&m.timestamp.to_le_bytes());
        }
        Message::Action(m) => {
            put_player_id(out, &m.player_id);
            out.push(m.action.as_u8());
            out.extend_from_slice(&m.timestamp.to_le_bytes());
        }
        Message::Duration(m) => {
            put_player_id(out, &m.player_id);
            out.extend_from_slice(&m.duration.to_le_bytes());
            out.extend_from_slice(&m.timestamp.to_le_bytes());
        }
        Message::ScoreOpts(m) => {
            put_player_id(out, &m.player_id);
            out.extend_from_slice(&m.current_faces);
            out.push(m.rolls_left);
            out.extend_from_slice(&m.timestamp.to_le_bytes());
        }
        Message::ScoreUpdate(m) => {
            put_player_id(out, &m.player_id);
            out.push(m.category.index() as u8);
            out.extend_from_slice(&m.score.to_le_bytes());
            out.extend_from_slice(&m.timestamp.to_le_bytes());
        }
        Message::GameState(s) => {
            out.push(s.current_player.as_u8());
            out.push(s.current_round);
            out.push(s.rolls_left);
            out.push(s.game_phase.as_u8());
            out.push(s.winner.map(PlayerNo::as_u8).unwrap_or(0));
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    let mut c = Cursor::new(bytes);

    let version = c.read_u32()?;
    if version != PROTOCOL_VERSION {
        return Err(DecodeError::BadVersion(version));
    }
    let kind_byte = c.read_u8()?;
    let kind = MsgKind::from_u8(kind_byte).ok_or(DecodeError::BadKind(kind_byte))?;
    let _flags = c.read_u8()?;
    c.skip(2)?;

    let msg = match kind {
        MsgKind::Ready => Message::Ready(Ready {
            player_id: c.read_player_id()?,
            is_ready: c.read_bool()?,
            timestamp: c.read_u64()?,
        }),
        MsgKind::DiceSelect => Message::DiceSelect(DiceSelect {
            player_id: c.read_player_id()?,
            selected_dice: c.read_mask()?,
            timestamp: c.read_u64()?,
        }),
        MsgKind::RollStart => {
            let player_id = c.read_player_id()?;
            let selected_dice = c.read_mask()?;
            let duration = c.read_u32()?;
            let roll_number = c.read_u8()?;
            let mut results = [None; NUM_DICE];
            for r in &mut results {
                let b = c.read_u8()? as i8;
                *r = if b == HELD_SENTINEL {
                    None
                } else if b > 0 && is_valid_face(b as u8) {
                    Some(b as u8)
                } else {
                    return Err(DecodeError::BadFace(b));
                };
            }
            let results = RollResults(results);
            if !results.matches_selection(&selected_dice) {
                return Err(DecodeError::InconsistentRoll);
            }
            Message::RollStart(RollStart {
                player_id,
                selected_dice,
                duration,
                roll_number,
                results,
                timestamp: c.read_u64()?,
            })
        }
        MsgKind::Action => {
            let player_id = c.read_player_id()?;
            let b = c.read_u8()?;
            Message::Action(PlayerAction {
                player_id,
                action: Activity::from_u8(b).ok_or(DecodeError::BadActivity(b))?,
                timestamp: c.read_u64()?,
            })
        }
        MsgKind::Duration => Message::Duration(DurationUpdate {
            player_id: c.read_player_id()?,
            duration: c.read_u32()?,
            timestamp: c.read_u64()?,
        }),
        MsgKind::ScoreOpts => {
            let player_id = c.read_player_id()?;
            let mut current_faces = [0u8; NUM_DICE];
            c.read_bytes_into(&mut current_faces)?;
            if let Some(&bad) = current_faces.iter().find(|&&f| !is_valid_face(f)) {
                return Err(DecodeError::BadFace(bad as i8));
            }
            Message::ScoreOpts(ScoreOpts {
                player_id,
                current_faces,
                rolls_left: c.read_u8()?,
                timestamp: c.read_u64()?,
            })
        }
        MsgKind::ScoreUpdate => {
            let player_id = c.read_player_id()?;
            let idx = c.read_u8()?;
            let category =
                Category::from_index(idx as usize).ok_or(DecodeError::BadCategory(idx))?;
            Message::ScoreUpdate(ScoreUpdate {
                player_id,
                category,
                score: c.read_u32()?,
                timestamp: c.read_u64()?,
            })
        }
        MsgKind::GameState => Message::GameState(c.read_game_state()?),
    };

    let rest = c.remaining();
    if rest != 0 {
        return Err(DecodeError::TrailingBytes(rest));
    }
    Ok(msg)
}

fn put_player_id(out: &mut Vec<u8>, id: &PlayerId) {
    let bytes = id.0.as_bytes();
    // Ids are generated locally; oversized ids are truncated at a char boundary.
    let mut len = bytes.len().min(MAX_PLAYER_ID_LEN);
    while !id.0.is_char_boundary(len) {
        len -= 1;
    }
    out.extend_from_slice(&(len as u16).to_le_bytes());
    out.extend_from_slice(&bytes[..len]);
}

fn mask_from_bools(sel: &[bool; NUM_DICE]) -> u8 {
    sel.iter()
        .enumerate()
        .fold(0u8, |m, (i, &held)| if held { m | (1 << i) } else { m })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    off: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, off: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.off
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.off + n > self.bytes.len() {
            return Err(DecodeError::TooShort);
        }
        let s = &self.bytes[self.off..self.off + n];
        self.off += n;
        Ok(s)
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(DecodeError::BadBool(b)),
        }
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_bytes_into(&mut self, out: &mut [u8]) -> Result<(), DecodeError> {
        let b = self.take(out.len())?;
        out.copy_from_slice(b);
        Ok(())
    }

    fn read_player_id(&mut self) -> Result<PlayerId, DecodeError> {
        let len = self.read_u16()? as usize;
        if len > MAX_PLAYER_ID_LEN {
            return Err(DecodeError::PlayerIdTooLong(len));
        }
        let raw = self.take(len)?;
        let s = std::str::from_utf8(raw).map_err(|_| DecodeError::BadUtf8)?;
        Ok(PlayerId(s.to_string()))
    }

    fn read_mask(&mut self) -> Result<[bool; NUM_DICE], DecodeError> {
        let m = self.read_u8()?;
        if m >> NUM_DICE != 0 {
            return Err(DecodeError::BadMask(m));
        }
        let mut out = [false; NUM_DICE];
        for (i, held) in out.iter_mut().enumerate() {
            *held = m & (1 << i) != 0;
        }
        Ok(out)
    }

    fn read_game_state(&mut self) -> Result<GameState, DecodeError> {
        let player = self.read_u8()?;
        let current_player =
            PlayerNo::try_from(player).map_err(|e| DecodeError::BadState(e.to_string()))?;
        let current_round = self.read_u8()?;
        let rolls_left = self.read_u8()?;
        let phase = self.read_u8()?;
        let game_phase = GamePhase::from_u8(phase)
            .ok_or_else(|| DecodeError::BadState(format!("unknown phase byte {phase}")))?;
        let winner = match self.read_u8()? {
            0 => None,
            w => Some(PlayerNo::try_from(w).map_err(|e| DecodeError::BadState(e.to_string()))?),
        };
        let state = GameState {
            current_player,
            current_round,
            rolls_left,
            game_phase,
            winner,
        };
        validate_state(&state).map_err(|e| DecodeError::BadState(e.to_string()))?;
        Ok(state)
    }
}
