//! dd-proto: Peer message protocol, binary codec and stream framing.

pub mod codec;
pub mod frame;
pub mod protocol;

pub use codec::{decode, encode, DecodeError};
pub use protocol::{Message, MsgKind, PlayerId, PROTOCOL_VERSION};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use std::io::Cursor as IoCursor;
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use dd_core::{Category, GamePhase, GameState, PlayerNo, RollResults};

    use super::*;
    use crate::frame::{read_frame, write_frame, FrameError, MAX_FRAME_LEN};
    use crate::protocol::{
        Activity, DiceSelect, DurationUpdate, PlayerAction, Ready, RollStart, ScoreOpts,
        ScoreUpdate,
    };

    fn pid() -> PlayerId {
        PlayerId::from("player_abc123xyz_1700000000000")
    }

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::Ready(Ready {
                player_id: pid(),
                is_ready: true,
                timestamp: 1,
            }),
            Message::DiceSelect(DiceSelect {
                player_id: pid(),
                selected_dice: [true, false, false, true, false],
                timestamp: 2,
            }),
            Message::RollStart(RollStart {
                player_id: pid(),
                selected_dice: [true, false, false, true, false],
                duration: 4500,
                roll_number: 2,
                results: RollResults([None, Some(6), Some(1), None, Some(3)]),
                timestamp: 3,
            }),
            Message::Action(PlayerAction {
                player_id: pid(),
                action: Activity::Selecting,
                timestamp: 4,
            }),
            Message::Duration(DurationUpdate {
                player_id: pid(),
                duration: 2500,
                timestamp: 5,
            }),
            Message::ScoreOpts(ScoreOpts {
                player_id: pid(),
                current_faces: [2, 6, 1, 2, 3],
                rolls_left: 1,
                timestamp: 6,
            }),
            Message::ScoreUpdate(ScoreUpdate {
                player_id: pid(),
                category: Category::SmallStraight,
                score: 15,
                timestamp: 7,
            }),
            Message::GameState(GameState {
                current_player: PlayerNo::One,
                current_round: 12,
                rolls_left: 3,
                game_phase: GamePhase::Finished,
                winner: Some(PlayerNo::Two),
            }),
        ]
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn every_kind_survives_the_codec() {
        for msg in sample_messages() {
            let bytes = encode(&msg);
            assert_eq!(bytes[4], msg.kind() as u8);
            assert_eq!(decode(&bytes).unwrap(), msg);
        }
    }

    #[test]
    fn held_dice_use_the_sentinel_byte() {
        let msg = &sample_messages()[2];
        let bytes = encode(msg);
        // header(8) + id(2+30) + mask(1) + duration(4) + roll_number(1)
        let off = 8 + 2 + pid().0.len() + 1 + 4 + 1;
        assert_eq!(bytes[off] as i8, protocol::HELD_SENTINEL);
        assert_eq!(bytes[off + 1], 6);
        assert_eq!(bytes[off + 3] as i8, protocol::HELD_SENTINEL);
    }

    #[test]
    fn garbled_payloads_are_rejected() {
        let good = encode(&sample_messages()[0]);

        let mut bad_version = good.clone();
        bad_version[0] = 9;
        assert_eq!(decode(&bad_version).unwrap_err(), DecodeError::BadVersion(9));

        let mut bad_kind = good.clone();
        bad_kind[4] = 200;
        assert_eq!(decode(&bad_kind).unwrap_err(), DecodeError::BadKind(200));

        assert_eq!(decode(&good[..good.len() - 1]).unwrap_err(), DecodeError::TooShort);

        let mut trailing = good.clone();
        trailing.push(0);
        assert_eq!(decode(&trailing).unwrap_err(), DecodeError::TrailingBytes(1));
    }

    #[test]
    fn roll_results_must_match_the_held_mask() {
        let Message::RollStart(mut rs) = sample_messages()[2].clone() else {
            unreachable!()
        };
        // Die 0 held but a face was rolled for it.
        rs.results.0[0] = Some(4);
        let bytes = encode(&Message::RollStart(rs));
        assert_eq!(decode(&bytes).unwrap_err(), DecodeError::InconsistentRoll);
    }

    #[test]
    fn invalid_snapshot_is_rejected() {
        let mut bytes = encode(&sample_messages()[7]);
        // Drop the winner from a finished game.
        let last = bytes.len() - 1;
        bytes[last] = 0;
        assert!(matches!(decode(&bytes).unwrap_err(), DecodeError::BadState(_)));
    }

    #[test]
    fn json_uses_channel_names() {
        for msg in sample_messages() {
            let v = serde_json::to_value(&msg).unwrap();
            assert_eq!(v["type"], msg.kind().name());
        }
        let v = serde_json::to_value(&sample_messages()[2]).unwrap();
        assert_eq!(v["selectedDice"][0], true);
        assert!(v["results"][0].is_null());
        assert_eq!(v["playerId"], pid().0);
    }

    #[test]
    fn frames_detect_clean_close_and_truncation() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").unwrap();
        let mut r = IoCursor::new(buf.clone());
        assert_eq!(read_frame(&mut r).unwrap().as_deref(), Some(&b"hello"[..]));
        assert!(read_frame(&mut r).unwrap().is_none());

        let mut cut = IoCursor::new(buf[..6].to_vec());
        assert!(matches!(read_frame(&mut cut), Err(FrameError::UnexpectedEof)));

        let mut huge = IoCursor::new((MAX_FRAME_LEN + 1).to_le_bytes().to_vec());
        assert!(matches!(read_frame(&mut huge), Err(FrameError::TooLarge { .. })));
    }

    #[test]
    fn messages_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut sock, _peer) = listener.accept().unwrap();
            let mut got = Vec::new();
            while let Some(payload) = read_frame(&mut sock).unwrap() {
                got.push(decode(&payload).unwrap());
            }
            got
        });

        let mut client = TcpStream::connect(addr).unwrap();
        for msg in sample_messages() {
            write_frame(&mut client, &encode(&msg)).unwrap();
        }
        drop(client);

        let got = server.join().unwrap();
        assert_eq!(got, sample_messages());
    }
}
