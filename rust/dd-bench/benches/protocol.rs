use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dd_core::{GamePhase, GameState, PlayerNo, RollResults};
use dd_proto::frame::{read_frame, write_frame};
use dd_proto::protocol::RollStart;
use dd_proto::{decode, encode, Message, PlayerId};

fn make_roll_start() -> Message {
    Message::RollStart(RollStart {
        player_id: PlayerId::from("player_k2j4h1x9q_1700000000000"),
        selected_dice: [true, false, true, true, false],
        duration: 4500,
        roll_number: 2,
        results: RollResults([Some(3), None, Some(6), Some(1), None]),
        timestamp: 1_700_000_000_123,
    })
}

fn make_snapshot() -> Message {
    Message::GameState(GameState {
        current_player: PlayerNo::Two,
        current_round: 7,
        rolls_left: 1,
        game_phase: GamePhase::Playing,
        winner: None,
    })
}

fn bench_codec(c: &mut Criterion) {
    let roll = make_roll_start();
    let snap = make_snapshot();

    c.bench_function("dd_proto_encode_roll_start", |b| {
        b.iter(|| black_box(encode(black_box(&roll))))
    });

    let roll_bytes = encode(&roll);
    c.bench_function("dd_proto_decode_roll_start", |b| {
        b.iter(|| black_box(decode(black_box(&roll_bytes)).unwrap()))
    });

    let snap_bytes = encode(&snap);
    c.bench_function("dd_proto_decode_game_state", |b| {
        b.iter(|| black_box(decode(black_box(&snap_bytes)).unwrap()))
    });

    c.bench_function("dd_proto_frame_roundtrip", |b| {
        let mut buf = Vec::with_capacity(256);
        b.iter(|| {
            buf.clear();
            write_frame(&mut buf, black_box(&roll_bytes)).unwrap();
            black_box(read_frame(&mut buf.as_slice()).unwrap())
        })
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
