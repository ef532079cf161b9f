//! dd: headless driver for the two-peer dice game.
//!
//! Subcommands:
//! - sim     two bot peers in one process
//! - host    bot peer waiting for a guest over TCP
//! - join    bot peer joining a host over TCP
//! - score   category scores for five dice

mod bot;
mod play;

use std::env;
use std::net::TcpListener;
use std::process;
use std::str::FromStr;
use std::thread;

use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

use dd_core::{scores_for_dice, Category, Config, PlayerNo, Roller, UPPER_BONUS_THRESHOLD};
use dd_logging::{force_debug, hash_config_bytes, now_ms, NdjsonWriter};
use dd_peer::session::{generate_player_id, generate_room_id};
use dd_peer::{
    Clock, HeadlessSurface, LocalAction, MemoryLink, MemoryLinkOptions, PeerContext, PeerDriver,
    PeerState, PlayerSession, Role, TcpLink, Transport,
};

use crate::bot::Bot;
use crate::play::{play_pair, play_remote, Outcome, Peer};

const DEFAULT_BIND: &str = "127.0.0.1:7878";

fn print_help() {
    eprintln!(
        r#"dd - two-peer dice game driver

USAGE:
    dd <COMMAND> [OPTIONS]

COMMANDS:
    sim                 Two bot peers play each other in one process
    host                Create a room and wait for a guest over TCP
    join ROOM           Join a hosted room over TCP
    score D1..D5        Print every category score for five dice

OPTIONS:
    -h, --help          Print this help message
    -V, --version       Print version

Run `dd <COMMAND> --help` for command options.
"#
    );
}

fn print_version() {
    println!("dd {}", env!("CARGO_PKG_VERSION"));
}

fn value<T: FromStr>(args: &[String], i: usize, flag: &str) -> T {
    if i + 1 >= args.len() {
        eprintln!("Missing value for {flag}");
        process::exit(1);
    }
    args[i + 1].parse().unwrap_or_else(|_| {
        eprintln!("Invalid {flag} value: {}", args[i + 1]);
        process::exit(1);
    })
}

/// Everything a peer needs besides its transport.
struct Setup {
    cfg: Config,
    cfg_hash: Option<String>,
    room: String,
    log: Option<String>,
}

fn load_config(path: Option<&str>) -> (Config, Option<String>) {
    let Some(path) = path else {
        return (Config::default(), None);
    };
    let bytes = std::fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read config {path}: {e}");
        process::exit(1);
    });
    let cfg = Config::load(path).unwrap_or_else(|e| {
        eprintln!("Invalid config {path}: {e}");
        process::exit(1);
    });
    if cfg.logging.debug_log {
        force_debug();
    }
    (cfg, Some(hash_config_bytes(&bytes)))
}

fn build_peer<T: Transport>(
    link: T,
    role: Role,
    setup: &Setup,
    log: Option<&str>,
    seed: Option<u64>,
) -> Peer<T> {
    let session = PlayerSession::new(link.self_id().clone(), role);
    let state = PeerState::new(session, setup.room.clone(), setup.cfg.roll.clone());
    let roller = match seed {
        Some(s) => Roller::seeded(s),
        None => Roller::from_entropy(),
    };
    let surface_seed = seed.unwrap_or_else(now_ms);
    let ctx = PeerContext::new(roller, Clock::system());
    let mut peer = PeerDriver::new(state, ctx, link, HeadlessSurface::new(surface_seed));
    if let Some(path) = log {
        let writer = NdjsonWriter::open_append_with_flush(path, setup.cfg.logging.flush_every_lines)
            .unwrap_or_else(|e| {
                eprintln!("Failed to open event log {path}: {e}");
                process::exit(1);
            });
        peer = peer.with_event_log(writer);
        peer.log_session_start(&setup.cfg.session.app_id, setup.cfg_hash.clone());
    }
    peer
}

fn winner_num(w: Option<PlayerNo>) -> u8 {
    w.map(PlayerNo::as_u8).unwrap_or(0)
}

fn print_outcome(label: &str, out: &Outcome) {
    let agree = match out.agree {
        Some(true) => " agree=yes",
        Some(false) => " agree=no",
        None => "",
    };
    println!(
        "{label}: p1={} p2={} winner={}{agree}",
        out.totals[0],
        out.totals[1],
        winner_num(out.winner)
    );
}

fn cmd_sim(args: &[String]) {
    let mut config_path: Option<String> = None;
    let mut games: Option<u32> = None;
    let mut seed: Option<u64> = None;
    let mut tcp = false;
    let mut log: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"dd sim

USAGE:
    dd sim [--games N] [--seed S] [--tcp] [--log PATH] [--config PATH]

OPTIONS:
    --games N        Games to play back to back (default: sim.games)
    --seed S         Seed for ids, dice and bot choices (default: sim.seed)
    --tcp            Connect the peers over loopback TCP instead of in memory
    --log PATH       Append host events to PATH and guest events to PATH.guest
    --config PATH    YAML config file
"#
                );
                return;
            }
            "--games" => {
                games = Some(value(args, i, "--games"));
                i += 2;
            }
            "--seed" => {
                seed = Some(value(args, i, "--seed"));
                i += 2;
            }
            "--tcp" => {
                tcp = true;
                i += 1;
            }
            "--log" => {
                log = Some(value(args, i, "--log"));
                i += 2;
            }
            "--config" => {
                config_path = Some(value(args, i, "--config"));
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `dd sim`: {other}");
                eprintln!("Run `dd sim --help` for usage.");
                process::exit(1);
            }
        }
    }

    let (cfg, cfg_hash) = load_config(config_path.as_deref());
    let games = games.unwrap_or(cfg.sim.games);
    let seed = seed.unwrap_or(cfg.sim.seed);
    let log = log.or_else(|| cfg.logging.events_path.clone());

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let now = now_ms();
    let host_id = generate_player_id(&mut rng, now);
    let guest_id = generate_player_id(&mut rng, now);
    let room = generate_room_id(&mut rng, cfg.session.room_id_len);
    let setup = Setup {
        cfg,
        cfg_hash,
        room,
        log,
    };

    let all_agree = if tcp {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap_or_else(|e| {
            eprintln!("Failed to bind loopback listener: {e}");
            process::exit(1);
        });
        let addr = listener.local_addr().unwrap_or_else(|e| {
            eprintln!("Failed to read listener address: {e}");
            process::exit(1);
        });
        let app_id = setup.cfg.session.app_id.clone();
        let room = setup.room.clone();
        let host = thread::spawn(move || TcpLink::host(&listener, &app_id, &room, host_id));
        let guest = TcpLink::join(addr, &setup.cfg.session.app_id, &setup.room, guest_id)
            .unwrap_or_else(|e| {
                eprintln!("Join failed: {e}");
                process::exit(1);
            });
        let host = match host.join() {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => {
                eprintln!("Host failed: {e}");
                process::exit(1);
            }
            Err(_) => {
                eprintln!("Host thread panicked");
                process::exit(1);
            }
        };
        run_sim(host, guest, &setup, games, seed)
    } else {
        let (la, lb) = MemoryLink::pair(host_id, guest_id, MemoryLinkOptions::default());
        run_sim(la, lb, &setup, games, seed)
    };

    if !all_agree {
        eprintln!("Peers disagreed on the final state");
        process::exit(1);
    }
}

fn run_sim<A: Transport, B: Transport>(
    la: A,
    lb: B,
    setup: &Setup,
    games: u32,
    seed: u64,
) -> bool {
    let max_rolls = setup.cfg.sim.max_rolls;
    let guest_log = setup.log.as_ref().map(|p| format!("{p}.guest"));
    let mut a = build_peer(
        la,
        Role::Host,
        setup,
        setup.log.as_deref(),
        Some(seed.wrapping_mul(2).wrapping_add(1)),
    );
    let mut b = build_peer(
        lb,
        Role::Guest,
        setup,
        guest_log.as_deref(),
        Some(seed.wrapping_mul(2).wrapping_add(2)),
    );
    let mut bot_a = Bot::new(seed ^ 0xA5A5, max_rolls);
    let mut bot_b = Bot::new(seed ^ 0x5A5A, max_rolls);

    println!(
        "room {} ({} vs {})",
        setup.room,
        a.state().session.player_id,
        b.state().session.player_id
    );

    let mut agreed = 0u32;
    let mut wins = [0u32; 2];
    for g in 1..=games {
        if g > 1 {
            a.act(LocalAction::NewGame).unwrap_or_else(|e| {
                eprintln!("New game failed: {e}");
                process::exit(1);
            });
        }
        let out = play_pair(&mut a, &mut bot_a, &mut b, &mut bot_b).unwrap_or_else(|e| {
            eprintln!("Game {g} failed: {e}");
            process::exit(1);
        });
        print_outcome(&format!("game {g}"), &out);
        if out.agree == Some(true) {
            agreed += 1;
        }
        if let Some(w) = out.winner {
            wins[w.idx()] += 1;
        }
    }
    a.flush_log();
    b.flush_log();

    println!(
        "summary: games={games} agreed={agreed} p1_wins={} p2_wins={}",
        wins[0], wins[1]
    );
    agreed == games
}

fn cmd_host(args: &[String]) {
    let mut bind = DEFAULT_BIND.to_string();
    let mut seed: Option<u64> = None;
    let mut config_path: Option<String> = None;
    let mut log: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"dd host

USAGE:
    dd host [--bind ADDR] [--seed S] [--log PATH] [--config PATH]

OPTIONS:
    --bind ADDR      Listen address (default: {DEFAULT_BIND})
    --seed S         Seed for ids, dice and bot choices (default: entropy)
    --log PATH       Append NDJSON session events to PATH
    --config PATH    YAML config file
"#
                );
                return;
            }
            "--bind" => {
                bind = value(args, i, "--bind");
                i += 2;
            }
            "--seed" => {
                seed = Some(value(args, i, "--seed"));
                i += 2;
            }
            "--log" => {
                log = Some(value(args, i, "--log"));
                i += 2;
            }
            "--config" => {
                config_path = Some(value(args, i, "--config"));
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `dd host`: {other}");
                eprintln!("Run `dd host --help` for usage.");
                process::exit(1);
            }
        }
    }

    let (cfg, cfg_hash) = load_config(config_path.as_deref());
    let log = log.or_else(|| cfg.logging.events_path.clone());
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let self_id = generate_player_id(&mut rng, now_ms());
    let room = generate_room_id(&mut rng, cfg.session.room_id_len);

    let listener = TcpListener::bind(&bind).unwrap_or_else(|e| {
        eprintln!("Failed to bind {bind}: {e}");
        process::exit(1);
    });
    let addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or(bind);
    println!("room {room} listening on {addr}");

    let link = TcpLink::host(&listener, &cfg.session.app_id, &room, self_id).unwrap_or_else(|e| {
        eprintln!("Host failed: {e}");
        process::exit(1);
    });
    println!("guest {} joined", link.peer_id());

    let setup = Setup {
        cfg,
        cfg_hash,
        room,
        log,
    };
    run_remote(link, Role::Host, &setup, seed);
}

fn cmd_join(args: &[String]) {
    let mut room: Option<String> = None;
    let mut connect: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut config_path: Option<String> = None;
    let mut log: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"dd join

USAGE:
    dd join ROOM --connect ADDR [--seed S] [--log PATH] [--config PATH]

OPTIONS:
    --connect ADDR   Host address
    --seed S         Seed for ids, dice and bot choices (default: entropy)
    --log PATH       Append NDJSON session events to PATH
    --config PATH    YAML config file
"#
                );
                return;
            }
            "--connect" => {
                connect = Some(value(args, i, "--connect"));
                i += 2;
            }
            "--seed" => {
                seed = Some(value(args, i, "--seed"));
                i += 2;
            }
            "--log" => {
                log = Some(value(args, i, "--log"));
                i += 2;
            }
            "--config" => {
                config_path = Some(value(args, i, "--config"));
                i += 2;
            }
            other if !other.starts_with('-') && room.is_none() => {
                room = Some(other.to_string());
                i += 1;
            }
            other => {
                eprintln!("Unknown option for `dd join`: {other}");
                eprintln!("Run `dd join --help` for usage.");
                process::exit(1);
            }
        }
    }
    let (Some(room), Some(connect)) = (room, connect) else {
        eprintln!("Usage: dd join ROOM --connect ADDR");
        process::exit(1);
    };

    let (cfg, cfg_hash) = load_config(config_path.as_deref());
    let log = log.or_else(|| cfg.logging.events_path.clone());
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let self_id = generate_player_id(&mut rng, now_ms());

    // Establishment failures are final; no retry.
    let link = TcpLink::join(connect.as_str(), &cfg.session.app_id, &room, self_id)
        .unwrap_or_else(|e| {
            eprintln!("Join failed: {e}");
            process::exit(1);
        });
    println!("joined room {room} hosted by {}", link.peer_id());

    let setup = Setup {
        cfg,
        cfg_hash,
        room,
        log,
    };
    run_remote(link, Role::Guest, &setup, seed);
}

fn run_remote(link: TcpLink, role: Role, setup: &Setup, seed: Option<u64>) {
    let bot_seed = seed.unwrap_or_else(now_ms);
    let mut peer = build_peer(link, role, setup, setup.log.as_deref(), seed);
    let mut bot = Bot::new(bot_seed, setup.cfg.sim.max_rolls);
    let result = play_remote(&mut peer, &mut bot);
    peer.flush_log();
    match result {
        Ok(Some(out)) => print_outcome("finished", &out),
        Ok(None) => {
            eprintln!("Opponent left before the game finished");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Game failed: {e}");
            process::exit(1);
        }
    }
}

fn cmd_score(args: &[String]) {
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!(
            r#"dd score

USAGE:
    dd score D1 D2 D3 D4 D5

Each die is a face value 1..6.
"#
        );
        return;
    }
    if args.len() != 5 {
        eprintln!("Expected exactly 5 dice, got {}", args.len());
        process::exit(1);
    }
    let mut faces = [0u8; 5];
    for (f, a) in faces.iter_mut().zip(args) {
        *f = match a.parse::<u8>() {
            Ok(v) if (1..=6).contains(&v) => v,
            _ => {
                eprintln!("Invalid die: {a} (expected 1..6)");
                process::exit(1);
            }
        };
    }

    let scores = scores_for_dice(faces);
    for c in Category::ALL {
        println!("{:<14} {}", c.name(), scores[c.index()]);
    }
    let upper: u32 = Category::UPPER.iter().map(|c| scores[c.index()]).sum();
    println!("(upper section {upper}, bonus at {UPPER_BONUS_THRESHOLD})");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        process::exit(0);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => {
            print_help();
        }
        "-V" | "--version" => {
            print_version();
        }
        "sim" => {
            cmd_sim(&args[2..]);
        }
        "host" => {
            cmd_host(&args[2..]);
        }
        "join" => {
            cmd_join(&args[2..]);
        }
        "score" => {
            cmd_score(&args[2..]);
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            eprintln!("Run `dd --help` for usage.");
            process::exit(1);
        }
    }
}
