use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::process::{Command, Stdio};

use serde_json::Value;

fn dd_bin() -> String {
    env!("CARGO_BIN_EXE_dd").to_string()
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(dd_bin()).args(args).output().unwrap()
}

fn stdout(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn game_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| l.starts_with("game ")).collect()
}

#[test]
fn version_flag() {
    let out = run(&["--version"]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("dd "));
}

#[test]
fn unknown_command_fails() {
    let out = run(&["fly"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unknown command"));
}

#[test]
fn score_prints_every_category() {
    let out = run(&["score", "3", "3", "3", "5", "5"]);
    assert!(out.status.success());
    let text = stdout(&out);
    let value = |name: &str| -> u32 {
        let line = text
            .lines()
            .find(|l| l.split_whitespace().next() == Some(name))
            .unwrap();
        line.split_whitespace().nth(1).unwrap().parse().unwrap()
    };
    assert_eq!(value("threes"), 9);
    assert_eq!(value("fives"), 10);
    assert_eq!(value("fullHouse"), 19);
    assert_eq!(value("yahtzee"), 0);
    assert_eq!(value("chance"), 19);
}

#[test]
fn score_rejects_bad_dice() {
    assert!(!run(&["score", "1", "2", "3", "4", "7"]).status.success());
    assert!(!run(&["score", "1", "2", "3"]).status.success());
    assert!(!run(&["score", "1", "2", "x", "4", "5"]).status.success());
}

#[test]
fn sim_in_memory_games_agree() {
    let out = run(&["sim", "--games", "2", "--seed", "7"]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let text = stdout(&out);
    let games = game_lines(&text);
    assert_eq!(games.len(), 2);
    assert!(games.iter().all(|l| l.ends_with("agree=yes")));
    assert!(text.contains("summary: games=2 agreed=2"));
}

#[test]
fn sim_is_reproducible_for_a_seed() {
    let a = stdout(&run(&["sim", "--seed", "3"]));
    let b = stdout(&run(&["sim", "--seed", "3"]));
    assert_eq!(game_lines(&a), game_lines(&b));
}

#[test]
fn sim_over_tcp() {
    let out = run(&["sim", "--tcp", "--seed", "11"]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let text = stdout(&out);
    assert_eq!(game_lines(&text).len(), 1);
    assert!(text.contains("agree=yes"));
}

#[test]
fn sim_event_logs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.ndjson");
    let path_s = path.to_str().unwrap();
    let out = run(&["sim", "--seed", "5", "--log", path_s]);
    assert!(out.status.success());

    for p in [path_s.to_string(), format!("{path_s}.guest")] {
        let text = std::fs::read_to_string(&p).unwrap();
        let events: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events[0]["event"], "session_start");
        assert!(events.iter().any(|e| e["event"] == "msg_in"));
        assert!(events.iter().any(|e| e["event"] == "phase"));
    }
}

#[test]
fn sim_reads_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("dd.yaml");
    std::fs::write(&cfg, "sim:\n  games: 2\n  max_rolls: 1\n").unwrap();
    let out = run(&["sim", "--config", cfg.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(game_lines(&stdout(&out)).len(), 2);

    std::fs::write(&cfg, "sim:\n  max_rolls: 9\n").unwrap();
    let out = run(&["sim", "--config", cfg.to_str().unwrap()]);
    assert!(!out.status.success());
}

#[test]
fn join_without_a_host_fails() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap()
    };
    let out = run(&["join", "ABC123", "--connect", &addr.to_string()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Join failed"));
}

#[test]
fn host_and_join_play_a_game() {
    let mut host = Command::new(dd_bin())
        .args(["host", "--bind", "127.0.0.1:0", "--seed", "21"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    let mut lines = BufReader::new(host.stdout.take().unwrap()).lines();
    let first = lines.next().unwrap().unwrap();
    // "room <ROOM> listening on <ADDR>"
    let parts: Vec<&str> = first.split_whitespace().collect();
    assert_eq!(parts[0], "room");
    let (room, addr) = (parts[1].to_string(), parts[4].to_string());

    let wrong = run(&["join", "ZZZZZZ", "--connect", &addr]);
    assert!(!wrong.status.success());

    let guest = run(&["join", &room, "--connect", &addr, "--seed", "22"]);
    assert!(
        guest.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&guest.stderr)
    );
    let guest_text = stdout(&guest);
    assert!(guest_text.contains("finished: "));

    let rest: Vec<String> = lines.map(|l| l.unwrap()).collect();
    assert!(host.wait().unwrap().success());
    let host_final = rest.iter().find(|l| l.starts_with("finished: ")).unwrap();
    let guest_final = guest_text
        .lines()
        .find(|l| l.starts_with("finished: "))
        .unwrap();
    assert_eq!(host_final, guest_final);
}
