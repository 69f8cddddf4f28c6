//! Tank Replay CLI - Play a recorded duel in the terminal.

use std::fs;
use std::path::PathBuf;

use tank_replay::{
    board::MemoryBoard,
    playback::PlaybackController,
    schema::{
        Cell, Flow, Heading, MatchResult, Outcome, PlaybackConfig, ReplaySetup, Strike, TickState,
    },
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <replay.json> [frame_ms]", args[0]);
        eprintln!();
        eprintln!("Play a recorded tank duel as ASCII frames.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  replay.json  Path to the replay (settings, result, flow)");
        eprintln!("  frame_ms     Virtual milliseconds per frame (default: 100)");
        eprintln!();
        eprintln!("Playback timing is read from <replay>.config.json when present.");
        eprintln!("An example replay is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_replay();
        return;
    }

    let replay_path = PathBuf::from(&args[1]);
    let frame_ms: u64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .filter(|&ms| ms > 0)
        .unwrap_or(100);

    let setup = ReplaySetup::from_path(&replay_path).unwrap_or_else(|e| {
        eprintln!("Error loading replay: {}", e);
        std::process::exit(1);
    });

    let config_path = replay_path.with_extension("config.json");
    let config = if config_path.exists() {
        let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
            eprintln!("Error reading config file: {}", e);
            std::process::exit(1);
        });
        PlaybackConfig::from_json(&config_str).unwrap_or_else(|e| {
            eprintln!("Error parsing config: {}", e);
            std::process::exit(1);
        })
    } else {
        PlaybackConfig::default()
    };

    println!("Tank Replay");
    println!("===========");
    println!("Board: {}x{}", config.board.width, config.board.height);
    println!("Players: {}", setup.flow.player_count());
    println!("Ticks: {}", setup.flow.tick_count());
    println!("Frame: {}ms", frame_ms);
    println!();

    let board = MemoryBoard::new(
        config.board.width,
        config.board.height,
        setup.flow.player_count(),
    );
    let mut player =
        PlaybackController::new(setup.flow.clone(), config, board).unwrap_or_else(|e| {
            eprintln!("Invalid playback config: {}", e);
            std::process::exit(1);
        });
    player.play();

    let mut shown = None;
    let mut frames = 0u64;
    loop {
        if shown != Some(player.pointer()) {
            shown = Some(player.pointer());
            println!(
                "Tick {} / {}",
                player.current_tick_text(),
                player.tick_count_text()
            );
            print!("{}", player.board().render_ascii());
            println!();
        }
        if player.session().is_finished() {
            break;
        }
        player.advance(frame_ms);
        frames += 1;
    }

    println!("Final board:");
    print!("{}", player.board().render_ascii());
    println!();
    println!("Result: {}", setup.result);
    if let Some(explanation) = setup.explanation_text() {
        println!("{}", explanation);
    }
    println!("Played {} frame(s), {}ms of replay time", frames, player.now());
}

fn print_example_replay() {
    let a = TickState::new(Cell::new(1, 1), 100, Heading::Up);
    let b = TickState::new(Cell::new(5, 5), 100, Heading::Left);
    let flow = Flow::new(vec![
        vec![a, b],
        vec![
            TickState::new(Cell::new(1, 0), 100, Heading::Up).moved(),
            b.with_strike(Strike::Direct(Cell::new(1, 0))),
        ],
        vec![
            TickState::new(Cell::new(1, 0), 60, Heading::Right),
            TickState::new(Cell::new(4, 5), 100, Heading::Left)
                .moved()
                .with_strike(Strike::Area {
                    center: Cell::new(2, 1),
                    impact: Cell::new(1, 0),
                }),
        ],
        vec![
            TickState::new(Cell::new(1, 0), 10, Heading::Right),
            TickState::new(Cell::new(4, 5), 100, Heading::Left),
        ],
    ]);
    let flow = flow.unwrap_or_else(|e| {
        eprintln!("Error building example flow: {}", e);
        std::process::exit(1);
    });

    let setup = ReplaySetup {
        settings: serde_json::json!({ "width": 10, "height": 10, "max_ticks": 100 }),
        result: MatchResult::PerPlayer(vec![Outcome::Loss, Outcome::Win]),
        explanation: None,
        flow,
    };

    let print = |label: &str, json: serde_json::Result<String>| match json {
        Ok(json) => {
            println!("{}", label);
            println!("{}", json);
            println!();
        }
        Err(e) => eprintln!("Error serializing {}: {}", label, e),
    };
    print("Example replay (replay.json):", serde_json::to_string_pretty(&setup));
    print(
        "Example playback config (replay.config.json):",
        serde_json::to_string_pretty(&PlaybackConfig::default()),
    );
}
