//! Plays the door game from a terminal.
//!
//! ```text
//! DOORWAY_HOST=127.0.0.1 cargo run -p door-console --bin console
//! ```
//!
//! Type `help` for the commands. Log output goes to stderr and follows
//! `RUST_LOG` (default `info`).

use doorway::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  start <reps> <sets>   start a game
  config                open the backend configuration
  host <host> <port>    change the backend address
  save                  save the configuration
  test                  test the connection (saves on success)
  status                check the backend status
  totals                refresh the total reps
  abandon               leave the game
  state                 show the current state
  quit                  exit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");

    let (game, mut events) = DoorGame::builder().spawn()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match run_command(&game, line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {e}"),
                }
            }
            Some(event) = events.recv() => render(&event),
        }
    }

    game.shutdown().await?;
    Ok(())
}

/// Runs one command line. Returns `Ok(false)` on `quit`.
async fn run_command(game: &GameHandle, line: &str) -> Result<bool, DoorwayError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => {}
        ["start", reps, sets] => {
            let session = game.start_game(*reps, *sets).await?;
            println!("door {} opened ({} reps)", session.set_number, session.target_reps);
        }
        ["config"] => game.open_config().await?,
        ["host", host, port] => game.set_connection(ConnectionConfig::new(*host, *port)).await?,
        ["save"] => game.save_config().await?,
        ["test"] => {
            let report = game.test_connection().await?;
            println!("connected, backend count {}", report.movement_count);
        }
        ["status"] => println!("backend answered {}", game.check_backend_status().await?),
        ["totals"] => match game.refresh_total_reps().await? {
            Some(total) => println!("total reps: {total}"),
            None => println!("total reps unavailable"),
        },
        ["abandon"] => {
            game.abandon().await?;
        }
        ["state"] => {
            let snap = game.snapshot().await?;
            println!(
                "step {} | set {} | count {} | backend {}",
                snap.step,
                snap.current_set,
                snap.movement_count,
                snap.connection.base_url()
            );
        }
        ["quit"] | ["exit"] => return Ok(false),
        _ => println!("{HELP}"),
    }
    Ok(true)
}

fn render(event: &GameEvent) {
    match event {
        GameEvent::StepChanged { to, .. } => println!("-- {to} --"),
        GameEvent::SessionStarted {
            set, target_sets, ..
        } => println!("set {set} of {target_sets}"),
        GameEvent::Progress {
            movement_count,
            target_reps,
            ..
        } => println!("{movement_count} / {target_reps}"),
        GameEvent::SetCompleted { chapter, .. } => println!("{chapter}"),
        GameEvent::Countdown { remaining } => println!("next door in {remaining}s"),
        GameEvent::GameFinished { sets, .. } => println!("all {sets} doors opened!"),
        GameEvent::TotalReps(total) => println!("total reps: {total}"),
        GameEvent::ConnectivityLost { error } => {
            println!("cannot reach the backend ({error}), check the configuration")
        }
        GameEvent::SessionStalled { movement_count, .. } => {
            println!("no progress for too long at {movement_count} reps, game ended")
        }
    }
}
