// Keyboard teleop: WASD drive keys, Q quit
//
// Emits the control loop's key-array lines on stdout, so it can be
// piped straight into the driver:
//
//   cargo run --example teleop | cargo run -- --no-hardware
//
// A key counts as held while the terminal keeps repeating it; letting
// go drops it from the set after a short timeout.

use std::collections::HashMap;
use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tracing::info;

const DRIVE_KEYS: [char; 4] = ['w', 'a', 's', 'd'];
const KEY_HOLD_MS: u64 = 150; // Key released once no repeat arrives within this
const EMIT_INTERVAL_MS: u64 = 100;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    info!("Controls: WASD=drive, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop();
    disable_raw_mode()?;

    result
}

fn run_teleop() -> Result<(), Box<dyn std::error::Error>> {
    let mut last_seen: HashMap<char, Instant> = HashMap::new();
    let mut last_emit = Instant::now();
    let hold = Duration::from_millis(KEY_HOLD_MS);

    loop {
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char(c) if pressed && DRIVE_KEYS.contains(&c) => {
                        last_seen.insert(c, Instant::now());
                    }
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,
                    _ => {}
                }
            }
        }

        if last_emit.elapsed() >= Duration::from_millis(EMIT_INTERVAL_MS) {
            last_seen.retain(|_, seen| seen.elapsed() < hold);
            let keys: Vec<String> = DRIVE_KEYS
                .iter()
                .filter(|c| last_seen.contains_key(c))
                .map(|c| c.to_string())
                .collect();

            emit_line(&keys)?;
            last_emit = Instant::now();
        }
    }

    // Leave the rover stopped
    emit_line(&[])?;
    Ok(())
}

fn emit_line(keys: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string(keys)?)?;
    stdout.flush()?;
    Ok(())
}
