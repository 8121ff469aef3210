//! conch terminal host.
//!
//! Reads lines from stdin, feeds them to the shell as key events, and
//! prints the transcript with ANSI colors. The shell clock follows the
//! wall clock, ticked every frame.
//!
//! Usage: `conch [config.toml|config.json]` (or set `CONCH_CONFIG`).

mod commands;
mod terminal;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};

use conch_shell::{ExecutionState, Shell};
use conch_types::config::ShellConfig;

use terminal::AnsiSurface;

const FRAME: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CONCH_CONFIG").ok())
    {
        Some(path) => {
            let path = PathBuf::from(path);
            ShellConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        },
        None => ShellConfig::default(),
    };
    log::info!(
        "Starting conch ({}@{}, prompt '{}')",
        config.window.user,
        config.window.title,
        config.prompt
    );

    let surface = AnsiSurface::stdout(&config.window);
    let prompt = config.prompt.clone();
    let shell = Shell::new(config, Box::new(surface));
    commands::register_demo_commands(&shell)?;

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                },
                Err(e) => {
                    log::warn!("stdin read failed: {e}");
                    break;
                },
            }
        }
    });

    let start = Instant::now();
    terminal::print_prompt(&prompt);
    loop {
        match rx.recv_timeout(FRAME) {
            Ok(line) => {
                shell.submit_line(&line);
                if shell.state() == ExecutionState::Ready && !shell.is_closed() {
                    terminal::print_prompt(&prompt);
                }
            },
            Err(RecvTimeoutError::Timeout) => {},
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("stdin closed");
                shell.exit();
            },
        }

        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let dt = elapsed.saturating_sub(shell.now_ms());
        shell.tick(u32::try_from(dt).unwrap_or(u32::MAX));

        if shell.is_closed() {
            break;
        }
    }

    log::info!("conch exited after {} ms", shell.now_ms());
    Ok(())
}
