//! ANSI display surface on stdout.

use std::io::{self, Write};

use conch_shell::{Color, DisplaySurface, LineId, LineKind, LogLine};
use conch_types::config::WindowConfig;

const RESET: &str = "\x1b[0m";
const STAMP: Color = Color::GRAY;

pub fn print_prompt(prompt: &str) {
    let mut out = io::stdout().lock();
    if write!(out, "{prompt} ").and_then(|()| out.flush()).is_err() {
        log::warn!("stdout closed");
    }
}

fn fg(color: Color) -> String {
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

/// Prints transcript lines as they arrive.
///
/// Echoed input is skipped since the terminal already shows what was
/// typed. Revealed characters are only printed while their line is the
/// newest one; a line that is overtaken finishes silently.
pub struct AnsiSurface<W: Write> {
    out: W,
    open_line: Option<LineId>,
    input: String,
    input_enabled: bool,
    foreground: Color,
}

impl AnsiSurface<io::Stdout> {
    pub fn stdout(window: &WindowConfig) -> Self {
        Self::new(io::stdout(), window)
    }
}

impl<W: Write> AnsiSurface<W> {
    pub fn new(out: W, window: &WindowConfig) -> Self {
        Self {
            out,
            open_line: None,
            input: String::new(),
            input_enabled: true,
            foreground: window.foreground(),
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            log::warn!("terminal write failed: {e}");
        }
    }

    fn close_open_line(&mut self) {
        if self.open_line.take().is_some() {
            self.write(&format!("{RESET}\n"));
        }
    }
}

impl<W: Write> DisplaySurface for AnsiSurface<W> {
    fn render_line(&mut self, line: &LogLine, visible: &str) {
        if line.kind() == LineKind::Input {
            return;
        }
        self.close_open_line();
        if let Some(stamp) = line.timestamp() {
            self.write(&format!("{}{stamp}{RESET}", fg(STAMP)));
        }
        let color = fg(line.color().unwrap_or(self.foreground));
        self.write(&format!("{color}{visible}"));
        self.open_line = Some(line.id());
    }

    fn append_to_line(&mut self, id: LineId, text: &str) {
        if self.open_line == Some(id) {
            self.write(text);
        }
    }

    fn clear_transcript(&mut self) {
        self.open_line = None;
        self.write("\x1b[2J\x1b[H");
    }

    fn scroll_to_end(&mut self) {
        if let Err(e) = self.out.flush() {
            log::warn!("terminal flush failed: {e}");
        }
    }

    fn input_text(&self) -> String {
        self.input.clone()
    }

    fn set_input_text(&mut self, text: &str) {
        self.input = text.to_string();
    }

    fn focus_input(&mut self) {}

    fn set_input_enabled(&mut self, enabled: bool) {
        if self.input_enabled != enabled {
            log::debug!("input {}", if enabled { "unlocked" } else { "locked" });
        }
        self.input_enabled = enabled;
    }

    fn set_background(&mut self, color: Color) {
        // Terminals have no alpha; the color is used as-is.
        self.write(&format!("\x1b[48;2;{};{};{}m", color.r, color.g, color.b));
    }

    fn set_foreground(&mut self, color: Color) {
        self.foreground = color;
    }

    fn teardown(&mut self) {
        self.close_open_line();
        self.write(&format!("{RESET}\n"));
        self.scroll_to_end();
    }
}
