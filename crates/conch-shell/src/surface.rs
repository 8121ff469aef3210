//! Display surface and window host collaborators.
//!
//! The shell never draws anything itself. It drives a `DisplaySurface`
//! (transcript lines, the input field, colors) and, when opened through
//! `Shell::open`, asks a `WindowHost` to build the window chrome first.

use std::cell::RefCell;
use std::rc::Rc;

use conch_types::color::Color;
use conch_types::config::WindowConfig;
use conch_types::error::Result;

use crate::output::LogLine;

/// Transcript line identifier, unique for the lifetime of a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub u64);

/// Handle to a host-owned display element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Elements created by `WindowHost::create_window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandles {
    /// Element holding the transcript and the input field.
    pub body: SurfaceId,
    pub title: SurfaceId,
}

/// Where transcript lines and the input field live.
pub trait DisplaySurface {
    /// Append a transcript line. `visible` is the part of the line text to
    /// show now; revealed lines start empty and grow through
    /// `append_to_line`. Any timestamp is shown in front of it.
    fn render_line(&mut self, line: &LogLine, visible: &str);

    /// Extend the visible text of a line. Unknown ids are ignored.
    fn append_to_line(&mut self, id: LineId, text: &str);

    fn clear_transcript(&mut self);

    fn scroll_to_end(&mut self);

    fn input_text(&self) -> String;

    fn set_input_text(&mut self, text: &str);

    fn focus_input(&mut self);

    fn set_input_enabled(&mut self, enabled: bool);

    /// Background color, alpha already carrying the window opacity.
    fn set_background(&mut self, color: Color);

    fn set_foreground(&mut self, color: Color);

    /// Remove the window. Called once when the shell exits.
    fn teardown(&mut self);
}

/// Builds window chrome for `Shell::open`.
pub trait WindowHost {
    fn create_window(
        &mut self,
        config: &WindowConfig,
    ) -> Result<(WindowHandles, Box<dyn DisplaySurface>)>;
}

pub(crate) type SharedSurface = Rc<RefCell<Box<dyn DisplaySurface>>>;

/// A line as the memory surface shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub id: LineId,
    /// Timestamp prefix plus the visible text.
    pub text: String,
    pub color: Option<Color>,
}

#[derive(Debug)]
struct MemoryState {
    lines: Vec<RenderedLine>,
    input: String,
    input_enabled: bool,
    focused: bool,
    background: Option<Color>,
    foreground: Option<Color>,
    scrolls: usize,
    torn_down: bool,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            input: String::new(),
            input_enabled: true,
            focused: false,
            background: None,
            foreground: None,
            scrolls: 0,
            torn_down: false,
        }
    }
}

/// In-memory surface for headless hosts and tests.
///
/// Clones share state, so a host can keep one clone for inspection and
/// hand the other to the shell.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    state: Rc<RefCell<MemoryState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible text of every transcript line, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.state.borrow().lines.iter().map(|l| l.text.clone()).collect()
    }

    pub fn rendered(&self) -> Vec<RenderedLine> {
        self.state.borrow().lines.clone()
    }

    pub fn last_line(&self) -> Option<String> {
        self.state.borrow().lines.last().map(|l| l.text.clone())
    }

    pub fn input(&self) -> String {
        self.state.borrow().input.clone()
    }

    pub fn is_input_enabled(&self) -> bool {
        self.state.borrow().input_enabled
    }

    pub fn is_focused(&self) -> bool {
        self.state.borrow().focused
    }

    pub fn background(&self) -> Option<Color> {
        self.state.borrow().background
    }

    pub fn foreground(&self) -> Option<Color> {
        self.state.borrow().foreground
    }

    pub fn scroll_count(&self) -> usize {
        self.state.borrow().scrolls
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.borrow().torn_down
    }
}

impl DisplaySurface for MemorySurface {
    fn render_line(&mut self, line: &LogLine, visible: &str) {
        let text = format!("{}{visible}", line.timestamp().unwrap_or(""));
        self.state.borrow_mut().lines.push(RenderedLine {
            id: line.id(),
            text,
            color: line.color(),
        });
    }

    fn append_to_line(&mut self, id: LineId, text: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(line) = state.lines.iter_mut().find(|l| l.id == id) {
            line.text.push_str(text);
        }
    }

    fn clear_transcript(&mut self) {
        self.state.borrow_mut().lines.clear();
    }

    fn scroll_to_end(&mut self) {
        self.state.borrow_mut().scrolls += 1;
    }

    fn input_text(&self) -> String {
        self.state.borrow().input.clone()
    }

    fn set_input_text(&mut self, text: &str) {
        self.state.borrow_mut().input = text.to_string();
    }

    fn focus_input(&mut self) {
        self.state.borrow_mut().focused = true;
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.input_enabled = enabled;
        if !enabled {
            state.focused = false;
        }
    }

    fn set_background(&mut self, color: Color) {
        self.state.borrow_mut().background = Some(color);
    }

    fn set_foreground(&mut self, color: Color) {
        self.state.borrow_mut().foreground = Some(color);
    }

    fn teardown(&mut self) {
        let mut state = self.state.borrow_mut();
        state.torn_down = true;
        state.input_enabled = false;
        state.focused = false;
    }
}

/// Window host that hands out `MemorySurface`s.
#[derive(Debug, Default)]
pub struct MemoryHost {
    next_id: u64,
    surfaces: Vec<(WindowConfig, MemorySurface)>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface created by the most recent `create_window`.
    pub fn last_surface(&self) -> Option<MemorySurface> {
        self.surfaces.last().map(|(_, s)| s.clone())
    }

    pub fn last_config(&self) -> Option<&WindowConfig> {
        self.surfaces.last().map(|(c, _)| c)
    }

    pub fn window_count(&self) -> usize {
        self.surfaces.len()
    }

    fn allocate(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl WindowHost for MemoryHost {
    fn create_window(
        &mut self,
        config: &WindowConfig,
    ) -> Result<(WindowHandles, Box<dyn DisplaySurface>)> {
        let handles = WindowHandles {
            body: self.allocate(),
            title: self.allocate(),
        };
        let mut surface = MemorySurface::new();
        surface.set_background(config.background().with_opacity(config.opacity));
        surface.set_foreground(config.foreground());
        self.surfaces.push((config.clone(), surface.clone()));
        Ok((handles, Box::new(surface)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::LineKind;

    fn line(id: u64, text: &str) -> LogLine {
        LogLine::new(LineId(id), LineKind::Output, text.to_string(), None, None)
    }

    #[test]
    fn render_and_append() {
        let view = MemorySurface::new();
        let mut surface = view.clone();
        surface.render_line(&line(0, "hello"), "");
        surface.append_to_line(LineId(0), "he");
        surface.append_to_line(LineId(0), "llo");
        assert_eq!(view.lines(), ["hello"]);
    }

    #[test]
    fn append_to_unknown_line_is_ignored() {
        let mut surface = MemorySurface::new();
        surface.render_line(&line(0, "a"), "a");
        surface.append_to_line(LineId(9), "zzz");
        assert_eq!(surface.lines(), ["a"]);
    }

    #[test]
    fn timestamp_is_prefixed() {
        let mut surface = MemorySurface::new();
        let stamped = LogLine::new(
            LineId(0),
            LineKind::Output,
            "x".into(),
            None,
            Some("[01:02:03:04]".into()),
        );
        surface.render_line(&stamped, "x");
        assert_eq!(surface.lines(), ["[01:02:03:04]x"]);
    }

    #[test]
    fn disabling_input_drops_focus() {
        let mut surface = MemorySurface::new();
        surface.focus_input();
        surface.set_input_enabled(false);
        assert!(!surface.is_input_enabled());
        assert!(!surface.is_focused());
    }

    #[test]
    fn host_applies_window_colors() {
        let mut host = MemoryHost::new();
        let config = WindowConfig::default();
        let (handles, _) = host.create_window(&config).unwrap();
        assert_ne!(handles.body, handles.title);
        let surface = host.last_surface().unwrap();
        assert_eq!(surface.background(), Some(Color::BLACK.with_opacity(0.75)));
        assert_eq!(surface.foreground(), Some(Color::WHITE));
        assert_eq!(host.window_count(), 1);
    }
}
