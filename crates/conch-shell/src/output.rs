//! Log requests, the transcript, and output sinks.
//!
//! Handlers never touch the display. They log through their `Context`,
//! which forwards to an `OutputSink`: a `RenderSink` for interactive
//! commands, or a `CaptureSink` when the command runs through
//! `run_command` and its first line is returned instead of shown.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::LocalSpawner;
use futures::task::LocalSpawnExt;

use conch_types::color::Color;
use conch_types::time::TimeService;

use crate::surface::{LineId, SharedSurface};
use crate::timer::TimerQueue;

/// One log request from a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub text: String,
    pub color: Option<Color>,
    /// Reveal this line character by character even outside type mode.
    pub reveal: bool,
}

impl LogEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            reveal: false,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_reveal(mut self, reveal: bool) -> Self {
        self.reveal = reveal;
        self
    }
}

impl From<&str> for LogEntry {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for LogEntry {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Whether a transcript line echoes user input or carries handler output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Input,
    Output,
}

/// A rendered transcript line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    id: LineId,
    kind: LineKind,
    text: String,
    color: Option<Color>,
    timestamp: Option<String>,
}

impl LogLine {
    pub fn new(
        id: LineId,
        kind: LineKind,
        text: String,
        color: Option<Color>,
        timestamp: Option<String>,
    ) -> Self {
        Self {
            id,
            kind,
            text,
            color,
            timestamp,
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// Full text, not counting the timestamp.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// `[HH:MM:SS:ff]` prefix, present when date stamping is on.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

/// Destination for handler output.
pub trait OutputSink {
    fn log(&self, entry: LogEntry);
}

/// Renders every entry to the transcript.
pub struct RenderSink {
    transcript: Rc<Transcript>,
}

impl RenderSink {
    pub(crate) fn new(transcript: Rc<Transcript>) -> Self {
        Self { transcript }
    }
}

impl OutputSink for RenderSink {
    fn log(&self, entry: LogEntry) {
        self.transcript.render(entry, LineKind::Output);
    }
}

/// Keeps the first entry's text and renders the rest.
pub struct CaptureSink {
    captured: RefCell<Option<String>>,
    overflow: RenderSink,
}

impl CaptureSink {
    pub(crate) fn new(transcript: Rc<Transcript>) -> Self {
        Self {
            captured: RefCell::new(None),
            overflow: RenderSink::new(transcript),
        }
    }

    pub fn take(&self) -> Option<String> {
        self.captured.borrow_mut().take()
    }
}

impl OutputSink for CaptureSink {
    fn log(&self, entry: LogEntry) {
        let mut captured = self.captured.borrow_mut();
        if captured.is_none() {
            *captured = Some(entry.text);
        } else {
            drop(captured);
            self.overflow.log(entry);
        }
    }
}

/// Rendering options taken from the shell config.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RenderOptions {
    pub(crate) date_option: bool,
    pub(crate) type_mode: bool,
    pub(crate) reveal_step_ms: u64,
    pub(crate) scroll_settle_ms: u64,
}

/// Transcript model plus the rendering rules that feed the surface.
pub(crate) struct Transcript {
    surface: SharedSurface,
    timers: Rc<TimerQueue>,
    spawner: LocalSpawner,
    time: Rc<dyn TimeService>,
    options: RenderOptions,
    lines: RefCell<Vec<LogLine>>,
    next_id: Cell<u64>,
    closed: Cell<bool>,
}

impl Transcript {
    pub(crate) fn new(
        surface: SharedSurface,
        timers: Rc<TimerQueue>,
        spawner: LocalSpawner,
        time: Rc<dyn TimeService>,
        options: RenderOptions,
    ) -> Self {
        Self {
            surface,
            timers,
            spawner,
            time,
            options,
            lines: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            closed: Cell::new(false),
        }
    }

    /// Add a line to the transcript and paint it.
    ///
    /// Output lines may carry a timestamp. Multi-line text is always painted
    /// at once; otherwise an output line is revealed one character per
    /// `reveal_step_ms` when type mode is on or the entry asks for it.
    /// Echoed input is painted at once and never stamped.
    pub(crate) fn render(&self, entry: LogEntry, kind: LineKind) -> Option<LineId> {
        if self.closed.get() {
            log::debug!("dropping output after exit: {}", entry.text);
            return None;
        }
        let id = LineId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let is_output = kind == LineKind::Output;
        let reveal = is_output
            && (self.options.type_mode || entry.reveal)
            && !entry.text.contains('\n');
        let stamp = if is_output { self.stamp() } else { None };
        let line = LogLine::new(id, kind, entry.text, entry.color, stamp);

        {
            let mut surface = self.surface.borrow_mut();
            surface.render_line(&line, if reveal { "" } else { line.text() });
        }
        if reveal {
            self.spawn_reveal(id, line.text().to_string());
        }
        self.lines.borrow_mut().push(line);
        if is_output {
            self.scroll();
        } else {
            self.surface.borrow_mut().scroll_to_end();
        }
        Some(id)
    }

    pub(crate) fn clear(&self) {
        self.lines.borrow_mut().clear();
        self.surface.borrow_mut().clear_transcript();
    }

    /// Stop rendering. Later log calls are dropped.
    pub(crate) fn close(&self) {
        self.closed.set(true);
        self.clear();
    }

    pub(crate) fn lines(&self) -> Vec<LogLine> {
        self.lines.borrow().clone()
    }

    fn stamp(&self) -> Option<String> {
        if !self.options.date_option {
            return None;
        }
        match self.time.now() {
            Ok(now) => Some(now.log_stamp()),
            Err(e) => {
                log::warn!("clock unavailable, line left unstamped: {e}");
                None
            },
        }
    }

    fn scroll(&self) {
        if !self.options.type_mode {
            self.surface.borrow_mut().scroll_to_end();
            return;
        }
        let settle = self.timers.sleep(self.options.scroll_settle_ms);
        let surface = Rc::clone(&self.surface);
        self.spawn(async move {
            settle.await;
            surface.borrow_mut().scroll_to_end();
        });
    }

    fn spawn_reveal(&self, id: LineId, text: String) {
        let timers = Rc::clone(&self.timers);
        let surface = Rc::clone(&self.surface);
        let step = self.options.reveal_step_ms;
        let start = timers.now_ms();
        self.spawn(async move {
            let mut buf = [0u8; 4];
            for (i, ch) in text.chars().enumerate() {
                timers.sleep_until(start + i as u64 * step).await;
                surface.borrow_mut().append_to_line(id, ch.encode_utf8(&mut buf));
            }
        });
    }

    fn spawn(&self, task: impl std::future::Future<Output = ()> + 'static) {
        if let Err(e) = self.spawner.spawn_local(task) {
            log::error!("render task rejected: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DisplaySurface, MemorySurface};
    use conch_types::time::{FixedClock, WallTime};
    use futures::executor::LocalPool;

    type Fixture = (LocalPool, Rc<TimerQueue>, MemorySurface, Rc<Transcript>);

    fn transcript(options: RenderOptions) -> Fixture {
        let pool = LocalPool::new();
        let timers = Rc::new(TimerQueue::new());
        let view = MemorySurface::new();
        let surface: SharedSurface =
            Rc::new(RefCell::new(Box::new(view.clone()) as Box<dyn DisplaySurface>));
        let t = Rc::new(Transcript::new(
            surface,
            Rc::clone(&timers),
            pool.spawner(),
            Rc::new(FixedClock(WallTime {
                year: 2026,
                month: 1,
                day: 2,
                hour: 3,
                minute: 4,
                second: 5,
                millisecond: 60,
            })),
            options,
        ));
        (pool, timers, view, t)
    }

    fn plain() -> RenderOptions {
        RenderOptions {
            date_option: false,
            type_mode: false,
            reveal_step_ms: 15,
            scroll_settle_ms: 100,
        }
    }

    #[test]
    fn render_assigns_increasing_ids() {
        let (_pool, _timers, view, t) = transcript(plain());
        let a = t.render("a".into(), LineKind::Output).unwrap();
        let b = t.render("b".into(), LineKind::Input).unwrap();
        assert!(b > a);
        assert_eq!(view.lines(), ["a", "b"]);
        assert_eq!(t.lines()[1].kind(), LineKind::Input);
        assert_eq!(view.scroll_count(), 2);
    }

    #[test]
    fn reveal_waits_for_the_clock() {
        let (mut pool, timers, view, t) = transcript(plain());
        t.render(LogEntry::new("abc").with_reveal(true), LineKind::Output);
        assert_eq!(view.lines(), [""]);
        pool.run_until_stalled();
        assert_eq!(view.lines(), ["a"]);
        timers.advance_to(30);
        timers.wake_expired();
        pool.run_until_stalled();
        assert_eq!(view.lines(), ["abc"]);
        assert_eq!(t.lines()[0].text(), "abc");
    }

    #[test]
    fn multiline_text_is_never_revealed() {
        let (_pool, _timers, view, t) = transcript(RenderOptions {
            type_mode: true,
            ..plain()
        });
        t.render("a\nb".into(), LineKind::Output);
        assert_eq!(view.lines(), ["a\nb"]);
    }

    #[test]
    fn type_mode_defers_scroll() {
        let (mut pool, timers, view, t) = transcript(RenderOptions {
            type_mode: true,
            ..plain()
        });
        t.render("x".into(), LineKind::Output);
        pool.run_until_stalled();
        assert_eq!(view.scroll_count(), 0);
        timers.advance_to(100);
        timers.wake_expired();
        pool.run_until_stalled();
        assert_eq!(view.scroll_count(), 1);
    }

    #[test]
    fn date_option_stamps_lines() {
        let (_pool, _timers, view, t) = transcript(RenderOptions {
            date_option: true,
            ..plain()
        });
        t.render("hi".into(), LineKind::Output);
        assert_eq!(t.lines()[0].timestamp(), Some("[03:04:05:60]"));
        assert_eq!(view.lines(), ["[03:04:05:60]hi"]);
    }

    #[test]
    fn echoed_input_is_plain() {
        let (_pool, _timers, view, t) = transcript(RenderOptions {
            date_option: true,
            type_mode: true,
            ..plain()
        });
        t.render("$ls".into(), LineKind::Input);
        assert_eq!(view.lines(), ["$ls"]);
        assert_eq!(t.lines()[0].timestamp(), None);
        assert_eq!(view.scroll_count(), 1);
    }

    #[test]
    fn capture_sink_keeps_first_entry() {
        let (_pool, _timers, view, t) = transcript(plain());
        let sink = CaptureSink::new(Rc::clone(&t));
        sink.log("first".into());
        sink.log("second".into());
        assert_eq!(sink.take().as_deref(), Some("first"));
        assert_eq!(view.lines(), ["second"]);
    }

    #[test]
    fn closed_transcript_drops_output() {
        let (_pool, _timers, view, t) = transcript(plain());
        t.render("before".into(), LineKind::Output);
        t.close();
        assert!(t.render("after".into(), LineKind::Output).is_none());
        assert!(view.lines().is_empty());
    }
}
