//! Capabilities available to a running command.

use std::rc::Rc;

use futures::future::LocalBoxFuture;

use conch_types::color::Color;
use conch_types::config::ShellConfig;
use conch_types::error::Result;

use crate::dispatcher::ExecutionState;
use crate::output::{LogEntry, OutputSink};
use crate::shell::Core;
use crate::timer::Sleep;

/// Resolves with the next submitted line, or fails with `InputClosed` if
/// the shell exits first.
pub type InputFuture = LocalBoxFuture<'static, Result<String>>;

/// Handle a command uses to talk to the shell.
///
/// Cheap to clone. Output goes to the sink the command was started with,
/// so the same handler renders normally from the prompt and has its first
/// line captured when run through `run_command`.
#[derive(Clone)]
pub struct Context {
    core: Rc<Core>,
    sink: Rc<dyn OutputSink>,
}

impl Context {
    pub(crate) fn new(core: Rc<Core>, sink: Rc<dyn OutputSink>) -> Self {
        Self { core, sink }
    }

    pub fn log(&self, text: impl Into<String>) {
        self.sink.log(LogEntry::new(text));
    }

    pub fn log_color(&self, text: impl Into<String>, color: Color) {
        self.sink.log(LogEntry::new(text).with_color(color));
    }

    pub fn log_entry(&self, entry: LogEntry) {
        self.sink.log(entry);
    }

    /// Log in the error color.
    pub fn error(&self, text: impl Into<String>) {
        self.log_color(text, Color::ERROR);
    }

    /// Wait for the next line typed at the prompt.
    ///
    /// Only one request can be pending; a second one fails with
    /// `InputPending`.
    pub fn get_input(&self) -> InputFuture {
        self.core.request_input(ExecutionState::AwaitLine)
    }

    /// Like `get_input`, but keystrokes are masked and never echoed.
    pub fn get_key_input(&self) -> InputFuture {
        self.core.request_input(ExecutionState::AwaitSecret)
    }

    /// Lock or unlock the input field.
    pub fn lock(&self, locked: bool) {
        self.core.lock(locked);
    }

    pub fn sleep(&self, ms: u64) -> Sleep {
        self.core.timers.sleep(ms)
    }

    /// Run a command line and resolve with its first line of output.
    pub fn run_command(&self, line: &str) -> LocalBoxFuture<'static, String> {
        Core::run_command(&self.core, line)
    }

    /// Milliseconds on the shell clock.
    pub fn now_ms(&self) -> u64 {
        self.core.timers.now_ms()
    }

    pub fn config(&self) -> &ShellConfig {
        &self.core.config
    }

    pub(crate) fn core(&self) -> &Rc<Core> {
        &self.core
    }
}
