//! The shell engine and its host-facing API.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use conch_types::color::Color;
use conch_types::config::ShellConfig;
use conch_types::error::{ConchError, Result};
use conch_types::input::{Key, KeyEvent};
use conch_types::time::{LocalClock, TimeService};

use crate::builtins;
use crate::context::{Context, InputFuture};
use crate::dispatcher::{ExecutionState, InputSlot};
use crate::history::HistoryBuffer;
use crate::output::{
    CaptureSink, LineKind, LogEntry, LogLine, OutputSink, RenderOptions, RenderSink, Transcript,
};
use crate::registry::{Command, CommandRegistry, FnCommand, Handler};
use crate::scheduler;
use crate::surface::{DisplaySurface, SharedSurface, WindowHandles, WindowHost};
use crate::timer::TimerQueue;
use crate::tokenizer::tokenize;

/// Rendered (or returned by `run_command`) for names nobody registered.
pub const UNKNOWN_COMMAND: &str = "unknown command executed";

/// State shared by the shell, every `Context`, and every spawned task.
pub(crate) struct Core {
    pub(crate) config: ShellConfig,
    pub(crate) registry: RefCell<CommandRegistry>,
    pub(crate) history: RefCell<HistoryBuffer>,
    pub(crate) input: InputSlot,
    pub(crate) output: Rc<Transcript>,
    pub(crate) surface: SharedSurface,
    pub(crate) timers: Rc<TimerQueue>,
    pub(crate) time: Rc<dyn TimeService>,
    pub(crate) locked: Cell<bool>,
    pub(crate) closed: Cell<bool>,
    spawner: LocalSpawner,
}

impl Core {
    pub(crate) fn render_sink(&self) -> Rc<dyn OutputSink> {
        Rc::new(RenderSink::new(Rc::clone(&self.output)))
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.registry.borrow().get(name)
    }

    pub(crate) fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<()> {
        self.spawner.spawn_local(task).map_err(|e| {
            log::error!("task rejected: {e}");
            ConchError::Spawn(e.to_string())
        })
    }

    /// Run a tokenized line the way the prompt does.
    pub(crate) fn execute(self: &Rc<Self>, tokens: Vec<String>, sink: Rc<dyn OutputSink>) {
        let Some(name) = tokens.first().filter(|t| !t.is_empty()) else {
            return;
        };
        let Some(command) = self.lookup(name) else {
            log::debug!("unknown command '{name}'");
            sink.log(LogEntry::new(UNKNOWN_COMMAND));
            return;
        };
        if wants_help(&tokens) {
            sink.log(LogEntry::new(help_message(command.as_ref())));
            return;
        }

        log::debug!("dispatching '{}' with {} args", command.name(), tokens.len() - 1);
        let ctx = Context::new(Rc::clone(self), sink);
        let run = command.execute(ctx.clone(), tokens);
        let spawned = self.spawn(async move {
            if let Err(e) = run.await {
                log::warn!("command failed: {e}");
                ctx.error(format!("error: {e}"));
            }
        });
        if let Err(e) = spawned {
            let entry = LogEntry::new(format!("error: {e}")).with_color(Color::ERROR);
            self.output.render(entry, LineKind::Output);
        }
    }

    /// Run a line silently and resolve with the first line it logs.
    pub(crate) fn run_command(self: &Rc<Self>, line: &str) -> LocalBoxFuture<'static, String> {
        let core = Rc::clone(self);
        let tokens = tokenize(line);
        async move {
            let name = tokens.first().cloned().unwrap_or_default();
            if name.is_empty() {
                return String::new();
            }
            let Some(command) = core.lookup(&name) else {
                return UNKNOWN_COMMAND.to_string();
            };
            if wants_help(&tokens) {
                return command.usage().to_string();
            }

            let capture = Rc::new(CaptureSink::new(Rc::clone(&core.output)));
            let sink: Rc<dyn OutputSink> = Rc::clone(&capture) as Rc<dyn OutputSink>;
            let result = command.execute(Context::new(Rc::clone(&core), sink), tokens).await;
            match (capture.take(), result) {
                (Some(text), _) => text,
                (None, Ok(())) => String::new(),
                (None, Err(e)) => {
                    log::warn!("'{name}' failed under run_command: {e}");
                    format!("error: {e}")
                },
            }
        }
        .boxed_local()
    }

    pub(crate) fn clear_screen(&self) {
        self.output.clear();
    }

    pub(crate) fn exit(&self) {
        if self.closed.replace(true) {
            return;
        }
        log::info!("shell closed");
        self.input.close();
        self.output.close();
        self.surface.borrow_mut().teardown();
    }

    fn reset_commands(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.clear();
        builtins::install_defaults(&mut registry);
    }
}

/// `tokens[0] != "help"` with a `help` argument, or a `?` anywhere.
fn wants_help(tokens: &[String]) -> bool {
    let asks_help =
        tokens.first().is_some_and(|t| t != "help") && tokens.iter().any(|t| t == "help");
    asks_help || tokens.iter().any(|t| t == "?")
}

fn help_message(command: &dyn Command) -> String {
    if command.usage().is_empty() {
        command.help().to_string()
    } else {
        format!("{}\nusage: {}", command.help(), command.usage())
    }
}

/// An interactive shell bound to one display surface.
///
/// The host feeds it key events and clock ticks; everything else (handler
/// tasks, reveals, scheduled commands) runs inside those calls.
pub struct Shell {
    core: Rc<Core>,
    pool: RefCell<LocalPool>,
    handles: Option<WindowHandles>,
}

impl Shell {
    pub fn new(config: ShellConfig, surface: Box<dyn DisplaySurface>) -> Self {
        Self::with_time_service(config, surface, Rc::new(LocalClock))
    }

    pub fn with_time_service(
        config: ShellConfig,
        surface: Box<dyn DisplaySurface>,
        time: Rc<dyn TimeService>,
    ) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let surface: SharedSurface = Rc::new(RefCell::new(surface));
        let timers = Rc::new(TimerQueue::new());
        let options = RenderOptions {
            date_option: config.date_option,
            type_mode: config.type_mode,
            reveal_step_ms: u64::from(config.reveal_step_ms),
            scroll_settle_ms: u64::from(config.scroll_settle_ms),
        };
        let output = Rc::new(Transcript::new(
            Rc::clone(&surface),
            Rc::clone(&timers),
            spawner.clone(),
            Rc::clone(&time),
            options,
        ));

        let mut registry = CommandRegistry::new();
        builtins::install_defaults(&mut registry);
        builtins::install_extras(&mut registry);
        registry.sort_help_view();

        log::info!(
            "shell ready: {} commands, read_only={}, type_mode={}",
            registry.len(),
            config.read_only,
            config.type_mode
        );

        let core = Rc::new(Core {
            config,
            registry: RefCell::new(registry),
            history: RefCell::new(HistoryBuffer::new()),
            input: InputSlot::default(),
            output,
            surface,
            timers,
            time,
            locked: Cell::new(false),
            closed: Cell::new(false),
            spawner,
        });
        core.surface.borrow_mut().focus_input();

        Self {
            core,
            pool: RefCell::new(pool),
            handles: None,
        }
    }

    /// Build the window through `host`, then start a shell on its surface.
    pub fn open(config: ShellConfig, host: &mut dyn WindowHost) -> Result<Self> {
        let (handles, surface) = host.create_window(&config.window)?;
        log::debug!("window created: body={:?} title={:?}", handles.body, handles.title);
        let mut shell = Self::new(config, surface);
        shell.handles = Some(handles);
        Ok(shell)
    }

    // -- Command registry --

    /// Register a closure command. Ignored when the shell is read-only.
    pub fn add_command(&self, name: &str, handler: Handler, help: &str, usage: &str) -> Result<()> {
        self.register(Rc::new(FnCommand::new(name, handler, help, usage)))
    }

    /// Register a `Command` implementation. Ignored when the shell is
    /// read-only.
    pub fn register(&self, command: Rc<dyn Command>) -> Result<()> {
        if self.core.config.read_only {
            log::debug!("read-only: ignoring registration of '{}'", command.name());
            return Ok(());
        }
        self.core.registry.borrow_mut().register(command).map_err(|e| {
            log::error!("add_command: {e}");
            e
        })
    }

    pub fn remove_command(&self, name: &str) {
        if self.core.config.read_only {
            return;
        }
        if !self.core.registry.borrow_mut().unregister(name) {
            log::debug!("remove_command: '{name}' was not registered");
        }
    }

    /// Drop every command and reinstall the default built-ins.
    pub fn clear_command(&self) {
        if self.core.config.read_only {
            return;
        }
        self.core.reset_commands();
    }

    /// Sort the `help` listing. Execution order is untouched.
    pub fn sort_command(&self) {
        if self.core.config.read_only {
            return;
        }
        self.core.registry.borrow_mut().sort_help_view();
    }

    /// Registered names in registration order.
    pub fn commands(&self) -> Vec<String> {
        self.core.registry.borrow().names()
    }

    /// `(name, help)` pairs in the order `help` prints them.
    pub fn help_listing(&self) -> Vec<(String, String)> {
        self.core.registry.borrow().help_listing()
    }

    // -- Output --

    pub fn log(&self, text: impl Into<String>) {
        self.log_entry(LogEntry::new(text));
    }

    pub fn log_color(&self, text: impl Into<String>, color: Color) {
        self.log_entry(LogEntry::new(text).with_color(color));
    }

    pub fn log_entry(&self, entry: LogEntry) {
        self.core.output.render(entry, LineKind::Output);
        self.pump();
    }

    pub fn transcript(&self) -> Vec<LogLine> {
        self.core.output.lines()
    }

    // -- Input --

    pub fn lock(&self, locked: bool) {
        self.core.lock(locked);
    }

    pub fn is_locked(&self) -> bool {
        self.core.locked.get()
    }

    pub fn get_input(&self) -> InputFuture {
        self.core.request_input(ExecutionState::AwaitLine)
    }

    pub fn get_key_input(&self) -> InputFuture {
        self.core.request_input(ExecutionState::AwaitSecret)
    }

    pub fn state(&self) -> ExecutionState {
        self.core.input.state()
    }

    /// Submitted lines, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.core.history.borrow().entries().to_vec()
    }

    pub fn history_cursor(&self) -> usize {
        self.core.history.borrow().cursor()
    }

    pub fn handle_key_down(&self, event: KeyEvent) {
        self.core.key_down(event);
        self.pump();
    }

    pub fn handle_key_up(&self, event: KeyEvent) {
        self.core.key_up(event);
        self.pump();
    }

    /// Key down followed by key up.
    pub fn press(&self, key: Key) {
        let event = KeyEvent::from(key);
        self.handle_key_down(event);
        self.handle_key_up(event);
    }

    /// Press every character of `text` in turn.
    pub fn type_text(&self, text: &str) {
        for ch in text.chars() {
            let event = KeyEvent::from_char(ch);
            self.core.key_down(event);
            self.core.key_up(event);
        }
        self.pump();
    }

    /// Type `text` and press Enter.
    pub fn submit_line(&self, text: &str) {
        self.type_text(text);
        self.press(Key::Enter);
    }

    // -- Execution --

    /// Run a line without echo or history; resolves with its first line
    /// of output. Drive it with `spawn` or by ticking the shell.
    pub fn run_command(&self, line: &str) -> LocalBoxFuture<'static, String> {
        self.core.run_command(line)
    }

    /// Schedule `tokens` (`[command, args...]`) to run after `delay_ms`.
    pub fn schedule(&self, delay_ms: u64, tokens: Vec<String>) -> Result<()> {
        let armed = scheduler::schedule(&self.core, delay_ms, tokens);
        self.pump();
        armed
    }

    /// Run a future on the shell's task pool.
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<()> {
        self.core.spawn(task)?;
        self.pump();
        Ok(())
    }

    pub fn exit(&self) {
        self.core.exit();
        self.pump();
    }

    pub fn is_closed(&self) -> bool {
        self.core.closed.get()
    }

    // -- Clock --

    /// Advance the clock by `dt_ms`, firing timers in deadline order.
    pub fn tick(&self, dt_ms: u32) {
        let timers = &self.core.timers;
        let target = timers.now_ms().saturating_add(u64::from(dt_ms));
        while let Some(deadline) = timers.next_deadline().filter(|d| *d <= target) {
            timers.advance_to(deadline);
            timers.wake_expired();
            self.pump();
        }
        timers.advance_to(target);
        self.pump();
    }

    /// Milliseconds since the shell was created.
    pub fn now_ms(&self) -> u64 {
        self.core.timers.now_ms()
    }

    /// Deadline of the next pending timer, for hosts that sleep until it.
    pub fn next_deadline(&self) -> Option<u64> {
        self.core.timers.next_deadline()
    }

    pub fn config(&self) -> &ShellConfig {
        &self.core.config
    }

    pub fn handles(&self) -> Option<WindowHandles> {
        self.handles
    }

    /// Poll every task that can make progress.
    ///
    /// Re-entrant calls (a task calling back into the shell) are no-ops;
    /// the outer call picks up whatever they woke.
    fn pump(&self) {
        if let Ok(mut pool) = self.pool.try_borrow_mut() {
            pool.run_until_stalled();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn help_detection() {
        assert!(wants_help(&toks(&["echo", "help"])));
        assert!(wants_help(&toks(&["echo", "?"])));
        assert!(wants_help(&toks(&["help", "?"])));
        assert!(!wants_help(&toks(&["help"])));
        assert!(!wants_help(&toks(&["help", "help"])));
        assert!(!wants_help(&toks(&["echo", "helpful"])));
    }

    #[test]
    fn help_message_appends_usage() {
        let bare = FnCommand::new("a", Handler::sync(|_, _| Ok(())), "does a", "");
        let with_usage =
            FnCommand::new("b", Handler::sync(|_, _| Ok(())), "does b", "b <x>");
        assert_eq!(help_message(&bare), "does a");
        assert_eq!(help_message(&with_usage), "does b\nusage: b <x>");
    }
}
