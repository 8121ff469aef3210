//! Command shell engine.
//!
//! The shell is a registry-based dispatch system driven by key events.
//! Commands implement the `Command` trait (or wrap a closure in a
//! `Handler`) and are registered by name. The dispatcher tokenizes the
//! submitted line, resolves the command name, and runs the handler on a
//! single-threaded task pool. Handlers may suspend on `Context::get_input`
//! or `Context::get_key_input`; the next Enter key resolves the request.
//!
//! Time only moves when the host calls `Shell::tick`, so scheduled
//! commands, character reveals, and handler sleeps are deterministic.

mod builtins;
mod context;
mod dispatcher;
pub mod history;
pub mod output;
pub mod registry;
pub mod scheduler;
mod shell;
pub mod surface;
pub mod timer;
pub mod tokenizer;


/// Capability bundle handed to every command handler.
pub use context::{Context, InputFuture};
/// Dispatcher state (ready, or awaiting a line / secret line).
pub use dispatcher::ExecutionState;
/// Command history with a navigation cursor.
pub use history::HistoryBuffer;
/// Log requests, transcript lines, and output sinks.
pub use output::{LineKind, LogEntry, LogLine, OutputSink};
/// Command trait, closure handlers, and the registry.
pub use registry::{Command, CommandFuture, CommandRegistry, FnCommand, Handler, finished};
/// The shell engine.
pub use shell::{Shell, UNKNOWN_COMMAND};
/// Display and window collaborators.
pub use surface::{
    DisplaySurface, LineId, MemoryHost, MemorySurface, SurfaceId, WindowHandles, WindowHost,
};
/// Virtual clock and sleep futures.
pub use timer::{Sleep, TimerQueue};
/// Line tokenizer.
pub use tokenizer::tokenize;

pub use conch_types::color::Color;
pub use conch_types::config::{ShellConfig, WindowConfig};
pub use conch_types::error::{ConchError, Result};
pub use conch_types::input::{Key, KeyEvent};
