//! Key event dispatch and pending input requests.
//!
//! The dispatcher is a three-state machine. In `Ready` the Enter key
//! submits the line as a command. A handler that calls `get_input` or
//! `get_key_input` moves it to `AwaitLine` or `AwaitSecret`, and the next
//! Enter resolves that request instead of running anything. Secret input
//! is collected on key-up and only a mask is ever painted.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future;

use conch_types::error::{ConchError, Result};
use conch_types::input::{Key, KeyEvent};

use crate::context::InputFuture;
use crate::output::{LineKind, LogEntry};
use crate::shell::Core;
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    /// Enter submits the line as a command.
    #[default]
    Ready,
    /// Enter resolves a pending `get_input`.
    AwaitLine,
    /// Enter resolves a pending `get_key_input`.
    AwaitSecret,
}

/// The single outstanding input request, if any.
#[derive(Debug, Default)]
pub(crate) struct InputSlot {
    state: Cell<ExecutionState>,
    pending: RefCell<Option<oneshot::Sender<String>>>,
    secret: RefCell<String>,
}

impl InputSlot {
    pub(crate) fn state(&self) -> ExecutionState {
        self.state.get()
    }

    fn open(&self, state: ExecutionState) -> Result<oneshot::Receiver<String>> {
        let mut pending = self.pending.borrow_mut();
        if pending.as_ref().is_some_and(|tx| !tx.is_canceled()) {
            return Err(ConchError::InputPending);
        }
        let (tx, rx) = oneshot::channel();
        *pending = Some(tx);
        self.secret.borrow_mut().clear();
        self.state.set(state);
        Ok(rx)
    }

    fn resolve(&self, value: String) {
        self.state.set(ExecutionState::Ready);
        let Some(tx) = self.pending.borrow_mut().take() else {
            log::warn!("input submitted with no pending request");
            return;
        };
        if tx.send(value).is_err() {
            log::debug!("input request was abandoned before it resolved");
        }
    }

    /// Drop any pending request; its future fails with `InputClosed`.
    pub(crate) fn close(&self) {
        self.state.set(ExecutionState::Ready);
        self.pending.borrow_mut().take();
        self.secret.borrow_mut().clear();
    }

    fn secret_len(&self) -> usize {
        self.secret.borrow().chars().count()
    }
}

impl Core {
    pub(crate) fn request_input(&self, state: ExecutionState) -> InputFuture {
        if self.closed.get() {
            return future::ready(Err(ConchError::InputClosed)).boxed_local();
        }
        let rx = match self.input.open(state) {
            Ok(rx) => rx,
            Err(e) => {
                log::warn!("input request refused: {e}");
                return future::ready(Err(e)).boxed_local();
            },
        };
        log::debug!("awaiting input ({state:?})");
        self.surface.borrow_mut().set_input_text("");
        async move { rx.await.map_err(|_| ConchError::InputClosed) }.boxed_local()
    }

    pub(crate) fn lock(&self, locked: bool) {
        self.locked.set(locked);
        let mut surface = self.surface.borrow_mut();
        surface.set_input_enabled(!locked);
        if !locked {
            surface.focus_input();
        }
    }

    pub(crate) fn key_down(self: &Rc<Self>, event: KeyEvent) {
        if self.closed.get() || self.locked.get() {
            return;
        }
        let state = self.input.state();
        match event.key {
            Key::Enter => self.enter(state),
            _ if state == ExecutionState::AwaitSecret => {},
            Key::ArrowLeft | Key::ArrowRight | Key::Home | Key::End | Key::Other => {},
            Key::ArrowUp if state == ExecutionState::Ready => {
                let recalled = self.history.borrow_mut().navigate_up().map(str::to_string);
                if let Some(line) = recalled {
                    self.show_recalled(&line);
                }
            },
            Key::ArrowDown if state == ExecutionState::Ready => {
                let recalled = self.history.borrow_mut().navigate_down().map(str::to_string);
                if let Some(line) = recalled {
                    self.show_recalled(&line);
                }
            },
            Key::ArrowUp | Key::ArrowDown => {},
            Key::Char(ch) => {
                let mut surface = self.surface.borrow_mut();
                let mut text = surface.input_text();
                text.push(ch);
                surface.set_input_text(&text);
            },
            Key::Backspace => {
                let mut surface = self.surface.borrow_mut();
                let mut text = surface.input_text();
                text.pop();
                surface.set_input_text(&text);
            },
        }
    }

    pub(crate) fn key_up(&self, event: KeyEvent) {
        if self.closed.get() || self.locked.get() {
            return;
        }
        if self.input.state() != ExecutionState::AwaitSecret {
            return;
        }
        match event.key {
            Key::Backspace => {
                self.input.secret.borrow_mut().pop();
            },
            Key::Char(ch) if !ch.is_whitespace() && !ch.is_control() => {
                let mut secret = self.input.secret.borrow_mut();
                if event.shift {
                    secret.extend(ch.to_uppercase());
                } else {
                    secret.extend(ch.to_lowercase());
                }
            },
            _ => return,
        }
        let mask = self
            .config
            .mask_char
            .to_string()
            .repeat(self.input.secret_len());
        self.surface.borrow_mut().set_input_text(&mask);
    }

    fn enter(self: &Rc<Self>, state: ExecutionState) {
        match state {
            ExecutionState::Ready => self.submit(),
            ExecutionState::AwaitLine => {
                let line = self.take_input_text();
                self.input.resolve(line);
            },
            ExecutionState::AwaitSecret => {
                let secret = std::mem::take(&mut *self.input.secret.borrow_mut());
                self.take_input_text();
                self.input.resolve(secret);
            },
        }
    }

    /// Echo the typed line, record it, and run it.
    fn submit(self: &Rc<Self>) {
        let line = self.surface.borrow().input_text();
        self.output.render(
            LogEntry::new(format!("{}{line}", self.config.prompt)),
            LineKind::Input,
        );
        self.history.borrow_mut().push(&line);
        let tokens = tokenize(&line);
        log::debug!("submitted {tokens:?}");
        self.execute(tokens, self.render_sink());
        self.surface.borrow_mut().set_input_text("");
    }

    fn take_input_text(&self) -> String {
        let mut surface = self.surface.borrow_mut();
        let text = surface.input_text();
        surface.set_input_text("");
        text
    }

    fn show_recalled(&self, line: &str) {
        let mut surface = self.surface.borrow_mut();
        surface.set_input_text(line);
        surface.focus_input();
    }
}
