//! Command trait and registry.

use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use conch_types::error::{ConchError, Result};

use crate::context::Context;

/// Future returned by a command handler. Output goes through the
/// `Context`; the `Result` only carries failure.
pub type CommandFuture = LocalBoxFuture<'static, Result<()>>;

/// Wrap an already-computed result as a `CommandFuture`.
pub fn finished(result: Result<()>) -> CommandFuture {
    future::ready(result).boxed_local()
}

/// A shell command (built-in or registered by the host).
pub trait Command {
    /// Name used to invoke the command (lowercased on registration).
    fn name(&self) -> &str;

    /// One-line description shown by `help`.
    fn help(&self) -> &str;

    /// Usage string shown by `<name> help`. May be empty.
    fn usage(&self) -> &str;

    /// Run the command. `tokens[0]` is the command name as typed.
    fn execute(&self, ctx: Context, tokens: Vec<String>) -> CommandFuture;
}

/// Closure form of a command handler.
#[derive(Clone)]
pub enum Handler {
    /// Runs to completion when dispatched.
    Sync(Rc<dyn Fn(&Context, &[String]) -> Result<()>>),
    /// Runs on the shell's task pool and may await input, sleeps, or
    /// other commands.
    Async(Rc<dyn Fn(Context, Vec<String>) -> CommandFuture>),
}

impl Handler {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Context, &[String]) -> Result<()> + 'static,
    {
        Self::Sync(Rc::new(f))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, Vec<String>) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        Self::Async(Rc::new(move |ctx, tokens| f(ctx, tokens).boxed_local()))
    }

    fn call(&self, ctx: Context, tokens: Vec<String>) -> CommandFuture {
        match self {
            Self::Sync(f) => finished(f(&ctx, &tokens)),
            Self::Async(f) => f(ctx, tokens),
        }
    }
}

/// A command built from a name, a `Handler`, and help strings.
pub struct FnCommand {
    name: String,
    handler: Handler,
    help: String,
    usage: String,
}

impl FnCommand {
    pub fn new(
        name: impl Into<String>,
        handler: Handler,
        help: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_lowercase(),
            handler,
            help: help.into(),
            usage: usage.into(),
        }
    }
}

impl Command for FnCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }

    fn usage(&self) -> &str {
        &self.usage
    }

    fn execute(&self, ctx: Context, tokens: Vec<String>) -> CommandFuture {
        self.handler.call(ctx, tokens)
    }
}

struct Entry {
    key: String,
    command: Rc<dyn Command>,
}

/// Commands keyed by lowercased name.
///
/// Two orderings are kept: execution entries stay in registration order,
/// while the help view can be sorted alphabetically without touching
/// them. Re-registering a name replaces the command in place.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<Entry>,
    help_view: Vec<String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Rc<dyn Command>) -> Result<()> {
        let key = command.name().to_lowercase();
        if key.is_empty() {
            return Err(ConchError::Argument(
                "command name must not be empty".to_string(),
            ));
        }
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.command = command,
            None => {
                self.help_view.push(key.clone());
                self.entries.push(Entry { key, command });
            },
        }
        Ok(())
    }

    /// Remove a command. Returns whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let key = name.to_lowercase();
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        self.help_view.retain(|k| *k != key);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.help_view.clear();
    }

    /// Sort the help listing alphabetically.
    pub fn sort_help_view(&mut self) {
        self.help_view.sort();
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Command>> {
        let key = name.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| Rc::clone(&e.command))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Command names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    /// `(name, help)` pairs in help-view order.
    pub fn help_listing(&self) -> Vec<(String, String)> {
        self.help_view
            .iter()
            .filter_map(|key| {
                self.entries
                    .iter()
                    .find(|e| e.key == *key)
                    .map(|e| (key.clone(), e.command.help().to_string()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str, help: &str) -> Rc<dyn Command> {
        Rc::new(FnCommand::new(name, Handler::sync(|_, _| Ok(())), help, ""))
    }

    #[test]
    fn register_and_get_is_case_insensitive() {
        let mut reg = CommandRegistry::new();
        reg.register(noop("Greet", "say hi")).unwrap();
        assert!(reg.contains("greet"));
        assert!(reg.contains("GREET"));
        assert_eq!(reg.get("greet").unwrap().help(), "say hi");
        assert_eq!(reg.names(), ["greet"]);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut reg = CommandRegistry::new();
        let err = reg.register(noop("", "nothing")).unwrap_err();
        assert!(matches!(err, ConchError::Argument(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn reregister_replaces_in_place() {
        let mut reg = CommandRegistry::new();
        reg.register(noop("a", "first")).unwrap();
        reg.register(noop("b", "other")).unwrap();
        reg.register(noop("a", "second")).unwrap();
        assert_eq!(reg.names(), ["a", "b"]);
        assert_eq!(reg.get("a").unwrap().help(), "second");
        assert_eq!(reg.help_listing().len(), 2);
    }

    #[test]
    fn sort_only_reorders_help() {
        let mut reg = CommandRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            reg.register(noop(name, name)).unwrap();
        }
        reg.sort_help_view();
        let help: Vec<String> = reg.help_listing().into_iter().map(|(n, _)| n).collect();
        assert_eq!(help, ["alpha", "mid", "zeta"]);
        assert_eq!(reg.names(), ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn unregister_removes_from_both_views() {
        let mut reg = CommandRegistry::new();
        reg.register(noop("a", "a")).unwrap();
        reg.register(noop("b", "b")).unwrap();
        assert!(reg.unregister("A"));
        assert!(!reg.unregister("a"));
        assert_eq!(reg.names(), ["b"]);
        assert_eq!(reg.help_listing(), [("b".to_string(), "b".to_string())]);
    }

    #[test]
    fn clear_empties_registry() {
        let mut reg = CommandRegistry::new();
        reg.register(noop("a", "a")).unwrap();
        reg.clear();
        assert!(reg.is_empty());
        assert!(reg.help_listing().is_empty());
    }

    #[test]
    fn finished_future_resolves_immediately() {
        let result = futures::executor::block_on(finished(Err(ConchError::InputClosed)));
        assert!(matches!(result, Err(ConchError::InputClosed)));
    }
}
