//! Built-in commands.
//!
//! The default set (`clear`, `echo`, `uptime`, `exit`, `history`, `sch`,
//! `help`) is reinstalled whenever the registry is cleared. The extras
//! (`date`, `time`, `color`) only exist until the first clear.

use std::rc::Rc;

use conch_types::color::{Color, is_hex_triplet, parse_hex_color};
use conch_types::error::{ConchError, Result};

use crate::context::Context;
use crate::registry::{Command, CommandFuture, CommandRegistry, finished};
use crate::scheduler::{self, SCHEDULER_COMMAND};

pub(crate) fn install_defaults(reg: &mut CommandRegistry) {
    install(reg, Rc::new(ClearCmd));
    install(reg, Rc::new(EchoCmd));
    install(reg, Rc::new(UptimeCmd));
    install(reg, Rc::new(ExitCmd));
    install(reg, Rc::new(HistoryCmd));
    install(reg, Rc::new(SchCmd));
    install(reg, Rc::new(HelpCmd));
}

pub(crate) fn install_extras(reg: &mut CommandRegistry) {
    install(reg, Rc::new(DateCmd));
    install(reg, Rc::new(TimeCmd));
    install(reg, Rc::new(ColorCmd));
}

fn install(reg: &mut CommandRegistry, command: Rc<dyn Command>) {
    if let Err(e) = reg.register(command) {
        log::error!("built-in registration failed: {e}");
    }
}

fn require_args(ctx: &Context, tokens: &[String]) -> bool {
    if tokens.len() > 1 {
        return true;
    }
    let name = tokens.first().map(String::as_str).unwrap_or_default();
    ctx.error(format!("{name} require args"));
    false
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn help(&self) -> &str {
        "clear terminal screen"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, _tokens: Vec<String>) -> CommandFuture {
        ctx.core().clear_screen();
        finished(Ok(()))
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

/// Logs its first argument only; quote to echo several words.
struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn help(&self) -> &str {
        "echo words"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, tokens: Vec<String>) -> CommandFuture {
        if require_args(&ctx, &tokens) {
            ctx.log(tokens[1].clone());
        }
        finished(Ok(()))
    }
}

// ---------------------------------------------------------------------------
// uptime
// ---------------------------------------------------------------------------

struct UptimeCmd;
impl Command for UptimeCmd {
    fn name(&self) -> &str {
        "uptime"
    }
    fn help(&self) -> &str {
        "show uptime in milliseconds"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, _tokens: Vec<String>) -> CommandFuture {
        ctx.log(ctx.now_ms().to_string());
        finished(Ok(()))
    }
}

// ---------------------------------------------------------------------------
// exit
// ---------------------------------------------------------------------------

struct ExitCmd;
impl Command for ExitCmd {
    fn name(&self) -> &str {
        "exit"
    }
    fn help(&self) -> &str {
        "terminate terminal"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, _tokens: Vec<String>) -> CommandFuture {
        let delay = ctx.sleep(u64::from(ctx.config().exit_delay_ms));
        Box::pin(async move {
            delay.await;
            ctx.core().exit();
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct HistoryCmd;
impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn help(&self) -> &str {
        "list history commands"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, _tokens: Vec<String>) -> CommandFuture {
        let listing = ctx
            .core()
            .history
            .borrow()
            .list()
            .collect::<Vec<_>>()
            .join("\n");
        if listing.is_empty() {
            ctx.log("no command in history");
        } else {
            ctx.log(listing);
        }
        finished(Ok(()))
    }
}

// ---------------------------------------------------------------------------
// sch
// ---------------------------------------------------------------------------

struct SchCmd;
impl Command for SchCmd {
    fn name(&self) -> &str {
        SCHEDULER_COMMAND
    }
    fn help(&self) -> &str {
        "schedule a command"
    }
    fn usage(&self) -> &str {
        "sch <time> <command>"
    }
    fn execute(&self, ctx: Context, tokens: Vec<String>) -> CommandFuture {
        let default_ms = u64::from(ctx.config().schedule_default_ms);
        let delay = scheduler::parse_delay_ms(tokens.get(1).map(String::as_str), default_ms);
        let target = tokens.get(2..).map(<[String]>::to_vec).unwrap_or_default();
        finished(scheduler::schedule(ctx.core(), delay, target))
    }
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn help(&self) -> &str {
        "commands & helps"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, _tokens: Vec<String>) -> CommandFuture {
        let listing = ctx.core().registry.borrow().help_listing();
        if listing.is_empty() {
            ctx.log("no command is registered");
        } else {
            let lines: Vec<String> = listing
                .iter()
                .map(|(name, help)| format!("{name}: {help}"))
                .collect();
            ctx.log(lines.join("\n"));
        }
        finished(Ok(()))
    }
}

// ---------------------------------------------------------------------------
// date / time
// ---------------------------------------------------------------------------

struct DateCmd;
impl Command for DateCmd {
    fn name(&self) -> &str {
        "date"
    }
    fn help(&self) -> &str {
        "show date"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, _tokens: Vec<String>) -> CommandFuture {
        let result = ctx.core().time.now().map(|now| ctx.log(now.date_string()));
        finished(result)
    }
}

struct TimeCmd;
impl Command for TimeCmd {
    fn name(&self) -> &str {
        "time"
    }
    fn help(&self) -> &str {
        "show time"
    }
    fn usage(&self) -> &str {
        ""
    }
    fn execute(&self, ctx: Context, _tokens: Vec<String>) -> CommandFuture {
        let result = ctx.core().time.now().map(|now| ctx.log(now.time_string()));
        finished(result)
    }
}

// ---------------------------------------------------------------------------
// color
// ---------------------------------------------------------------------------

/// `color <bg> <fg>`, both six hex digits without `#`. The background
/// keeps the window opacity.
struct ColorCmd;
impl Command for ColorCmd {
    fn name(&self) -> &str {
        "color"
    }
    fn help(&self) -> &str {
        "change terminal color"
    }
    fn usage(&self) -> &str {
        "color <hex color> <hex color>"
    }
    fn execute(&self, ctx: Context, tokens: Vec<String>) -> CommandFuture {
        if !require_args(&ctx, &tokens) {
            return finished(Ok(()));
        }
        let background = tokens.get(1).map(|s| hex_arg(s)).transpose();
        let foreground = tokens.get(2).map(|s| hex_arg(s)).transpose();
        let result = background.and_then(|bg| {
            let fg = foreground?;
            let opacity = ctx.config().window.opacity;
            let mut surface = ctx.core().surface.borrow_mut();
            if let Some(bg) = bg {
                surface.set_background(bg.with_opacity(opacity));
            }
            if let Some(fg) = fg {
                surface.set_foreground(fg);
            }
            Ok(())
        });
        finished(result)
    }
}

fn hex_arg(raw: &str) -> Result<Color> {
    parse_hex_color(raw)
        .filter(|_| is_hex_triplet(raw))
        .ok_or_else(|| ConchError::TypeMismatch(format!("color: '{raw}' is not six hex digits")))
}
