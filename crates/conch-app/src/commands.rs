//! Demo commands registered by the terminal host.

use anyhow::Result;

use conch_shell::{Color, Context, Handler, LogEntry, Shell};

pub fn register_demo_commands(shell: &Shell) -> Result<()> {
    shell.add_command("login", Handler::future(login), "log in (demo)", "login")?;
    shell.add_command(
        "whoami",
        Handler::sync(|ctx, _| {
            ctx.log(ctx.config().window.user.clone());
            Ok(())
        }),
        "print the configured user",
        "",
    )?;
    shell.add_command(
        "capture",
        Handler::future(capture),
        "run a command and show what it returned",
        "capture <command> [args...]",
    )?;
    shell.sort_command();
    Ok(())
}

/// Ask for a user name and a masked password, then pretend to check them.
async fn login(ctx: Context, _tokens: Vec<String>) -> conch_shell::Result<()> {
    ctx.log("user:");
    let user = ctx.get_input().await?;
    ctx.log("password:");
    let password = ctx.get_key_input().await?;

    ctx.lock(true);
    ctx.log_entry(LogEntry::new("checking...").with_reveal(true));
    ctx.sleep(600).await;
    ctx.lock(false);

    if password.is_empty() {
        ctx.log_color("empty password rejected", Color::ERROR);
    } else {
        ctx.log(format!("welcome, {user}"));
    }
    Ok(())
}

async fn capture(ctx: Context, tokens: Vec<String>) -> conch_shell::Result<()> {
    let line = tokens.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
    let captured = ctx.run_command(&line).await;
    ctx.log(format!("captured: {captured:?}"));
    Ok(())
}
