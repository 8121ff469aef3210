//! One-shot delayed command execution (`sch`).

use std::rc::Rc;

use conch_types::error::{ConchError, Result};

use crate::context::Context;
use crate::shell::Core;

/// Name of the scheduling command. It cannot schedule itself.
pub const SCHEDULER_COMMAND: &str = "sch";

/// Convert a delay in seconds to milliseconds.
///
/// Missing, unparsable, non-finite, or zero delays fall back to
/// `default_ms`. Negative delays clamp to zero.
pub fn parse_delay_ms(raw: Option<&str>, default_ms: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .map(|secs| secs * 1000.0)
        .filter(|ms| ms.is_finite() && *ms != 0.0)
        .map_or(default_ms, |ms| ms.max(0.0).round() as u64)
}

/// Arm a timer that runs `tokens` (`[command, args...]`) after `delay_ms`.
///
/// The target must be registered now; it is looked up again when the
/// timer fires and the firing is skipped if it has gone.
pub(crate) fn schedule(core: &Rc<Core>, delay_ms: u64, tokens: Vec<String>) -> Result<()> {
    let target = tokens
        .first()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConchError::Argument("sch: no command to schedule".to_string()))?;
    if target == SCHEDULER_COMMAND {
        return Err(ConchError::Argument("sch: cannot schedule itself".to_string()));
    }
    if !core.registry.borrow().contains(&target) {
        return Err(ConchError::Argument(format!("sch: '{target}' is not registered")));
    }

    log::debug!("scheduling '{target}' in {delay_ms} ms");
    let sleep = core.timers.sleep(delay_ms);
    let fired = Rc::clone(core);
    core.spawn(async move {
        sleep.await;
        if fired.closed.get() {
            return;
        }
        let Some(command) = fired.lookup(&target) else {
            log::warn!("scheduled command '{target}' was removed before it fired");
            return;
        };
        log::debug!("firing scheduled '{target}'");
        let ctx = Context::new(Rc::clone(&fired), fired.render_sink());
        if let Err(e) = command.execute(ctx.clone(), tokens).await {
            log::warn!("scheduled '{target}' failed: {e}");
            ctx.error(format!("error: {e}"));
        }
    })
}
