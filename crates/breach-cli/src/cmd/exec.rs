use crate::cmd::{load_session, save_session};
use crate::output::{print_events, print_json, print_result};
use breach_core::events::GameEvent;
use breach_core::CommandResult;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ExecOutput<'a> {
    command: &'a str,
    result: &'a CommandResult,
    events: &'a [GameEvent],
    tick: u64,
}

pub fn run(root: &Path, line: &str, json: bool) -> anyhow::Result<()> {
    let mut session = load_session(root)?;

    let result = session.execute(line);
    let mut events = session.drain_events();
    events.extend(session.run_until_idle());

    if json {
        print_json(&ExecOutput {
            command: line,
            result: &result,
            events: &events,
            tick: session.scheduler().now(),
        })?;
    } else {
        print_result(&result);
        print_events(&events);
    }

    save_session(root, &session)?;

    if !result.success {
        anyhow::bail!("'{line}' failed");
    }
    Ok(())
}
