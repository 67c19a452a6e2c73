use crate::cmd::{load_session, save_session};
use crate::output::{print_events, print_result};
use breach_core::Session;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

pub fn run(root: &Path) -> anyhow::Result<()> {
    let mut session = load_session(root)?;
    let tick = Duration::from_millis(session.config().tick_millis);
    let prompt = session.config().prompt.clone();

    println!("breach: difficulty {}. Type 'help' for commands, 'quit' or Ctrl-D to leave.", session.difficulty());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first interval tick completes immediately.
        ticker.tick().await;
        show_prompt(&prompt);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if matches!(line.trim(), "quit" | "logout") {
                        break;
                    }
                    handle_line(root, &mut session, &line)?;
                    show_prompt(&prompt);
                }
                _ = ticker.tick() => {
                    let events = session.advance(1);
                    if !events.is_empty() {
                        println!();
                        print_events(&events);
                        show_prompt(&prompt);
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        anyhow::Ok(())
    })?;

    // Finish in-flight work before the final save; reservations are not persisted.
    if !session.scheduler().is_idle() {
        println!("\nWaiting for {} running action(s)...", session.scheduler().pending_count());
        print_events(&session.run_until_idle());
    }
    save_session(root, &session)?;
    println!("Game saved.");
    Ok(())
}

fn handle_line(root: &Path, session: &mut Session, line: &str) -> anyhow::Result<()> {
    let result = session.execute(line);
    print_result(&result);
    print_events(&session.drain_events());
    if result.success && session.scheduler().is_idle() {
        save_session(root, session)?;
    }
    Ok(())
}

fn show_prompt(prompt: &str) {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
}
