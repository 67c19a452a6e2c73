use crate::cmd::load_session;
use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let session = load_session(root)?;
    if json {
        return print_json(&session.to_save());
    }
    for line in session.status().output {
        println!("{line}");
    }
    Ok(())
}
