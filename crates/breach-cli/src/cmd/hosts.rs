use crate::cmd::load_session;
use crate::output::{print_json, print_table};
use breach_core::collab::{ConnectionStore, Discovery, HostRegistry};
use breach_core::content::CredentialSource;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct HostRow<'a> {
    id: &'a str,
    online: bool,
    credentials: Option<CredentialSource>,
    connected: bool,
    description: &'a str,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let session = load_session(root)?;
    let world = session.world();
    let current = world.current_remote_host();

    let rows: Vec<HostRow> = world
        .all_hosts()
        .iter()
        .filter(|h| world.is_host_discovered(&h.id))
        .map(|h| HostRow {
            id: &h.id,
            online: h.is_online,
            credentials: world.get_credentials(&h.id).map(|c| c.source),
            connected: current == Some(h.id.as_str()),
            description: &h.description,
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No hosts discovered. Run 'breach exec scan'.");
        return Ok(());
    }

    let table = rows
        .iter()
        .map(|r| {
            vec![
                format!("{}{}", r.id, if r.connected { " *" } else { "" }),
                if r.online { "online" } else { "offline" }.to_string(),
                match r.credentials {
                    Some(CredentialSource::Cracked) => "cracked",
                    Some(CredentialSource::Bundled) => "bundled",
                    None => "-",
                }
                .to_string(),
                r.description.to_string(),
            ]
        })
        .collect();
    print_table(&["HOST", "STATUS", "CREDS", "DESCRIPTION"], table);
    Ok(())
}
