//! Text and JSON rendering of command results.

use anyhow::Result;
use serde_json::json;
use trazer_core::auth::AuthState;
use trazer_core::{FilteredView, MessageRecord, SenderShare, SettingsStore};

const NO_ADDRESS: &str = "(no address)";

/// Print the filtered message list.
pub fn print_view(view: &FilteredView, details: bool, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&view.records)?);
        return Ok(());
    }

    println!("Showing {} of {} messages", view.len(), view.total);
    for record in &view.records {
        println!();
        print!("{}", render_record(record, details));
    }
    Ok(())
}

fn render_record(record: &MessageRecord, details: bool) -> String {
    let mut out = format!(
        "[{}] {}  {}\n",
        record.id,
        record.formatted_date(),
        record.address.as_deref().unwrap_or(NO_ADDRESS)
    );
    if let Some(body) = &record.body {
        out.push_str("  ");
        out.push_str(body);
        out.push('\n');
    }
    if details {
        for (label, value) in record.details() {
            out.push_str(&format!("    {label}: {value}\n"));
        }
    }
    out
}

/// Print per-sender counts.
pub fn print_overview(shares: &[SenderShare], total: usize, as_json: bool) -> Result<()> {
    if as_json {
        let rows: Vec<_> = shares
            .iter()
            .map(|s| json!({ "sender": s.sender, "count": s.count, "percent": s.percent }))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "total": total, "senders": rows }))?
        );
        return Ok(());
    }

    println!("{total} messages from {} senders", shares.len());
    for share in shares {
        println!(
            "{:<24} {:>6} {:>6.1}%",
            share.sender, share.count, share.percent
        );
    }
    Ok(())
}

/// Print the saved settings.
pub fn print_settings(store: &SettingsStore, as_json: bool) -> Result<()> {
    let settings = store.settings();
    if as_json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    println!("File:         {}", store.path().display());
    println!("Sender:       {}", or_none(&settings.sender));
    println!("Pattern:      {}", or_none(&settings.regex_pattern));
    println!("Inbox access: {:?}", settings.inbox_access);
    println!(
        "Project:      {}",
        settings.remote.project_id.as_deref().unwrap_or("(none)")
    );
    println!("Collection:   {}", settings.remote.collection);
    Ok(())
}

/// Print sign-in and inbox access state.
pub fn print_status(store: &SettingsStore, auth: &AuthState, as_json: bool) -> Result<()> {
    let user = auth.user();
    if as_json {
        let value = json!({
            "signedIn": auth.is_authenticated(),
            "uid": user.map(|u| &u.uid),
            "email": user.and_then(|u| u.email.as_ref()),
            "inboxAccess": store.settings().inbox_access,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match user {
        Some(user) => println!(
            "Signed in as {}",
            user.email.as_deref().unwrap_or(&user.uid)
        ),
        None => println!("Not signed in"),
    }
    println!("Inbox access: {:?}", store.settings().inbox_access);
    Ok(())
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}
