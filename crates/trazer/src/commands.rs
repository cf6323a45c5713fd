//! Subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use notify_rust::Notification;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use trazer_core::settings::data_dir;
use trazer_core::{
    AppSettings, AuthSession, FirestoreStore, IdentityToolkitProvider, MessageSession,
    PermissionStatus, RemoteConfig, RetryPolicy, SettingsStore, SqliteDocumentStore, SqliteInbox,
    SyncEvent, SyncOutbox, load_inbox, read_inbox, sender_breakdown,
};

use crate::cli::{Cli, Command, MessagesArgs, SettingsAction};
use crate::output;

const MIRROR_FILE: &str = "mirror.db";

/// Run the parsed command.
pub async fn run(cli: Cli) -> Result<()> {
    let mut store = match &cli.settings {
        Some(path) => SettingsStore::load(path).await,
        None => SettingsStore::load_default().await,
    }
    .context("Failed to load settings")?;

    match cli.command {
        Command::Messages(args) => messages(store.settings(), args, cli.json).await,
        Command::Overview { inbox } => overview(store.settings(), &inbox, cli.json).await,
        Command::Settings { action } => settings(&mut store, action, cli.json).await,
        Command::Login { email, password } => {
            let auth = signed_in_capable(store.settings())?;
            let user = auth.sign_in_with_password(&email, &password).await?;
            println!("Signed in as {}", user.email.as_deref().unwrap_or(&user.uid));
            Ok(())
        }
        Command::LoginGoogle { id_token } => {
            let auth = signed_in_capable(store.settings())?;
            let user = auth.sign_in_with_google(&id_token).await?;
            println!("Signed in as {}", user.email.as_deref().unwrap_or(&user.uid));
            Ok(())
        }
        Command::Logout => {
            auth_session(&remote(store.settings()))?.sign_out()?;
            println!("Signed out");
            Ok(())
        }
        Command::Status => {
            let auth = auth_session(&remote(store.settings()))?;
            output::print_status(&store, &auth.state(), cli.json)
        }
    }
}

async fn messages(settings: &AppSettings, args: MessagesArgs, json: bool) -> Result<()> {
    let mut criteria = settings
        .criteria(&args.query)
        .context("Saved regex pattern is invalid")?;
    if let Some(sender) = args.sender {
        criteria.sender = sender;
    }

    let provider = Arc::new(open_inbox(&args.inbox).await?);
    let session = MessageSession::spawn(criteria);

    let outbox = if args.sync {
        Some(firestore_outbox(settings).await?)
    } else if args.local_mirror {
        Some(mirror_outbox().await?)
    } else {
        None
    };
    let notifier = outbox.as_ref().map(|o| notify_failures(o.subscribe()));

    let summary = load_inbox(
        provider,
        settings.clone(),
        session.clone(),
        outbox.as_ref().map(SyncOutbox::sender),
    )
    .await??;

    if summary.is_permission_denied() {
        eprintln!("{}", summary.permission.prompt());
        eprintln!("Run `trazer settings grant` to allow reading the inbox.");
        return Ok(());
    }
    if summary.skipped_count() > 0 {
        warn!("Skipped {} malformed inbox rows", summary.skipped_count());
    }

    let view = session.snapshot().await?;
    output::print_view(&view, args.details, json)?;

    if let Some(outbox) = outbox {
        let stats = outbox.close().await;
        if let Some(notifier) = notifier {
            notifier.await?;
        }
        eprintln!("Synced {} messages, {} failed", stats.synced, stats.failed);
    }
    Ok(())
}

async fn overview(settings: &AppSettings, inbox: &Path, json: bool) -> Result<()> {
    let provider = open_inbox(inbox).await?;
    let summary = read_inbox(&provider, settings).await?;
    if summary.is_permission_denied() {
        eprintln!("{}", summary.permission.prompt());
        return Ok(());
    }
    output::print_overview(&sender_breakdown(&summary.records), summary.records.len(), json)
}

async fn settings(store: &mut SettingsStore, action: SettingsAction, json: bool) -> Result<()> {
    match action {
        SettingsAction::Show => return output::print_settings(store, json),
        SettingsAction::Sender { value } => store.save_sender(value).await?,
        SettingsAction::Pattern { value } => store.save_regex_pattern(value).await?,
        SettingsAction::Grant => store.set_inbox_access(PermissionStatus::Granted).await?,
        SettingsAction::Revoke => store.set_inbox_access(PermissionStatus::Denied).await?,
    }
    println!("Settings saved to {}", store.path().display());
    Ok(())
}

async fn open_inbox(path: &Path) -> Result<SqliteInbox> {
    let path_str = path.to_str().context("Inbox path is not valid UTF-8")?;
    SqliteInbox::open(path_str)
        .await
        .with_context(|| format!("Failed to open inbox database {}", path.display()))
}

fn remote(settings: &AppSettings) -> RemoteConfig {
    settings.remote.clone().with_env_overrides()
}

fn auth_session(remote: &RemoteConfig) -> Result<AuthSession<IdentityToolkitProvider>> {
    let provider = IdentityToolkitProvider::new(remote.api_key.clone().unwrap_or_default());
    Ok(AuthSession::restore(provider)?)
}

/// Session whose provider has an API key to sign in with.
fn signed_in_capable(settings: &AppSettings) -> Result<AuthSession<IdentityToolkitProvider>> {
    let remote = remote(settings);
    if remote.api_key.is_none() {
        bail!("No Firebase API key configured; set TRAZER_API_KEY or remote.apiKey");
    }
    auth_session(&remote)
}

async fn firestore_outbox(settings: &AppSettings) -> Result<SyncOutbox> {
    let remote = remote(settings);
    let project_id = remote
        .project_id
        .clone()
        .context("No Firebase project configured; set TRAZER_PROJECT_ID or remote.projectId")?;
    let auth = auth_session(&remote)?;
    if !auth.is_authenticated() {
        bail!("Not signed in; run `trazer login` first");
    }
    auth.ensure_fresh().await?;

    info!("Syncing to Firestore project {project_id}");
    let store = Arc::new(FirestoreStore::new(project_id, auth.subscribe()));
    Ok(SyncOutbox::spawn(
        store,
        remote.collection,
        RetryPolicy::default(),
    ))
}

async fn mirror_outbox() -> Result<SyncOutbox> {
    let dir = data_dir();
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(MIRROR_FILE);
    let path_str = path.to_str().context("Data directory is not valid UTF-8")?;
    let store = Arc::new(SqliteDocumentStore::new(path_str).await?);
    info!("Syncing to local mirror {}", path.display());
    Ok(SyncOutbox::spawn(
        store,
        trazer_core::sync::DEFAULT_COLLECTION,
        RetryPolicy::default(),
    ))
}

/// Show a desktop notification for every record the outbox gives up on.
fn notify_failures(mut events: broadcast::Receiver<SyncEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SyncEvent::Failed { id, error, .. }) => {
                    let shown = Notification::new()
                        .summary("Trazer sync failed")
                        .body(&format!("Message {id}: {error}"))
                        .show();
                    if let Err(e) = shown {
                        warn!("Could not show notification: {e}");
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Missed {missed} sync events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
