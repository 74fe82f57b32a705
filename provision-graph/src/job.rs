//! One job execution: settings → adapters → reconciliation run.
//!
//! Order of failure is fixed: configuration and templates are checked before
//! any network I/O, then the token is acquired, then the run starts.

use std::path::Path;

use chrono::{DateTime, Utc};

use provision_core::{Settings, StorageLocation};
use provision_renderer::InvitationRenderer;
use provision_sync::{
    BlobCursorStore, BlobStore, Collaborators, EligibilityPolicy, FileBlobStore, InvitationSchedule,
    Notifier, RunContext, RunReport,
};

use crate::auth::acquire_token;
use crate::blob::HttpBlobStore;
use crate::calendar::GraphCalendar;
use crate::client::{build_agent, GraphClient};
use crate::directory::GraphDirectory;
use crate::error::JobError;
use crate::groups::GraphGroups;

/// The cursor store selected by `BlobStorage`.
pub type ConfiguredCursorStore = BlobCursorStore<Box<dyn BlobStore>>;

/// Open the configured cursor store. Needs no directory credentials.
pub fn open_cursor_store(settings: &Settings) -> ConfiguredCursorStore {
    let blob: Box<dyn BlobStore> = match &settings.storage {
        StorageLocation::Directory(root) => Box::new(FileBlobStore::new(root, &settings.container)),
        StorageLocation::BlobService { account_url, sas } => Box::new(HttpBlobStore::new(
            build_agent(settings.http_timeout),
            account_url,
            &settings.container,
            sas.clone(),
        )),
    };
    BlobCursorStore::new(blob, settings.file_name.clone())
}

/// Load settings from `config_path` (or the default location) and run once.
pub fn execute(config_path: Option<&Path>, now: DateTime<Utc>) -> Result<RunReport, JobError> {
    let settings = Settings::load(config_path)?;
    execute_with(&settings, now)
}

/// Run once with already-loaded settings.
pub fn execute_with(settings: &Settings, now: DateTime<Utc>) -> Result<RunReport, JobError> {
    let renderer = InvitationRenderer::with_overrides(settings.template_dir.as_deref())?;
    let notifier = Notifier::new(
        settings.event_sender_id.clone(),
        InvitationSchedule::from_settings(settings),
        renderer,
    );
    let policy = EligibilityPolicy::default();

    let agent = build_agent(settings.http_timeout);
    let token = acquire_token(&agent, settings).map_err(JobError::Authentication)?;
    let client = GraphClient::new(agent, &settings.graph_endpoint, token);

    let cursor_store = open_cursor_store(settings);
    let directory = GraphDirectory::new(client.clone());
    let groups = GraphGroups::new(client.clone());
    let calendar = GraphCalendar::new(client);

    let ctx = RunContext {
        group: &settings.group_id,
        policy: &policy,
        notifier: &notifier,
        now,
    };
    let io = Collaborators {
        cursor_store: &cursor_store,
        feed: &directory,
        entitlements: &directory,
        membership: &groups,
        calendar: &calendar,
    };
    Ok(provision_sync::run(&ctx, &io)?)
}

/// Emit the single failure line for a job that did not complete.
pub fn log_failure(err: &JobError) {
    match err {
        JobError::Run(failure) => tracing::error!(
            kind = err.kind(),
            state = %failure.state,
            error = %failure.error,
            "provisioning run failed"
        ),
        _ => tracing::error!(kind = err.kind(), error = %err, "provisioning run failed"),
    }
}
