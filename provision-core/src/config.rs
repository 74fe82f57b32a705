//! Run settings — a flat map of named string values.
//!
//! # Sources
//!
//! ```text
//! ~/.provision/config.yaml   (optional, or --config PATH)
//! process environment        (same key names, wins over the file)
//! ```
//!
//! Settings are read once at run entry and handed to every component as one
//! immutable [`Settings`] value. A missing required key is a
//! [`ConfigError::Missing`]; nothing performs I/O before validation passes.
//!
//! # API pattern
//!
//! Like the rest of the workspace, loaders come in two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;

use crate::error::ConfigError;
use crate::types::{GroupId, UserId};

// ---------------------------------------------------------------------------
// 1. Keys and defaults
// ---------------------------------------------------------------------------

pub const KEY_TENANT_ID: &str = "GraphTenantId";
pub const KEY_AUTHORITY: &str = "GraphAuthority";
pub const KEY_CLIENT_ID: &str = "GraphClientId";
pub const KEY_CLIENT_SECRET: &str = "GraphClientSecret";
pub const KEY_SCOPE: &str = "GraphScope";
pub const KEY_ENDPOINT: &str = "GraphEndpoint";
pub const KEY_BLOB_STORAGE: &str = "BlobStorage";
pub const KEY_BLOB_CONTAINER: &str = "BlobContainerName";
pub const KEY_BLOB_FILE: &str = "BlobFileName";
pub const KEY_GROUP_ID: &str = "TeamsGroupId";
pub const KEY_EVENT_SENDER: &str = "EventSenderId";
pub const KEY_EVENT_TIME_ZONE: &str = "EventTimeZone";
pub const KEY_EVENT_UTC_OFFSET: &str = "EventUtcOffset";
pub const KEY_TEMPLATE_DIR: &str = "InvitationTemplateDir";
pub const KEY_SYNC_INTERVAL: &str = "SyncIntervalSeconds";
pub const KEY_HTTP_TIMEOUT: &str = "HttpTimeoutSeconds";

/// Every key the loader understands, in documentation order.
pub const ALL_KEYS: &[&str] = &[
    KEY_TENANT_ID,
    KEY_AUTHORITY,
    KEY_CLIENT_ID,
    KEY_CLIENT_SECRET,
    KEY_SCOPE,
    KEY_ENDPOINT,
    KEY_BLOB_STORAGE,
    KEY_BLOB_CONTAINER,
    KEY_BLOB_FILE,
    KEY_GROUP_ID,
    KEY_EVENT_SENDER,
    KEY_EVENT_TIME_ZONE,
    KEY_EVENT_UTC_OFFSET,
    KEY_TEMPLATE_DIR,
    KEY_SYNC_INTERVAL,
    KEY_HTTP_TIMEOUT,
];

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const DEFAULT_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_TIME_ZONE: &str = "Tokyo Standard Time";
pub const DEFAULT_UTC_OFFSET: &str = "+09:00";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// 2. Settings
// ---------------------------------------------------------------------------

/// Where the cursor blob lives.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// Local directory; containers are subdirectories.
    Directory(PathBuf),
    /// HTTP blob service, e.g. `https://acct.blob.core.windows.net`, with an
    /// optional SAS query string appended to every request.
    BlobService {
        account_url: String,
        sas: Option<String>,
    },
}

impl StorageLocation {
    /// Parse the `BlobStorage` value.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.starts_with("https://") || raw.starts_with("http://") {
            let (base, query) = match raw.split_once('?') {
                Some((base, query)) => (base, Some(query)),
                None => (raw, None),
            };
            return Ok(StorageLocation::BlobService {
                account_url: base.trim_end_matches('/').to_owned(),
                sas: query.filter(|q| !q.is_empty()).map(str::to_owned),
            });
        }
        if raw.contains("AccountName=") || raw.contains("UseDevelopmentStorage=") {
            return Err(ConfigError::invalid(
                KEY_BLOB_STORAGE,
                "connection strings are not supported; use an account URL with a SAS token or a local directory",
            ));
        }
        let path = raw.strip_prefix("file://").unwrap_or(raw);
        Ok(StorageLocation::Directory(PathBuf::from(path)))
    }
}

impl fmt::Debug for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Directory(path) => f.debug_tuple("Directory").field(path).finish(),
            StorageLocation::BlobService { account_url, sas } => f
                .debug_struct("BlobService")
                .field("account_url", account_url)
                .field("sas", &sas.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Directory(path) => write!(f, "{}", path.display()),
            StorageLocation::BlobService { account_url, sas } => {
                write!(f, "{account_url}")?;
                if sas.is_some() {
                    write!(f, "?<sas redacted>")?;
                }
                Ok(())
            }
        }
    }
}

/// Immutable configuration for one run.
#[derive(Clone)]
pub struct Settings {
    pub tenant_id: String,
    pub authority: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    /// Directory API root, e.g. `https://graph.microsoft.com/v1.0`.
    pub graph_endpoint: String,
    pub storage: StorageLocation,
    pub container: String,
    pub file_name: String,
    pub group_id: GroupId,
    /// Mailbox that organizes the invitation event.
    pub event_sender_id: UserId,
    pub event_time_zone: String,
    /// Offset used to decide which calendar day "today" is for the run.
    pub event_utc_offset: FixedOffset,
    pub template_dir: Option<PathBuf>,
    pub sync_interval: Duration,
    pub http_timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("tenant_id", &self.tenant_id)
            .field("authority", &self.authority)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("graph_endpoint", &self.graph_endpoint)
            .field("storage", &self.storage)
            .field("container", &self.container)
            .field("file_name", &self.file_name)
            .field("group_id", &self.group_id)
            .field("event_sender_id", &self.event_sender_id)
            .field("event_time_zone", &self.event_time_zone)
            .field("event_utc_offset", &self.event_utc_offset)
            .field("template_dir", &self.template_dir)
            .field("sync_interval", &self.sync_interval)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Settings {
    /// Build settings from a key lookup. The lookup is consulted once per key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing { key });

        // Required keys are checked first so the error names the first gap
        // in documentation order.
        let tenant_id = required(KEY_TENANT_ID)?;
        let client_id = required(KEY_CLIENT_ID)?;
        let client_secret = required(KEY_CLIENT_SECRET)?;
        let storage_raw = required(KEY_BLOB_STORAGE)?;
        let container = required(KEY_BLOB_CONTAINER)?;
        let file_name = required(KEY_BLOB_FILE)?;
        let group_id = required(KEY_GROUP_ID)?;
        let event_sender_id = required(KEY_EVENT_SENDER)?;

        let scopes = parse_scopes(&get(KEY_SCOPE).unwrap_or_else(|| DEFAULT_SCOPE.to_owned()));
        if scopes.is_empty() {
            return Err(ConfigError::invalid(KEY_SCOPE, "no scopes listed"));
        }

        let event_utc_offset = parse_utc_offset(
            &get(KEY_EVENT_UTC_OFFSET).unwrap_or_else(|| DEFAULT_UTC_OFFSET.to_owned()),
        )?;

        Ok(Settings {
            tenant_id,
            authority: get(KEY_AUTHORITY)
                .unwrap_or_else(|| DEFAULT_AUTHORITY.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            client_id,
            client_secret,
            scopes,
            graph_endpoint: get(KEY_ENDPOINT)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            storage: StorageLocation::parse(&storage_raw)?,
            container,
            file_name,
            group_id: GroupId(group_id),
            event_sender_id: UserId(event_sender_id),
            event_time_zone: get(KEY_EVENT_TIME_ZONE)
                .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_owned()),
            event_utc_offset,
            template_dir: get(KEY_TEMPLATE_DIR).map(PathBuf::from),
            sync_interval: Duration::from_secs(parse_seconds(
                KEY_SYNC_INTERVAL,
                get(KEY_SYNC_INTERVAL),
                DEFAULT_SYNC_INTERVAL_SECS,
            )?),
            http_timeout: Duration::from_secs(parse_seconds(
                KEY_HTTP_TIMEOUT,
                get(KEY_HTTP_TIMEOUT),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }

    /// Build settings from file values overlaid with the process environment.
    pub fn from_file_and_env(file: &FileValues) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Load settings rooted at `home`.
    ///
    /// An explicit `path` must exist. Without one, `~/.provision/config.yaml`
    /// is used when present and the environment alone otherwise.
    pub fn load_at(home: &Path, path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => read_file_values(path)?,
            None => {
                let default = config_path_at(home);
                if default.exists() {
                    read_file_values(&default)?
                } else {
                    FileValues::new()
                }
            }
        };
        Self::from_file_and_env(&file)
    }

    /// `load_at` convenience wrapper.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        load_home().and_then(|home| Self::load_at(&home, path))
    }

    /// Key/value pairs suitable for display, with secrets redacted.
    pub fn redacted(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_TENANT_ID, self.tenant_id.clone()),
            (KEY_AUTHORITY, self.authority.clone()),
            (KEY_CLIENT_ID, self.client_id.clone()),
            (KEY_CLIENT_SECRET, "<redacted>".to_owned()),
            (KEY_SCOPE, self.scopes.join(", ")),
            (KEY_ENDPOINT, self.graph_endpoint.clone()),
            (KEY_BLOB_STORAGE, self.storage.to_string()),
            (KEY_BLOB_CONTAINER, self.container.clone()),
            (KEY_BLOB_FILE, self.file_name.clone()),
            (KEY_GROUP_ID, self.group_id.to_string()),
            (KEY_EVENT_SENDER, self.event_sender_id.to_string()),
            (KEY_EVENT_TIME_ZONE, self.event_time_zone.clone()),
            (KEY_EVENT_UTC_OFFSET, self.event_utc_offset.to_string()),
            (
                KEY_TEMPLATE_DIR,
                self.template_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(embedded)".to_owned()),
            ),
            (KEY_SYNC_INTERVAL, self.sync_interval.as_secs().to_string()),
            (KEY_HTTP_TIMEOUT, self.http_timeout.as_secs().to_string()),
        ]
    }
}

// ---------------------------------------------------------------------------
// 3. File values
// ---------------------------------------------------------------------------

/// Scalar values read from the YAML settings file, stringified.
pub type FileValues = BTreeMap<String, String>;

/// `<home>/.provision/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".provision").join("config.yaml")
}

/// Read a flat YAML mapping of settings.
///
/// Scalars (strings, numbers, booleans) are stringified; nested values are
/// rejected so typos such as indenting a key do not silently vanish.
pub fn read_file_values(path: &Path) -> Result<FileValues, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(FileValues::new());
    }
    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut values = FileValues::new();
    for (key, value) in raw {
        let text = match value {
            serde_yaml::Value::Null => continue,
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => {
                let key = ALL_KEYS
                    .iter()
                    .find(|known| **known == key)
                    .copied()
                    .unwrap_or("<unknown>");
                return Err(ConfigError::invalid(key, "expected a scalar value"));
            }
        };
        values.insert(key, text);
    }
    Ok(values)
}

// ---------------------------------------------------------------------------
// 4. Value parsers
// ---------------------------------------------------------------------------

/// Split a `GraphScope` value. Accepts `", "`-separated lists.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`).
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let raw = raw.trim();
    let bad = || ConfigError::invalid(KEY_EVENT_UTC_OFFSET, format!("expected +HH:MM, got '{raw}'"));
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(bad);
    }

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(bad()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(bad)?;
    let hours: i32 = hours.parse().map_err(|_| bad())?;
    let minutes: i32 = minutes.parse().map_err(|_| bad())?;
    if hours > 23 || minutes > 59 {
        return Err(bad());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(bad)
}

fn parse_seconds(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(key, "must be greater than zero")),
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError::invalid(key, format!("expected whole seconds, got '{raw}'"))),
    }
}

fn load_home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
