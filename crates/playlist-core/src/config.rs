use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Password-grant credential exchanged once per run for a session token.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default = "default_tenant")]
    pub tenant: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_tenant() -> String {
    "test".to_string()
}

fn default_username() -> String {
    "admin@abp.io".to_string()
}

fn default_password() -> String {
    "User1029#".to_string()
}

fn default_client_id() -> String {
    "Adzup_App".to_string()
}

fn default_scopes() -> Vec<String> {
    [
        "offline_access",
        "openid",
        "profile",
        "email",
        "roles",
        "Adzup",
        "PopManagement",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Credential {
    fn default() -> Self {
        Self {
            tenant: default_tenant(),
            username: default_username(),
            password: default_password(),
            client_id: default_client_id(),
            scopes: default_scopes(),
        }
    }
}

impl Credential {
    /// Space-separated scope string as sent in the token request.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_auth_base")]
    pub auth_base: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Proof-of-play reporting service.
    #[serde(default = "default_pop_base")]
    pub pop_base: String,
}

fn default_auth_base() -> String {
    "https://localhost:44332".to_string()
}

fn default_api_base() -> String {
    "https://localhost:44389".to_string()
}

fn default_pop_base() -> String {
    "https://localhost:7038".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base: default_auth_base(),
            api_base: default_api_base(),
            pop_base: default_pop_base(),
        }
    }
}

// ---------------------------------------------------------------------------
// PlaylistConfig / UrlItemConfig / ScheduleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    #[serde(default = "default_playlist_name")]
    pub name: String,
    #[serde(default = "default_share_of_voice")]
    pub share_of_voice: f64,
    #[serde(default = "default_description")]
    pub description: Option<String>,
}

fn default_playlist_name() -> String {
    "Demo Playlist".to_string()
}

fn default_share_of_voice() -> f64 {
    1.0
}

fn default_description() -> Option<String> {
    Some("Created via public demo".to_string())
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            name: default_playlist_name(),
            share_of_voice: default_share_of_voice(),
            description: default_description(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlItemConfig {
    #[serde(default = "default_url_name")]
    pub name: String,
    #[serde(default = "default_url_value")]
    pub value: String,
    #[serde(default = "default_url_duration")]
    pub duration_secs: u32,
}

fn default_url_name() -> String {
    "Demo URL".to_string()
}

fn default_url_value() -> String {
    "https://example.com".to_string()
}

fn default_url_duration() -> u32 {
    30
}

impl Default for UrlItemConfig {
    fn default() -> Self {
        Self {
            name: default_url_name(),
            value: default_url_value(),
            duration_secs: default_url_duration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence_rule: Option<String>,
}

/// Longest schedule window accepted, in days.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

fn default_window_days() -> i64 {
    7
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            all_day: false,
            recurrence_rule: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credential: Credential,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default = "default_media_path")]
    pub media_path: PathBuf,
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub url_item: UrlItemConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Fixed wait before the overview poll; 0 disables it.
    #[serde(default = "default_poll_delay")]
    pub poll_delay_secs: u64,
    #[serde(default = "default_screen_page_size")]
    pub screen_page_size: u32,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_media_path() -> PathBuf {
    PathBuf::from("sample.jpg")
}

fn default_poll_delay() -> u64 {
    5
}

fn default_screen_page_size() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credential: Credential::default(),
            endpoints: Endpoints::default(),
            media_path: default_media_path(),
            playlist: PlaylistConfig::default(),
            url_item: UrlItemConfig::default(),
            schedule: ScheduleConfig::default(),
            poll_delay_secs: default_poll_delay(),
            screen_page_size: default_screen_page_size(),
            accept_invalid_certs: false,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load a YAML config file; an absent path yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.playlist.name.trim().is_empty() {
            error("playlist.name must not be empty".to_string());
        }
        if self.screen_page_size == 0 {
            error("screen_page_size must be at least 1".to_string());
        }
        if self.schedule.window_days <= 0 || self.schedule.window_days > MAX_WINDOW_DAYS {
            error(format!(
                "schedule.window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                self.schedule.window_days
            ));
        }
        for (key, base) in [
            ("endpoints.auth_base", &self.endpoints.auth_base),
            ("endpoints.api_base", &self.endpoints.api_base),
            ("endpoints.pop_base", &self.endpoints.pop_base),
        ] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                error(format!("{key} must be an http(s) URL, got '{base}'"));
            }
        }

        if self.url_item.duration_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "url_item.duration_secs is 0; the item will not be displayed".to_string(),
            });
        }
        if self.accept_invalid_certs {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "TLS certificate validation is disabled".to_string(),
            });
        }

        warnings
    }
}
