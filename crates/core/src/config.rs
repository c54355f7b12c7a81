use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::DedupPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "kodi-voice.toml";
pub const FALLBACK_CONFIG_FILE: &str = "config/kodi-voice.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub kodi: KodiConfig,
    pub dialog: DialogConfig,
    pub resolver: ResolverConfig,
    pub navigation: NavigationConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct KodiConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub tls: bool,
}

impl KodiConfig {
    pub fn endpoint(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}:{}/jsonrpc", self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct DialogConfig {
    pub cinemavision_addon_id: String,
    pub volume_ceiling: u8,
}

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub dedup: DedupPolicy,
}

#[derive(Clone, Debug)]
pub struct NavigationConfig {
    /// Pause between repeated directional presses.
    pub repeat_pause_ms: u64,
    pub max_repeat: u32,
}

#[derive(Clone, Debug)]
pub struct NotificationsConfig {
    /// Initial value of the session toggle.
    pub enabled: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub kodi_host: Option<String>,
    pub kodi_port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            kodi: KodiConfig {
                host: "localhost".to_string(),
                port: 8080,
                username: None,
                password: None,
                tls: false,
            },
            dialog: DialogConfig {
                cinemavision_addon_id: "script.cinemavision".to_string(),
                volume_ceiling: 100,
            },
            resolver: ResolverConfig { dedup: DedupPolicy::Normalized },
            navigation: NavigationConfig { repeat_pause_ms: 300, max_repeat: 10 },
            notifications: NotificationsConfig { enabled: false },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(kodi) = patch.kodi {
            if let Some(host) = kodi.host {
                self.kodi.host = host;
            }
            if let Some(port) = kodi.port {
                self.kodi.port = port;
            }
            if let Some(username) = kodi.username {
                self.kodi.username = Some(username);
            }
            if let Some(password) = kodi.password {
                self.kodi.password = Some(secret_value(password));
            }
            if let Some(tls) = kodi.tls {
                self.kodi.tls = tls;
            }
        }

        if let Some(dialog) = patch.dialog {
            if let Some(addon_id) = dialog.cinemavision_addon_id {
                self.dialog.cinemavision_addon_id = addon_id;
            }
            if let Some(volume_ceiling) = dialog.volume_ceiling {
                self.dialog.volume_ceiling = volume_ceiling;
            }
        }

        if let Some(resolver) = patch.resolver {
            if let Some(dedup) = resolver.dedup {
                self.resolver.dedup = dedup;
            }
        }

        if let Some(navigation) = patch.navigation {
            if let Some(repeat_pause_ms) = navigation.repeat_pause_ms {
                self.navigation.repeat_pause_ms = repeat_pause_ms;
            }
            if let Some(max_repeat) = navigation.max_repeat {
                self.navigation.max_repeat = max_repeat;
            }
        }

        if let Some(notifications) = patch.notifications {
            if let Some(enabled) = notifications.enabled {
                self.notifications.enabled = enabled;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("KODI_VOICE_KODI_HOST") {
            self.kodi.host = value;
        }
        if let Some(value) = read_env("KODI_VOICE_KODI_PORT") {
            self.kodi.port = parse_u16("KODI_VOICE_KODI_PORT", &value)?;
        }
        if let Some(value) = read_env("KODI_VOICE_KODI_USERNAME") {
            self.kodi.username = Some(value);
        }
        if let Some(value) = read_env("KODI_VOICE_KODI_PASSWORD") {
            self.kodi.password = Some(secret_value(value));
        }
        if let Some(value) = read_env("KODI_VOICE_KODI_TLS") {
            self.kodi.tls = parse_bool("KODI_VOICE_KODI_TLS", &value)?;
        }

        if let Some(value) = read_env("KODI_VOICE_DIALOG_CINEMAVISION_ADDON_ID") {
            self.dialog.cinemavision_addon_id = value;
        }
        if let Some(value) = read_env("KODI_VOICE_DIALOG_VOLUME_CEILING") {
            self.dialog.volume_ceiling = parse_u8("KODI_VOICE_DIALOG_VOLUME_CEILING", &value)?;
        }

        if let Some(value) = read_env("KODI_VOICE_RESOLVER_DEDUP") {
            self.resolver.dedup =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "KODI_VOICE_RESOLVER_DEDUP".to_string(),
                    value: value.clone(),
                })?;
        }

        if let Some(value) = read_env("KODI_VOICE_NAVIGATION_REPEAT_PAUSE_MS") {
            self.navigation.repeat_pause_ms =
                parse_u64("KODI_VOICE_NAVIGATION_REPEAT_PAUSE_MS", &value)?;
        }
        if let Some(value) = read_env("KODI_VOICE_NAVIGATION_MAX_REPEAT") {
            self.navigation.max_repeat = parse_u32("KODI_VOICE_NAVIGATION_MAX_REPEAT", &value)?;
        }

        if let Some(value) = read_env("KODI_VOICE_NOTIFICATIONS_ENABLED") {
            self.notifications.enabled = parse_bool("KODI_VOICE_NOTIFICATIONS_ENABLED", &value)?;
        }

        let log_level =
            read_env("KODI_VOICE_LOGGING_LEVEL").or_else(|| read_env("KODI_VOICE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("KODI_VOICE_LOGGING_FORMAT").or_else(|| read_env("KODI_VOICE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.kodi_host {
            self.kodi.host = host;
        }
        if let Some(port) = overrides.kodi_port {
            self.kodi.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(enabled) = overrides.notifications_enabled {
            self.notifications.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_kodi(&self.kodi)?;
        validate_dialog(&self.dialog)?;
        validate_navigation(&self.navigation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Path that `AppConfig::load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(FALLBACK_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_kodi(kodi: &KodiConfig) -> Result<(), ConfigError> {
    let host = kodi.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation("kodi.host is required".to_string()));
    }
    if host.contains("://") || host.contains('/') {
        return Err(ConfigError::Validation(
            "kodi.host must be a bare host name or address; use kodi.tls to select https"
                .to_string(),
        ));
    }

    if kodi.port == 0 {
        return Err(ConfigError::Validation("kodi.port must be greater than zero".to_string()));
    }

    let has_password =
        kodi.password.as_ref().map(|value| !value.expose_secret().is_empty()).unwrap_or(false);
    let has_username =
        kodi.username.as_ref().map(|value| !value.trim().is_empty()).unwrap_or(false);
    if has_password && !has_username {
        return Err(ConfigError::Validation(
            "kodi.password is set but kodi.username is missing".to_string(),
        ));
    }

    Ok(())
}

fn validate_dialog(dialog: &DialogConfig) -> Result<(), ConfigError> {
    if dialog.cinemavision_addon_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "dialog.cinemavision_addon_id must not be empty".to_string(),
        ));
    }

    if dialog.volume_ceiling == 0 || dialog.volume_ceiling > 100 {
        return Err(ConfigError::Validation(
            "dialog.volume_ceiling must be in range 1..=100".to_string(),
        ));
    }

    Ok(())
}

fn validate_navigation(navigation: &NavigationConfig) -> Result<(), ConfigError> {
    if navigation.max_repeat == 0 || navigation.max_repeat > 50 {
        return Err(ConfigError::Validation(
            "navigation.max_repeat must be in range 1..=50".to_string(),
        ));
    }

    if navigation.repeat_pause_ms > 5_000 {
        return Err(ConfigError::Validation(
            "navigation.repeat_pause_ms must be at most 5000".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    kodi: Option<KodiPatch>,
    dialog: Option<DialogPatch>,
    resolver: Option<ResolverPatch>,
    navigation: Option<NavigationPatch>,
    notifications: Option<NotificationsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct KodiPatch {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    tls: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct DialogPatch {
    cinemavision_addon_id: Option<String>,
    volume_ceiling: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct ResolverPatch {
    dedup: Option<DedupPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct NavigationPatch {
    repeat_pause_ms: Option<u64>,
    max_repeat: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationsPatch {
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
