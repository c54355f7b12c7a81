use std::env;
use std::fs;
use std::path::Path;

use kodi_voice_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
    flag: Option<&'static str>,
}

impl Field {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys, flag: None }
    }

    fn flag_if(mut self, set: bool, flag: &'static str) -> Self {
        if set {
            self.flag = Some(flag);
        }
        self
    }
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = &options.overrides;

    let fields = vec![
        Field::new("kodi.host", config.kodi.host.clone(), &["KODI_VOICE_KODI_HOST"])
            .flag_if(overrides.kodi_host.is_some(), "--kodi-host"),
        Field::new("kodi.port", config.kodi.port.to_string(), &["KODI_VOICE_KODI_PORT"])
            .flag_if(overrides.kodi_port.is_some(), "--kodi-port"),
        Field::new(
            "kodi.username",
            config.kodi.username.as_deref().unwrap_or("<unset>"),
            &["KODI_VOICE_KODI_USERNAME"],
        ),
        Field::new(
            "kodi.password",
            if config.kodi.password.is_some() { "<redacted>" } else { "<unset>" },
            &["KODI_VOICE_KODI_PASSWORD"],
        ),
        Field::new("kodi.tls", config.kodi.tls.to_string(), &["KODI_VOICE_KODI_TLS"]),
        Field::new(
            "dialog.cinemavision_addon_id",
            config.dialog.cinemavision_addon_id.clone(),
            &["KODI_VOICE_DIALOG_CINEMAVISION_ADDON_ID"],
        ),
        Field::new(
            "dialog.volume_ceiling",
            config.dialog.volume_ceiling.to_string(),
            &["KODI_VOICE_DIALOG_VOLUME_CEILING"],
        ),
        Field::new(
            "resolver.dedup",
            format!("{:?}", config.resolver.dedup).to_lowercase(),
            &["KODI_VOICE_RESOLVER_DEDUP"],
        ),
        Field::new(
            "navigation.repeat_pause_ms",
            config.navigation.repeat_pause_ms.to_string(),
            &["KODI_VOICE_NAVIGATION_REPEAT_PAUSE_MS"],
        ),
        Field::new(
            "navigation.max_repeat",
            config.navigation.max_repeat.to_string(),
            &["KODI_VOICE_NAVIGATION_MAX_REPEAT"],
        ),
        Field::new(
            "notifications.enabled",
            config.notifications.enabled.to_string(),
            &["KODI_VOICE_NOTIFICATIONS_ENABLED"],
        ),
        Field::new(
            "logging.level",
            config.logging.level.clone(),
            &["KODI_VOICE_LOGGING_LEVEL", "KODI_VOICE_LOG_LEVEL"],
        )
        .flag_if(overrides.log_level.is_some(), "--log-level"),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["KODI_VOICE_LOGGING_FORMAT", "KODI_VOICE_LOG_FORMAT"],
        )
        .flag_if(overrides.log_format.is_some(), "--log-format"),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    lines.push(format!("- endpoint = {}", config.kodi.endpoint()));
    for field in &fields {
        let source = field_source(field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(field: &Field, config_file_doc: Option<&Value>, path: Option<&Path>) -> String {
    if let Some(flag) = field.flag {
        return format!("flag ({flag})");
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, field.key)) {
        let file_path = path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
