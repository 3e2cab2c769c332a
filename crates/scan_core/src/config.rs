use std::{fs, io, path::Path};

use shared::domain::Symbology;
use url::Url;

use crate::error::SettingsError;

pub const DEFAULT_SETTINGS_FILE: &str = "scanner.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub lookup_url: String,
    pub api_key: String,
    pub user_id: String,
    pub user_secret: String,
    pub timeout_secs: u64,
    /// Symbologies the camera collaborator should decode.
    pub barcode_types: Vec<Symbology>,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            lookup_url: "http://127.0.0.1:8080/urlapi/api/url/getapi".into(),
            api_key: "devkey".into(),
            user_id: "API".into(),
            user_secret: "devsecret".into(),
            timeout_secs: 15,
            barcode_types: vec![
                Symbology::Qr,
                Symbology::Pdf417,
                Symbology::Ean13,
                Symbology::Code128,
            ],
        }
    }
}

/// Maps a settings key (including its short aliases) to its canonical name.
fn canonical_key(key: &str) -> Option<&'static str> {
    match key {
        "lookup_url" => Some("lookup_url"),
        "api_key" => Some("api_key"),
        "uid" | "user_id" => Some("user_id"),
        "upw" | "user_secret" => Some("user_secret"),
        "timeout_secs" => Some("timeout_secs"),
        "barcode_types" => Some("barcode_types"),
        _ => None,
    }
}

impl LookupSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let url = Url::parse(&self.lookup_url).map_err(|source| SettingsError::InvalidUrl {
            url: self.lookup_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::Invalid {
                key: "lookup_url",
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.barcode_types.is_empty() {
            return Err(SettingsError::Invalid {
                key: "barcode_types",
                reason: "at least one symbology is required".into(),
            });
        }
        Ok(())
    }

    /// Applies one textual setting. Unknown keys are ignored.
    fn apply(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let Some(key) = canonical_key(key) else {
            return Ok(());
        };
        match key {
            "lookup_url" => self.lookup_url = value.to_string(),
            "api_key" => self.api_key = value.to_string(),
            "user_id" => self.user_id = value.to_string(),
            "user_secret" => self.user_secret = value.to_string(),
            "timeout_secs" => {
                self.timeout_secs = value.trim().parse::<u64>().map_err(|e| {
                    SettingsError::Invalid {
                        key: "timeout_secs",
                        reason: format!("'{value}' is not a whole number of seconds: {e}"),
                    }
                })?;
            }
            "barcode_types" => {
                self.barcode_types = value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(Symbology::from_tag)
                    .collect();
            }
            _ => {}
        }
        Ok(())
    }
}

/// Flattens a TOML value into the textual form `apply` understands.
/// Strings and integers are taken as written; arrays of strings are joined
/// with commas.
fn toml_value_text(key: &'static str, value: &toml::Value) -> Result<String, SettingsError> {
    match value {
        toml::Value::String(text) => Ok(text.clone()),
        toml::Value::Integer(number) => Ok(number.to_string()),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                toml::Value::String(text) => Ok(text.clone()),
                other => Err(SettingsError::Invalid {
                    key,
                    reason: format!("expected a list of strings, found {}", other.type_str()),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|items| items.join(",")),
        other => Err(SettingsError::Invalid {
            key,
            reason: format!("unsupported value type {}", other.type_str()),
        }),
    }
}

/// Defaults, then `scanner.toml` if present, then environment overrides.
pub fn load_settings() -> Result<LookupSettings, SettingsError> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), false)
}

/// Like [`load_settings`] with an explicit file. A missing file is an error
/// only when `required` is set.
pub fn load_settings_from(path: &Path, required: bool) -> Result<LookupSettings, SettingsError> {
    let mut settings = LookupSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, path, &raw)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

fn apply_file(settings: &mut LookupSettings, path: &Path, raw: &str) -> Result<(), SettingsError> {
    let file_cfg = raw
        .parse::<toml::Table>()
        .map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    for (key, value) in &file_cfg {
        let Some(canonical) = canonical_key(key) else {
            continue;
        };
        settings.apply(canonical, &toml_value_text(canonical, value)?)?;
    }
    Ok(())
}

fn apply_env_overrides(
    settings: &mut LookupSettings,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    if let Some(v) = env("LOOKUP_URL") {
        settings.apply("lookup_url", &v)?;
    }
    for (var, key) in [
        ("APP__LOOKUP_URL", "lookup_url"),
        ("APP__API_KEY", "api_key"),
        ("APP__UID", "uid"),
        ("APP__UPW", "upw"),
        ("APP__TIMEOUT_SECS", "timeout_secs"),
        ("APP__BARCODE_TYPES", "barcode_types"),
    ] {
        if let Some(v) = env(var) {
            settings.apply(key, &v)?;
        }
    }
    Ok(())
}
