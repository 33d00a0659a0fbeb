use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::alert::AlertPolicy;

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

/// Paths of every backend operation, relative to the backend base url.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    pub request_password_reset: String,
    pub verify_otp: String,
    pub update_password: String,
    pub purchase_prefix: String,
    pub feedback: String,
    pub fund_wallet: String,
    pub verify_funding: String,
    pub update_profile: String,
    pub change_password: String,
    pub delete_account: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/auth/login".into(),
            register: "/api/auth/register".into(),
            request_password_reset: "/api/auth/reset-password".into(),
            verify_otp: "/api/auth/verify-otp".into(),
            update_password: "/auth/update-password".into(),
            purchase_prefix: "/api/purchase".into(),
            feedback: "/api/feedback".into(),
            fund_wallet: "/api/wallet/fund".into(),
            verify_funding: "/api/wallet/verify".into(),
            update_profile: "/api/user/profile".into(),
            change_password: "/api/user/change-password".into(),
            delete_account: "/api/user/account".into(),
        }
    }
}

impl Endpoints {
    pub fn purchase(&self, slug: &str) -> String {
        format!("{}/{slug}", self.purchase_prefix.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub backend_url: String,
    pub alert_timeout_ms: u64,
    pub request_timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: "https://halfat-backend.onrender.com".into(),
            alert_timeout_ms: 3000,
            request_timeout_secs: 30,
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientSettings {
    /// `alert_timeout_ms = 0` keeps alerts up until dismissed.
    pub fn alert_policy(&self) -> AlertPolicy {
        if self.alert_timeout_ms == 0 {
            AlertPolicy::Modal
        } else {
            AlertPolicy::Toast {
                after: Duration::from_millis(self.alert_timeout_ms),
            }
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    alert_timeout_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    endpoints: Option<Endpoints>,
}

/// Defaults, then `client.toml` (or `path`), then environment overrides.
///
/// A missing default file is not an error; a missing explicit `path` is.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_SETTINGS_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file_settings(&mut settings, &raw)?;
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_settings(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw).context("malformed client settings")?;
    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = file_cfg.alert_timeout_ms {
        settings.alert_timeout_ms = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.endpoints {
        settings.endpoints = v;
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = var("APP__ALERT_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.alert_timeout_ms = parsed;
        }
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = var("APP__UPDATE_PASSWORD_PATH") {
        settings.endpoints.update_password = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
