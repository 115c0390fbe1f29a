use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{errors::Error, Result};

/// Messenger account credentials. Consumed only by the interactive login
/// collaborator that produces the session file; the bridge steady state
/// never reads them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FbAccount {
    pub email: String,
    pub password: String,
}

/// Typed view of `config.json`.
///
/// Built once at startup and passed by `Arc` into every component; never
/// mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub debug: bool,
    /// Reply-quote preview length, in characters.
    pub preview_text_limit: usize,
    /// Attachment download mode: fully in memory vs. staged to a temp file.
    pub download_to_buffer: bool,
    /// Locale tag, consumed by the localized string-table collaborator.
    pub lang: String,
    pub group_tg_id: i64,
    pub group_msgr_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_tg_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_msgr_id: Option<i64>,
    /// Platform enable switches.
    pub messenger: bool,
    pub telegram: bool,
    pub fb_account: FbAccount,
    /// Operator nickname overrides for Telegram sender ids.
    pub tg_users: HashMap<i64, String>,
    pub tg_token: String,
}

impl Config {
    /// Load `config.json`. On first run (no file) a placeholder template is
    /// written and `Error::ConfigMissing` returned; the process is expected
    /// to print the instruction and exit non-zero.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let template = serde_json::to_string_pretty(&Self::template())?;
            fs::write(path, template)?;
            return Err(Error::ConfigMissing(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        if cfg.preview_text_limit == 0 {
            return Err(Error::Config(
                "previewTextLimit must be at least 1".to_string(),
            ));
        }

        Ok(cfg)
    }

    /// The structure written on first run, with placeholder values for the
    /// operator to fill in.
    pub fn template() -> Self {
        Self {
            debug: false,
            preview_text_limit: 8,
            download_to_buffer: true,
            lang: "en-US".to_string(),
            group_tg_id: -1234567890,
            group_msgr_id: 12345678998765432,
            test_tg_id: None,
            test_msgr_id: None,
            messenger: true,
            telegram: true,
            fb_account: FbAccount {
                email: "YOUR_FB_ACCOUNT@EMAIL.COM".to_string(),
                password: "YOUR_FB_PASSWORD".to_string(),
            },
            tg_users: HashMap::from([(1234567890, "Nickname for specified ID".to_string())]),
            tg_token: "TG_BOT_TOKEN".to_string(),
        }
    }
}
