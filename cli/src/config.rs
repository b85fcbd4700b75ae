use anyhow::{Context, Result};
use directories::ProjectDirs;
use fitflow_core::db::StoreOptions;
use std::path::PathBuf;

use crate::gemini::DEFAULT_MODEL;

/// Shortest server API key accepted from the `api_key` file.
pub const MIN_API_KEY_CHARS: usize = 16;

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub provision_history: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "fitflow").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path =
            env_var("FITFLOW_DB").map_or_else(|| data_dir.join("fitflow.db"), PathBuf::from);

        let gemini_api_key = match env_var("GEMINI_API_KEY") {
            Some(key) => Some(key),
            None => read_key_file(&data_dir.join("gemini_api_key"))?,
        };

        let gemini_model =
            env_var("FITFLOW_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let provision_history = env_var("FITFLOW_HISTORY").is_none_or(|v| history_enabled(&v));

        Ok(Config {
            db_path,
            data_dir,
            gemini_api_key,
            gemini_model,
            provision_history,
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            provision_history: self.provision_history,
        }
    }

    pub fn require_gemini_api_key(&self) -> Result<&str> {
        self.gemini_api_key.as_deref().with_context(|| {
            format!(
                "No Gemini API key configured. Set GEMINI_API_KEY or write the key to {}",
                self.data_dir.join("gemini_api_key").display()
            )
        })
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)` where `newly_created` is true when a
    /// fresh key was just generated (first run).
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if let Some(key) = read_key_file(&path)? {
            if key.chars().count() < MIN_API_KEY_CHARS {
                anyhow::bail!(
                    "API key in {} is shorter than {MIN_API_KEY_CHARS} characters; \
                     replace it or delete the file to generate a new one",
                    path.display()
                );
            }
            return Ok((key, false));
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok((key, true))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a single-line secret, treating a missing or blank file as absent.
fn read_key_file(path: &std::path::Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let key = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file: {}", path.display()))?;
    let key = key.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

fn history_enabled(value: &str) -> bool {
    !matches!(value.to_ascii_lowercase().as_str(), "off" | "false" | "0")
}
