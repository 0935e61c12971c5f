use crate::error::AppError;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub platform: String,
    pub timeout: Duration,
}

impl Config {
    /// Builds the runtime configuration. An explicit `--api-key` wins over
    /// the discovery chain.
    pub fn resolve(
        cli_key: Option<String>,
        platform: String,
        timeout_secs: u64,
    ) -> Result<Self, AppError> {
        let api_key = cli_key
            .filter(|k| !k.trim().is_empty())
            .or_else(discover_api_key)
            .ok_or_else(|| {
                AppError::Config(
                    "RIOT_API_KEY not found. Checked: --api-key, environment, .env, \
                     config/api_key.txt, api_key.txt"
                        .to_string(),
                )
            })?;

        Ok(Config {
            api_key,
            platform: platform.to_lowercase(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Looks for the Riot API key in several locations, first non-empty wins:
/// environment variable, `.env` file, `config/api_key.txt`, `api_key.txt`,
/// then the per-user config directory.
fn discover_api_key() -> Option<String> {
    // dotenvy never overrides an already-set variable, so the environment
    // keeps priority over .env
    dotenvy::dotenv().ok();

    if let Ok(key) = env::var("RIOT_API_KEY") {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Some(key);
        }
    }

    for candidate in ["config/api_key.txt", "api_key.txt"] {
        if let Some(key) = read_key_file(Path::new(candidate)) {
            return Some(key);
        }
    }

    if let Some(dir) = dirs::config_dir() {
        if let Some(key) = read_key_file(&dir.join("lol_report").join("api_key.txt")) {
            return Some(key);
        }
    }

    None
}

fn read_key_file(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let key = content.trim().to_string();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
