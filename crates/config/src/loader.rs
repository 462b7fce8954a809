use std::{
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::WrenConfig};

const CONFIG_FILENAME: &str = "wren.toml";

static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Override the user-global config directory, e.g. from a CLI flag.
/// Applies process-wide; call before any config access.
pub fn set_config_dir(dir: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(dir);
}

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<WrenConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./wren.toml` (project-local)
/// 2. `~/.config/wren/wren.toml` (user-global)
///
/// Returns `WrenConfig::default()` if no config file is found.
pub fn discover_and_load() -> WrenConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    WrenConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    let global = config_dir()?.join(CONFIG_FILENAME);
    global.exists().then_some(global)
}

/// Returns the user-global config directory (`~/.config/wren/` unless
/// overridden).
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
    {
        return Some(dir);
    }
    directories::ProjectDirs::from("", "", "wren").map(|d| d.config_dir().to_path_buf())
}

/// Serialize `config` to TOML and write it to the user-global config path,
/// creating parent directories if needed. Returns the path written to.
pub fn save_config(config: &WrenConfig) -> anyhow::Result<PathBuf> {
    let path = find_config_file().unwrap_or_else(|| {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILENAME)
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(&path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn load_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wren.toml");
        std::fs::write(
            &path,
            "[identity]\nbase_url = \"https://id.example.com\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.identity.base_url, "https://id.example.com");
        assert_eq!(config.chat.chat_id, "default");
    }

    #[test]
    fn env_placeholders_are_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wren.toml");
        // Unresolvable placeholders pass through untouched.
        std::fs::write(
            &path,
            "[docstore]\nauth_token = \"${WREN_TEST_UNSET_TOKEN}\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.docstore.auth_token.as_deref(),
            Some("${WREN_TEST_UNSET_TOKEN}")
        );
    }

    #[test]
    fn missing_file_is_an_error_from_load() {
        assert!(load_config(Path::new("/nonexistent/wren.toml")).is_err());
    }
}
