//! Configuration loading and root folder resolution
//!
//! Each service resolves its root folder (database, config.toml,
//! log output) through the same 4-tier priority order, then loads
//! service settings from `config.toml` inside that folder.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`PRAYAS_ROOT`)
/// 3. TOML config file in the platform config directory
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file under the platform config dir
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Create the root folder if it does not exist yet
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
    }
    Ok(())
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("prayas").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/prayas/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("prayas"))
        .unwrap_or_else(|| PathBuf::from("./prayas_data"))
}

/// Service settings loaded from `config.toml` inside the root folder.
///
/// Every field has a compiled default so the services start with zero
/// configuration; the file only needs to exist when a default must change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind port for the admin console backend
    pub admin_port: u16,
    /// Bind port for the public form-submission service
    pub forms_port: u16,
    /// Object store upload endpoint (PUT {base}/{key})
    pub object_store_url: String,
    /// Public download base for stored objects ({base}/{key})
    pub object_public_url: String,
    /// Hosted identity provider endpoint (POST {base}/signin)
    pub identity_url: String,
    /// Bound on external image URL probe requests, in seconds
    pub url_probe_timeout_secs: u64,
    /// Bound on object store upload/delete requests, in seconds
    pub storage_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            admin_port: 7870,
            forms_port: 7871,
            object_store_url: "http://127.0.0.1:9090/objects".to_string(),
            object_public_url: "http://127.0.0.1:9090/public".to_string(),
            identity_url: "http://127.0.0.1:9091/identity".to_string(),
            url_probe_timeout_secs: 10,
            storage_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// Load settings from `config.toml` in the root folder.
    ///
    /// A missing file yields the compiled defaults; a malformed file is
    /// a hard configuration error (silently ignoring it would hide typos).
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Database file path inside the root folder
    pub fn database_path(root: &Path) -> PathBuf {
        root.join("prayas.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins_over_default() {
        let root = resolve_root_folder(Some("/tmp/prayas-test"), "PRAYAS_TEST_UNSET_VAR");
        assert_eq!(root, PathBuf::from("/tmp/prayas-test"));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServiceConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.admin_port, 7870);
        assert_eq!(cfg.url_probe_timeout_secs, 10);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "admin_port = 9999\nobject_store_url = \"https://store.example.com/u\"\n",
        )
        .unwrap();

        let cfg = ServiceConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.admin_port, 9999);
        assert_eq!(cfg.object_store_url, "https://store.example.com/u");
        // Untouched fields keep their defaults
        assert_eq!(cfg.forms_port, 7871);
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "admin_port = \"not a port").unwrap();

        assert!(ServiceConfig::load(dir.path()).is_err());
    }
}
