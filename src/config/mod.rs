mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./dubforge.toml",
        "~/.config/dubforge/config.toml",
        "/etc/dubforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.tools.timeout_secs == 0 {
        anyhow::bail!("Tool timeout cannot be 0");
    }

    if config.languages.original.is_empty() || config.languages.dubbed.is_empty() {
        anyhow::bail!("Language tags cannot be empty");
    }

    if config.languages.original == config.languages.dubbed {
        anyhow::bail!(
            "Original and dubbed language tags must differ (both are '{}')",
            config.languages.original
        );
    }

    // Search paths are validated lazily at scan time against the media root,
    // but warn early about entries that obviously cannot match.
    for path in &config.media.search_paths {
        if !dubforge_common::paths::is_within_root(&config.media.root, path) {
            tracing::warn!(
                "Search path {:?} is outside the media root and will be ignored",
                path
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.languages.original, "eng");
        assert_eq!(config.languages.dubbed, "spa");
        assert_eq!(config.tools.timeout_secs, 900);
    }

    #[test]
    fn load_config_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[media]
root = "/srv/media"
search_paths = ["/srv/media/tv", "/srv/media/incoming"]

[languages]
original = "eng"
dubbed = "spa"

[tools]
timeout_secs = 120
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.media.root, Path::new("/srv/media"));
        assert_eq!(config.media.search_paths.len(), 2);
        assert_eq!(config.tools.timeout_secs, 120);
        assert_eq!(config.tools.timeout(), std::time::Duration::from_secs(120));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[tools]\ntimeout_secs = 0\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn identical_language_tags_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[languages]\noriginal = \"spa\"\ndubbed = \"spa\"\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_error() {
        assert!(load_config(Path::new("/nonexistent/dubforge.toml")).is_err());
    }
}
