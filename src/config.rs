use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use lectio_core::models::{normalize_language_code, TranslationType};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub import: ImportConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Language whose text is stored as `english_text`.
    #[serde(default = "default_base_language")]
    pub base_language: String,
    #[serde(default)]
    pub default_translation_type: TranslationType,
    /// Verse writes between progress events.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            base_language: default_base_language(),
            default_translation_type: TranslationType::Human,
            progress_every: default_progress_every(),
        }
    }
}

impl ImportConfig {
    pub fn is_base_language(&self, language_code: &str) -> bool {
        normalize_language_code(&self.base_language) == normalize_language_code(language_code)
    }
}

fn default_base_language() -> String {
    "english".to_string()
}
fn default_progress_every() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    if normalize_language_code(&config.import.base_language).is_empty() {
        anyhow::bail!("import.base_language must not be empty");
    }

    if config.import.progress_every == 0 {
        anyhow::bail!("import.progress_every must be > 0");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let file = write_config(
            r#"
[db]
path = "./data/lectio.sqlite"

[server]
bind = "127.0.0.1:7340"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.import.base_language, "english");
        assert_eq!(config.import.default_translation_type, TranslationType::Human);
        assert_eq!(config.import.progress_every, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_import_section_overrides() {
        let file = write_config(
            r#"
[db]
path = "x.sqlite"

[import]
base_language = "English"
default_translation_type = "ai"
progress_every = 10

[server]
bind = "127.0.0.1:0"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.import.default_translation_type, TranslationType::Ai);
        assert!(config.import.is_base_language("english"));
        assert!(!config.import.is_base_language("spanish"));
    }

    #[test]
    fn test_rejects_zero_progress_interval() {
        let file = write_config(
            "[db]\npath = \"x.sqlite\"\n[import]\nprogress_every = 0\n[server]\nbind = \"127.0.0.1:0\"\n",
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("progress_every"));
    }

    #[test]
    fn test_rejects_empty_base_language() {
        let file = write_config(
            "[db]\npath = \"x.sqlite\"\n[import]\nbase_language = \"  \"\n[server]\nbind = \"127.0.0.1:0\"\n",
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_config(Path::new("/nonexistent/lectio.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lectio.toml"));
    }
}
