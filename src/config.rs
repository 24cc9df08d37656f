use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default database file, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "caribou.sqlite3";

/// Default migrations directory, relative to the working directory
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Name of the project-local configuration file
pub const CONFIG_FILE_NAME: &str = "caribou.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaribouConfig {
    /// Path to the SQLite database being migrated
    pub database_path: String,

    /// Directory holding the migration files
    pub migrations_dir: String,

    /// Configuration file the values were read from, if any
    pub config_file: Option<String>,
}

pub const EMPTY_CONFIG: &str = r#"### caribou configuration file

### SQLite database to migrate
# database_path = "caribou.sqlite3"

### directory holding the migration files
# migrations_dir = "migrations"
"#;

impl Default for CaribouConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            migrations_dir: DEFAULT_MIGRATIONS_DIR.to_string(),
            config_file: None,
        }
    }
}

impl CaribouConfig {
    /// Function to create and initialize a new configuration
    ///
    /// An explicit path must exist. Without one, `./caribou.toml` is used if
    /// present, then `$HOME/.caribou/caribou.toml`. Environment variables
    /// prefixed with `CARIBOU_` override file values.
    pub fn new(path: &Option<String>) -> Result<CaribouConfig> {
        let mut builder = Config::builder();

        let config_file = match path {
            Some(p) => {
                if !Path::new(p).is_file() {
                    return Err(anyhow!("Config file '{}' does not exist", p));
                }
                Some(PathBuf::from(p))
            }
            None => Self::default_config_files()
                .into_iter()
                .find(|p| p.is_file()),
        };

        if let Some(file) = &config_file {
            builder = builder.add_source(config::File::from(file.as_path()));
        }

        // E.g., `CARIBOU_DATABASE_PATH=app.sqlite3 caribou version`
        builder = builder.add_source(config::Environment::with_prefix("CARIBOU"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let database_path = config
            .get("database_path")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let migrations_dir = config
            .get("migrations_dir")
            .cloned()
            .unwrap_or_else(|| DEFAULT_MIGRATIONS_DIR.to_string());

        Ok(CaribouConfig {
            database_path,
            migrations_dir,
            config_file: config_file.map(|p| p.to_string_lossy().to_string()),
        })
    }

    /// Apply command line overrides
    pub fn with_overrides(
        mut self,
        database_path: Option<String>,
        migrations_dir: Option<String>,
    ) -> Self {
        if let Some(p) = database_path {
            self.database_path = p;
        }
        if let Some(d) = migrations_dir {
            self.migrations_dir = d;
        }
        self
    }

    /// Candidate configuration files, in lookup order
    pub fn default_config_files() -> Vec<PathBuf> {
        let mut files = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(home) = dirs::home_dir() {
            files.push(home.join(".caribou").join(CONFIG_FILE_NAME));
        }
        files
    }

    /// Write the commented default configuration to `path`
    ///
    /// Fails if the file already exists.
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(anyhow!(
                "Config file '{}' already exists",
                path.display()
            ));
        }
        std::fs::write(path, EMPTY_CONFIG)
            .map_err(|e| anyhow!("Unable to create config file {}: {}", path.display(), e))
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!(
                "Config File:        {}",
                self.config_file.as_deref().unwrap_or("(none)")
            ),
            format!("Database Path:      {}", self.database_path),
            format!("Migrations Dir:     {}", self.migrations_dir),
        ];

        if !Path::new(&self.migrations_dir).is_dir() {
            lines.push("Migrations Dir does not exist".to_string());
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaribouConfig::default();
        assert_eq!(config.database_path, "caribou.sqlite3");
        assert_eq!(config.migrations_dir, "migrations");
        assert_eq!(config.config_file, None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caribou.toml");
        std::fs::write(
            &path,
            "database_path = \"data/app.sqlite3\"\nmigrations_dir = \"db/migrations\"\n",
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = CaribouConfig::new(&Some(path_str.clone())).unwrap();
        assert_eq!(config.database_path, "data/app.sqlite3");
        assert_eq!(config.migrations_dir, "db/migrations");
        assert_eq!(config.config_file, Some(path_str));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "migrations_dir = \"sql\"\n").unwrap();

        let config = CaribouConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.migrations_dir, "sql");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(CaribouConfig::new(&Some(path.to_string_lossy().to_string())).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = CaribouConfig::default().with_overrides(Some("other.db".to_string()), None);
        assert_eq!(config.database_path, "other.db");
        assert_eq!(config.migrations_dir, DEFAULT_MIGRATIONS_DIR);
    }

    #[test]
    fn test_write_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caribou.toml");

        CaribouConfig::write_default(&path).unwrap();
        let config = CaribouConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);

        assert!(CaribouConfig::write_default(&path).is_err());
    }

    #[test]
    fn test_summary() {
        let config = CaribouConfig {
            database_path: "/test/app.sqlite3".to_string(),
            migrations_dir: "/test/does-not-exist".to_string(),
            config_file: None,
        };
        let summary = config.summary();
        assert!(summary.contains("Database Path:      /test/app.sqlite3"));
        assert!(summary.contains("Config File:        (none)"));
        assert!(summary.contains("Migrations Dir does not exist"));
    }
}
