//! TOML Configuration Loading
//!
//! Reads the audit configuration and the optional rule book it points to.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use qa_auditor_tools::RuleBook;

use crate::models::AuditConfig;
use crate::utils::error::{AppError, AppResult};

/// Configuration service for one audit run
#[derive(Debug)]
pub struct ConfigService {
    config_path: Option<PathBuf>,
    config: AuditConfig,
}

impl ConfigService {
    /// Load `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => {
                info!("[Config] No configuration file given; using defaults");
                AuditConfig::default()
            }
        };

        Ok(Self {
            config_path: path.map(Path::to_path_buf),
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AuditConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = AuditConfig::from_toml_str(&content).map_err(AppError::config)?;
        info!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AuditConfig {
        &self.config
    }

    /// Consume the service, returning the configuration
    pub fn into_config(self) -> AuditConfig {
        self.config
    }

    /// Rule book named by the configuration, or the built-in tables.
    ///
    /// A relative rule book path resolves against the configuration file's
    /// directory.
    pub fn rulebook(&self) -> AppResult<RuleBook> {
        match &self.config.rulebook {
            Some(path) => Ok(RuleBook::load(&self.resolve(path))?),
            None => Ok(RuleBook::default()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}
