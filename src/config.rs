//! Configuration management for git-branch-builder
//!
//! Stores naming rules and scan preferences in a JSON file in the user's
//! config directory. Every field has a default, so the file is optional and
//! may be partial.

use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::branch::{BranchType, NamingRules, RESERVED_PREFIXES, TICKET_PATTERN};
use crate::git::ScanOptions;

/// The name of the config file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory under the platform config dir holding the config file
pub const CONFIG_DIR_NAME: &str = "git-branch-builder";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Version of the config file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Branch types offered in the form, first one is the default
    #[serde(default = "default_branch_types")]
    pub branch_types: Vec<String>,

    /// Branches starting with one of these are never offered as a base
    #[serde(default = "default_reserved_prefixes")]
    pub reserved_prefixes: Vec<String>,

    /// Regex a ticket key must fully match
    #[serde(default = "default_ticket_pattern")]
    pub ticket_pattern: String,

    /// Folder scanned when none is given (falls back to the home directory)
    #[serde(default)]
    pub default_folder: Option<PathBuf>,

    /// Keep walking into a repository once it has been found
    #[serde(default)]
    pub descend_into_repositories: bool,

    /// Glob patterns for directory names the scan never enters
    #[serde(default)]
    pub skip_patterns: Vec<String>,
}

fn default_version() -> u32 {
    1
}

fn default_branch_types() -> Vec<String> {
    BranchType::ALL.iter().map(|t| t.to_string()).collect()
}

fn default_reserved_prefixes() -> Vec<String> {
    RESERVED_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_ticket_pattern() -> String {
    TICKET_PATTERN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            branch_types: default_branch_types(),
            reserved_prefixes: default_reserved_prefixes(),
            ticket_pattern: default_ticket_pattern(),
            default_folder: None,
            descend_into_repositories: false,
            skip_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load config from a file, or use the defaults if it doesn't exist
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file, creating the config directory when needed
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .with_context(|| "Failed to serialize config")?;

        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Folder the scan starts from when the user doesn't pick one
    pub fn scan_folder(&self) -> Result<PathBuf> {
        if let Some(folder) = &self.default_folder {
            return Ok(folder.clone());
        }
        dirs::home_dir().ok_or_else(|| eyre!("Could not determine the home directory"))
    }

    /// Compile the naming rules (fails on an invalid ticket pattern)
    pub fn naming_rules(&self) -> Result<NamingRules> {
        NamingRules::new(
            &self.ticket_pattern,
            self.branch_types.clone(),
            self.reserved_prefixes.clone(),
        )
        .with_context(|| format!("Invalid ticket pattern in config: {}", self.ticket_pattern))
    }

    /// Options for the repository scan
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.descend_into_repositories, &self.skip_patterns)
    }
}
