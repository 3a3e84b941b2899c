// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Server Configuration
//!
//! This module provides configuration management for the language
//! server.
//!
//! ## Configuration Structure
//!
//! The server configuration includes:
//! - The served language id (documents with any other id are ignored)
//! - Package dependencies to load into the compilation context
//! - Vapi search directories for package interface files
//!
//! ## Client settings
//!
//! Clients pass the configuration through `initializationOptions`:
//!
//! ```json
//! {
//!   "valaLsp": {
//!     "packages": ["gio-2.0"],
//!     "vapiDirs": ["/usr/share/vala/vapi"]
//!   }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// The canonical language id the server answers for.
pub const LANGUAGE_ID: &str = "vala";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Language id documents must declare.
    pub language_id: String,

    /// Packages loaded into every compilation context.
    pub packages: Vec<String>,

    /// Search directories for package interface files.
    pub vapi_dirs: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            language_id: LANGUAGE_ID.to_string(),
            packages: Vec::new(),
            vapi_dirs: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parse the configuration from `initializationOptions`.
    ///
    /// Absent or malformed settings fall back to the defaults with a log
    /// entry; a bad client configuration never prevents startup.
    pub fn from_initialization_options(options: Option<&Value>) -> Self {
        let Some(options) = options else {
            return Self::default();
        };
        let Some(section) = options.get("valaLsp") else {
            return Self::default();
        };
        match serde_json::from_value::<ServerConfig>(section.clone()) {
            Ok(config) => {
                info!(
                    "configuration: {} packages, {} vapi dirs",
                    config.packages.len(),
                    config.vapi_dirs.len()
                );
                config
            }
            Err(err) => {
                warn!("malformed valaLsp settings, using defaults: {}", err);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.language_id, "vala");
        assert!(config.packages.is_empty());
    }

    #[test]
    fn test_from_options() {
        let options = json!({
            "valaLsp": {
                "packages": ["gio-2.0", "gtk4"],
                "vapiDirs": ["/usr/share/vala/vapi"]
            }
        });
        let config = ServerConfig::from_initialization_options(Some(&options));
        assert_eq!(config.packages, vec!["gio-2.0", "gtk4"]);
        assert_eq!(config.vapi_dirs, vec![PathBuf::from("/usr/share/vala/vapi")]);
        assert_eq!(config.language_id, "vala");
    }

    #[test]
    fn test_missing_section_falls_back() {
        let options = json!({ "other": {} });
        let config = ServerConfig::from_initialization_options(Some(&options));
        assert!(config.packages.is_empty());
    }

    #[test]
    fn test_malformed_section_falls_back() {
        let options = json!({ "valaLsp": { "packages": 42 } });
        let config = ServerConfig::from_initialization_options(Some(&options));
        assert!(config.packages.is_empty());
    }
}
