/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use lazy_static::lazy_static;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::common::DEFAULT_BUFFER_SIZE;

/// Configuration for Missive.
///
/// Loaded from TOML in an XDG-compliant location; every field is optional in
/// the file and falls back to its default.
///
/// ```toml
/// [limits]
/// default_buffer_size = 32
///
/// [behavior]
/// enforce_unique_names = true
/// log_decode_mismatches = true
///
/// [affinity]
/// thread_name = "ui-serial"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissiveConfig {
    /// Buffer sizing.
    pub limits: LimitsConfig,
    /// Behavioral switches.
    pub behavior: BehaviorConfig,
    /// The shared serial queue.
    pub affinity: AffinityConfig,
}

/// Limits and capacity configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Buffer size used by [`MessageCenter::open_default`](crate::MessageCenter::open_default).
    /// Must be positive.
    #[serde(deserialize_with = "positive_buffer_size")]
    pub default_buffer_size: usize,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Reject a second message type that reuses a claimed bus-level name.
    pub enforce_unique_names: bool,
    /// Log envelopes that fail to decode at `debug` level.
    pub log_decode_mismatches: bool,
}

/// Serial queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityConfig {
    /// Name of the OS thread backing [`SerialQueue::main`](crate::SerialQueue::main).
    pub thread_name: String,
}

fn positive_buffer_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let size = usize::deserialize(deserializer)?;
    if size == 0 {
        return Err(de::Error::custom("default_buffer_size must be at least 1"));
    }
    Ok(size)
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enforce_unique_names: true,
            log_decode_mismatches: false,
        }
    }
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            thread_name: "missive-serial".to_string(),
        }
    }
}

impl MissiveConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns the TOML error when the document is malformed or a limit is
    /// out of range.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `missive/config.toml` under `$XDG_CONFIG_HOME` (typically
    /// `~/.config/missive/config.toml`) and then the XDG config dirs.
    ///
    /// If no configuration file is found, returns the default configuration.
    /// If a configuration file exists but is malformed, logs an error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("missive") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => match Self::from_toml_str(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: MissiveConfig = MissiveConfig::load();
}
