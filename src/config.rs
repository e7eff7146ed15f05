// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Embedding configuration for content similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "voyage:voyage-3.5-lite".to_string(),
            batch_size: 32,
        }
    }
}

/// Default analysis parameters, overridable per run from the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub similarity_threshold: f32,
    pub min_clicks: u64,
    pub min_impressions: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            min_clicks: 0,
            min_impressions: 0,
        }
    }
}

/// Page fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_concurrent: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Octorank/0.2".to_string(),
            timeout_seconds: 30,
            max_concurrent: 10,
        }
    }
}

/// Search analytics API configuration (token comes from SEARCH_API_TOKEN)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchApiConfig {
    pub endpoint: String,
    pub row_limit: usize,
    pub max_rows: usize,
    pub chunk_days: u32,
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/webmasters/v3".to_string(),
            row_limit: 25000,
            max_rows: 25000,
            chunk_days: 7,
        }
    }
}

/// Main configuration for octorank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub analysis: AnalysisConfig,
    pub scraper: ScraperConfig,
    pub search_api: SearchApiConfig,
}

impl Config {
    /// Load configuration from config.toml file
    /// First tries to load from system config directory, falls back to embedded template
    pub fn load() -> Result<Self> {
        // Try to load from system config directory
        let config_path = crate::storage::get_system_config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Config doesn't exist, create from template
            let template_content = include_str!("../config-templates/default.toml");
            let config: Self = toml::from_str(template_content)?;

            // Save to system config directory
            if let Some(parent) = config_path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&config_path, template_content)?;

            Ok(config)
        }
    }
}
