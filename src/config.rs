use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub engagement_dir: PathBuf,
    pub performance_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            engagement_dir: PathBuf::from("models/engagement"),
            performance_dir: PathBuf::from("models/performance"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub token: String,
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8181/api/json/v1/default_keyspace".to_string(),
            token: String::new(),
            timeout_ms: 10_000,
        }
    }
}

/// Weights of the composite performance score. Each prediction is first
/// normalized by the batch maximum (floored at 1), so the score stays in
/// [0, 1] as long as the weights sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub likes: f64,
    pub comments: f64,
    pub reach: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            likes: 0.5,
            comments: 0.3,
            reach: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Candidate post types when no record carries a type field.
    pub default_post_types: Vec<String>,
    /// Comments count double in the engagement score.
    pub comments_weight: f64,
    pub score_weights: ScoreWeights,
    pub top_posts: usize,
    /// Predictions that are uniformly below this value are treated as
    /// log1p-space and inverted with exp_m1.
    pub log_scale_threshold: f64,
    /// Seed for last-resort synthetic predictions, so repeated requests
    /// over the same data stay comparable.
    pub synthetic_seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_post_types: vec![
                "Image".to_string(),
                "Video".to_string(),
                "Sidecar".to_string(),
            ],
            comments_weight: 2.0,
            score_weights: ScoreWeights::default(),
            top_posts: 5,
            log_scale_threshold: 20.0,
            synthetic_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    pub clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            n_init: 10,
            max_iter: 100,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub models: ModelConfig,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
    pub clustering: ClusteringConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                toml::from_str(&contents)
                    .map_err(|err| format!("failed to parse config: {}", err))?
            } else {
                AppConfig::default()
            }
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = env::var("ASTRA_DB_URL") {
            if !endpoint.trim().is_empty() {
                self.storage.endpoint = endpoint;
            }
        }
        if let Ok(token) = env::var("ASTRA_DB_TOKEN") {
            if !token.trim().is_empty() {
                self.storage.token = token;
            }
        }
        if let Ok(dir) = env::var("ENGAGEMENT_MODEL_DIR") {
            if !dir.trim().is_empty() {
                self.models.engagement_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = env::var("PERFORMANCE_MODEL_DIR") {
            if !dir.trim().is_empty() {
                self.models.performance_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = env::var("EXPORT_DIR") {
            if !dir.trim().is_empty() {
                self.export.dir = PathBuf::from(dir);
            }
        }
        if let Ok(timeout) = env::var("STORAGE_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.storage.timeout_ms = value;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("POSTLENS_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/postlens.toml")))
}
