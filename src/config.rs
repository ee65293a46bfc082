//! Configuration management
//!
//! Loads the judge roster and evaluation settings from TOML files and
//! provides runtime access.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::exercises::Language;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub judges: IndexMap<String, JudgeConfig>,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Wire protocol a judge backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeProtocol {
    /// OpenAI chat-completions (also OpenAI-compatible endpoints)
    OpenAI,
    /// Google Gemini generateContent
    Gemini,
}

/// Per-judge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub protocol: JudgeProtocol,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Override for OpenAI-compatible endpoints (e.g. DashScope)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Requests per minute
    #[serde(default = "default_rpm")]
    pub rpm: u32,
}

/// Evaluation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Language roster; candidate solutions are compared across these
    #[serde(default = "default_languages")]
    pub languages: Vec<Language>,
    /// Rubric criterion names, in summary-table column order
    #[serde(default = "default_criteria")]
    pub criteria: Vec<String>,
    /// Declared rubric score range; values outside are flagged, never clamped
    #[serde(default)]
    pub min_score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default = "default_max_exercises")]
    pub max_exercises: usize,
    /// Attempts per judge call before the failure is treated as permanent
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    /// Base retry delay; attempt N waits N times this
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pause between exercises to respect provider limits
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Output budget for one verdict; rankings are short
    #[serde(default = "default_max_tokens")]
    pub max_output_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

// Default value functions
fn default_true() -> bool { true }
fn default_rpm() -> u32 { 60 }
fn default_max_tokens() -> u32 { 1024 }
fn default_max_score() -> f64 { 2.0 }
fn default_max_exercises() -> usize { 400 }
fn default_retry_budget() -> u32 { 5 }
fn default_retry_delay_ms() -> u64 { 10_000 }
fn default_inter_call_delay_ms() -> u64 { 2_000 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_output_dir() -> String { "results/runs".to_string() }

fn default_languages() -> Vec<Language> {
    Language::all()
}

fn default_criteria() -> Vec<String> {
    [
        "Problem Understanding (Comprehension)",
        "Clarity and Step-by-Step Explanation",
        "Accuracy of Process (Correctness of Steps)",
        "Correctness of Final Answer",
        "Learning Appropriateness",
        "Generalization",
        "Technical Terms Explanation",
        "Addressing Common Errors",
        "Appropriateness Based on Progress Level",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            criteria: default_criteria(),
            min_score: 0.0,
            max_score: default_max_score(),
            max_exercises: default_max_exercises(),
            retry_budget: default_retry_budget(),
            retry_delay_ms: default_retry_delay_ms(),
            inter_call_delay_ms: default_inter_call_delay_ms(),
            timeout_ms: default_timeout_ms(),
            max_output_tokens: default_max_tokens(),
            temperature: None,
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from default config locations or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = ["config/tutorbench.toml", "../config/tutorbench.toml"];

        for path in &config_paths {
            if let Ok(config) = Self::from_file(path) {
                tracing::info!("Loaded configuration from {}", path);
                return config;
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Enabled judges in roster order
    pub fn enabled_judges(&self) -> Vec<&JudgeConfig> {
        self.judges.values().filter(|j| j.enabled).collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut judges = IndexMap::new();

        judges.insert(
            "gpt-4o-mini".to_string(),
            JudgeConfig {
                name: "gpt-4o-mini".to_string(),
                enabled: true,
                protocol: JudgeProtocol::OpenAI,
                model: "gpt-4o-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: None,
                rpm: 500,
            },
        );

        judges.insert(
            "gemini-1.5-flash".to_string(),
            JudgeConfig {
                name: "gemini-1.5-flash".to_string(),
                enabled: true,
                protocol: JudgeProtocol::Gemini,
                model: "gemini-1.5-flash".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                base_url: None,
                rpm: 60,
            },
        );

        judges.insert(
            "qwen-plus".to_string(),
            JudgeConfig {
                name: "qwen-plus".to_string(),
                enabled: true,
                protocol: JudgeProtocol::OpenAI,
                model: "qwen-plus".to_string(),
                api_key_env: "DASHSCOPE_API_KEY".to_string(),
                base_url: Some(
                    "https://dashscope-intl.aliyuncs.com/compatible-mode/v1".to_string(),
                ),
                rpm: 60,
            },
        );

        Self {
            judges,
            evaluation: EvaluationConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.judges.contains_key("gpt-4o-mini"));
        assert!(config.judges.contains_key("gemini-1.5-flash"));
        assert!(config.judges.contains_key("qwen-plus"));
        assert_eq!(config.evaluation.languages.len(), 3);
        assert_eq!(config.evaluation.criteria.len(), 9);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[judges.test]
name = "test"
enabled = true
protocol = "openai"
model = "test-model"
api_key_env = "TEST_KEY"
rpm = 100

[evaluation]
max_exercises = 50
retry_budget = 3
"#;
        let config = Config::from_toml(toml).unwrap();
        assert!(config.judges.contains_key("test"));
        assert_eq!(config.judges["test"].model, "test-model");
        assert_eq!(config.evaluation.max_exercises, 50);
        assert_eq!(config.evaluation.retry_budget, 3);
        // unset fields fall back
        assert_eq!(config.evaluation.max_score, 2.0);
    }

    #[test]
    fn test_qwen_uses_compatible_endpoint() {
        let config = Config::default();
        let qwen = &config.judges["qwen-plus"];
        assert_eq!(qwen.protocol, JudgeProtocol::OpenAI);
        assert!(qwen.base_url.as_deref().unwrap().contains("dashscope"));
    }
}
