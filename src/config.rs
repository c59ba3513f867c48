use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MealcamConfig {
    pub catalog: CatalogConfig,
    pub capture: CaptureConfig,
    pub analyzer: AnalyzerConfig,
    pub preferences: PreferencesConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    /// Seed the catalog with the sample menu on startup
    #[serde(default = "default_seed_sample")]
    pub seed_sample: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Directory prefix for fabricated artifact references
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalyzerConfig {
    /// Simulated processing delay in milliseconds
    #[serde(default = "default_analyzer_delay_ms")]
    pub delay_ms: u64,

    /// Confidence score reported with every fabricated result (0.0 - 1.0)
    #[serde(default = "default_analyzer_confidence")]
    pub confidence: f64,

    /// Fabricated nutrition numbers
    #[serde(default = "default_analyzer_calories")]
    pub calories: f64,
    #[serde(default = "default_analyzer_protein")]
    pub protein_g: f64,
    #[serde(default = "default_analyzer_carbs")]
    pub carbs_g: f64,
    #[serde(default = "default_analyzer_fat")]
    pub fat_g: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PreferencesConfig {
    /// Path of the preferences file (the only persisted state)
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl MealcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("mealcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("catalog.seed_sample", default_seed_sample())?
            .set_default("capture.artifact_dir", default_artifact_dir())?
            .set_default("analyzer.delay_ms", default_analyzer_delay_ms() as i64)?
            .set_default("analyzer.confidence", default_analyzer_confidence())?
            .set_default("analyzer.calories", default_analyzer_calories())?
            .set_default("analyzer.protein_g", default_analyzer_protein())?
            .set_default("analyzer.carbs_g", default_analyzer_carbs())?
            .set_default("analyzer.fat_g", default_analyzer_fat())?
            .set_default("preferences.path", default_preferences_path())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with MEALCAM_ prefix
            .add_source(Environment::with_prefix("MEALCAM").separator("_"))
            .build()?;

        let config: MealcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.artifact_dir.trim().is_empty() {
            return Err(ConfigError::Message(
                "Capture artifact_dir must not be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.analyzer.confidence) {
            return Err(ConfigError::Message(
                "Analyzer confidence must be between 0.0 and 1.0".to_string(),
            ));
        }

        for (field, value) in [
            ("calories", self.analyzer.calories),
            ("protein_g", self.analyzer.protein_g),
            ("carbs_g", self.analyzer.carbs_g),
            ("fat_g", self.analyzer.fat_g),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "Analyzer {} must be a non-negative number",
                    field
                )));
            }
        }

        if self.preferences.path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Preferences path must not be empty".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for MealcamConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                seed_sample: default_seed_sample(),
            },
            capture: CaptureConfig {
                artifact_dir: default_artifact_dir(),
            },
            analyzer: AnalyzerConfig {
                delay_ms: default_analyzer_delay_ms(),
                confidence: default_analyzer_confidence(),
                calories: default_analyzer_calories(),
                protein_g: default_analyzer_protein(),
                carbs_g: default_analyzer_carbs(),
                fat_g: default_analyzer_fat(),
            },
            preferences: PreferencesConfig {
                path: default_preferences_path(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

fn default_seed_sample() -> bool {
    true
}
fn default_artifact_dir() -> String {
    "./artifacts".to_string()
}
fn default_analyzer_delay_ms() -> u64 {
    2000
}
fn default_analyzer_confidence() -> f64 {
    0.85
}
fn default_analyzer_calories() -> f64 {
    410.0
}
fn default_analyzer_protein() -> f64 {
    18.0
}
fn default_analyzer_carbs() -> f64 {
    55.0
}
fn default_analyzer_fat() -> f64 {
    12.0
}
fn default_preferences_path() -> String {
    "mealcam_prefs.toml".to_string()
}
fn default_event_bus_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MealcamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analyzer.delay_ms, 2000);
        assert_eq!(config.analyzer.confidence, 0.85);
    }

    #[test]
    fn test_config_validation() {
        let mut config = MealcamConfig::default();

        config.analyzer.confidence = 1.5;
        assert!(config.validate().is_err());
        config.analyzer.confidence = 0.85;
        assert!(config.validate().is_ok());

        config.system.event_bus_capacity = 0;
        assert!(config.validate().is_err());
        config.system.event_bus_capacity = 100;

        config.capture.artifact_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = MealcamConfig::load_from_file("does-not-exist.toml").unwrap();
        assert_eq!(config.preferences.path, "mealcam_prefs.toml");
        assert!(config.catalog.seed_sample);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mealcam.toml");
        std::fs::write(
            &path,
            "[analyzer]\ndelay_ms = 10\nconfidence = 0.5\n",
        )
        .unwrap();

        let config = MealcamConfig::load_from_file(&path).unwrap();
        assert_eq!(config.analyzer.delay_ms, 10);
        assert_eq!(config.analyzer.confidence, 0.5);
        // Untouched sections keep their defaults
        assert_eq!(config.system.event_bus_capacity, 100);
    }
}
