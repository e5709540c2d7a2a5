use safetysim_core::SimError;
use safetysim_core::belief::BeliefConfig;
use safetysim_core::scaling::ScalingConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_RUN_ID: &str = "default";
const DEFAULT_SEED: u64 = 42;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root simulation configuration loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_run_id")]
    pub run_id: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub belief: BeliefConfig,
    #[serde(default)]
    pub scaling: ScalingConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            run_id: default_run_id(),
            seed: default_seed(),
            belief: BeliefConfig::default(),
            scaling: ScalingConfig::default(),
            outputs: OutputsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: SimulationConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.belief.validate()?;
        self.scaling.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            results_dir: resolve_template(&self.run_id, &self.outputs.results_dir),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            plots_dir: resolve_template(&self.run_id, &self.outputs.plots_dir),
        }
    }
}

fn default_run_id() -> String {
    DEFAULT_RUN_ID.to_string()
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Output artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputsConfig {
    pub results_dir: String,
    pub summary_md: String,
    pub plots_dir: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            results_dir: "out/{run_id}".to_string(),
            summary_md: "out/{run_id}/summary.md".to_string(),
            plots_dir: "out/{run_id}/plots".to_string(),
        }
    }
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.results_dir", &self.results_dir),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.plots_dir", &self.plots_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub results_dir: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl From<SimError> for ValidationError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::InvalidParameter { field, message } => {
                ValidationError::InvalidField { field, message }
            }
            SimError::CapOutOfRange { .. } => ValidationError::InvalidField {
                field: "scaling.compute_cap".to_string(),
                message: err.to_string(),
            },
            other => ValidationError::InvalidField {
                field: "simulation".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetysim_core::belief::Hypothesis;

    const BASIC_YAML: &str = r#"
run_id: "governance_smoke"
seed: 7
belief:
  steps: 80
  prior: 0.25
  true_hypothesis: "safe"
  likelihood:
    safe: { suspicious: 0.10, normal: 0.90 }
    hacking: { suspicious: 0.80, normal: 0.20 }
scaling:
  num_simulations: 250
  compute_cap: 1.0e23
outputs:
  results_dir: "sim/out/{run_id}"
  summary_md: "sim/out/{run_id}/summary.md"
  plots_dir: "sim/out/{run_id}/plots"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: SimulationConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.belief.steps, 80);
        assert_eq!(cfg.belief.threshold, 0.99);
        assert_eq!(cfg.belief.true_hypothesis, Hypothesis::Safe);
        assert_eq!(cfg.scaling.num_simulations, 250);
        assert_eq!(cfg.scaling.alpha_mean, 0.05);
        assert_eq!(cfg.scaling.grid.points, 100);
        assert!(cfg.logging.enable_structured);

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.summary_md,
            PathBuf::from("sim/out/governance_smoke/summary.md")
        );
    }

    #[test]
    fn empty_document_falls_back_to_defaults() {
        let mut cfg: SimulationConfig = serde_yaml::from_str("{}").expect("parse");
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg, SimulationConfig::default());
        assert_eq!(cfg.resolved_outputs().results_dir, PathBuf::from("out/default"));
    }

    #[test]
    fn rejects_prior_outside_unit_interval() {
        let yaml = BASIC_YAML.replace("prior: 0.25", "prior: 1.25");
        let mut cfg: SimulationConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("prior out of range");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "belief.prior"
        ));
    }

    #[test]
    fn rejects_cap_outside_grid() {
        let yaml = BASIC_YAML.replace("compute_cap: 1.0e23", "compute_cap: 1.0e30");
        let mut cfg: SimulationConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("cap out of range");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "scaling.compute_cap"
        ));
    }

    #[test]
    fn unnormalised_likelihood_fails_to_parse() {
        let yaml = BASIC_YAML.replace("normal: 0.90", "normal: 0.50");
        assert!(serde_yaml::from_str::<SimulationConfig>(&yaml).is_err());
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("governance_smoke", "governance smoke");
        let mut cfg: SimulationConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn reference_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/default.yaml");
        let cfg = SimulationConfig::from_path(&path).expect("reference config loads");
        assert_eq!(cfg, SimulationConfig::default());
    }

    #[test]
    fn blank_tracing_level_is_normalised() {
        let yaml = BASIC_YAML.replace("tracing_level: \"debug\"", "tracing_level: \"  \"");
        let mut cfg: SimulationConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.logging.level(), Some(Level::INFO));
    }
}
