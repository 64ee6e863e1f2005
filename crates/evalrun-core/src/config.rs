use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::RunOptions;
use crate::errors::ConfigError;
use crate::model::{EvalCase, Params, TaskDeclaration};
use crate::task::TaskRunner;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// A suite file: one task section, its evals and run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub version: u32,
    pub task: TaskSection,
    #[serde(default)]
    pub evals: Vec<EvalCase>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<String>,
    #[serde(default)]
    pub defaults: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Params>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub runs_per_eval: u32,
    pub max_concurrency: usize,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runs_per_eval: 1,
            max_concurrency: 1,
            verbose: false,
        }
    }
}

impl SuiteConfig {
    /// Bind the suite to the function under test.
    pub fn into_declaration(self, task: Arc<dyn TaskRunner>) -> TaskDeclaration {
        let TaskSection {
            name,
            description,
            scorer,
            defaults,
            matrix,
        } = self.task;

        let mut decl = TaskDeclaration::new(name, task)
            .with_defaults(defaults)
            .with_evals(self.evals);
        decl.description = description;
        decl.scorer = scorer;
        decl.matrix = matrix;
        decl
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions::default()
            .with_runs_per_eval(self.settings.runs_per_eval)
            .with_max_concurrency(self.settings.max_concurrency)
            .with_verbose(self.settings.verbose)
    }
}

pub fn load_suite(path: &Path) -> Result<SuiteConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: SuiteConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: cfg.version,
            supported: SUPPORTED_CONFIG_VERSION,
        });
    }
    if cfg.evals.is_empty() {
        return Err(ConfigError::NoEvals {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(path = %path.display(), evals = cfg.evals.len(), "loaded suite");
    Ok(cfg)
}

pub fn write_sample_suite(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, include_str!("../../../eval.yaml")).map_err(|source| {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}
