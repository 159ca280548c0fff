//! Converter configuration
//!
//! Loads an optional YAML file; every field has a default so an empty or
//! missing file is a valid configuration.

use anyhow::{Context, Result};
use playbook_bpmn_core::{LoweringOptions, DEFAULT_CONDITION_NAME_MAX_LEN, DEFAULT_MODULE_DIRS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "PLAYBOOK_BPMN_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Directory holding `<playbook>/<phase>/<file>.yml`.
    pub playbooks_root: PathBuf,
    /// BPMN files go to `<output_dir>/bpmn/`.
    pub output_dir: PathBuf,
    /// Directory names never treated as playbooks or phases.
    pub skip_dirs: Vec<String>,
    /// Restrict batch runs to these playbook directories.
    pub only_playbooks: Option<Vec<String>>,
    /// Module search templates, `{phase}` and `{playbooks}` are expanded.
    pub module_dirs: Vec<String>,
    pub condition_name_max_len: usize,
    /// Also write the combined playbook to `<output_dir>/<process>.yml`.
    pub emit_combined_yaml: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            playbooks_root: PathBuf::from("../../playbooks"),
            output_dir: PathBuf::from("./output"),
            skip_dirs: vec![
                "files".to_string(),
                "05_documentation".to_string(),
                "additional_fields".to_string(),
            ],
            only_playbooks: None,
            module_dirs: DEFAULT_MODULE_DIRS.iter().map(|s| s.to_string()).collect(),
            condition_name_max_len: DEFAULT_CONDITION_NAME_MAX_LEN,
            emit_combined_yaml: false,
        }
    }
}

impl ConverterConfig {
    /// Load from `path`, or from `PLAYBOOK_BPMN_CONFIG`, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        };
        match path {
            Some(p) => Self::from_file(&p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded converter config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn lowering_options(&self) -> LoweringOptions {
        LoweringOptions {
            condition_name_max_len: self.condition_name_max_len,
        }
    }

    pub fn bpmn_dir(&self) -> PathBuf {
        self.output_dir.join("bpmn")
    }
}
