//! File-level conversion: read a playbook, run the pipeline, write outputs.

use crate::config::ConverterConfig;
use crate::discovery::discover_playbooks;
use anyhow::{Context, Result};
use playbook_bpmn_core::{
    convert_playbook_yaml, playbook_to_yaml, Conversion, FsModuleProvider, LoweringOptions,
    PhaseContext, Severity,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub warnings: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Converter {
    config: ConverterConfig,
    provider: FsModuleProvider,
    options: LoweringOptions,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        let provider = FsModuleProvider::new(config.module_dirs.clone());
        let options = config.lowering_options();
        Self {
            config,
            provider,
            options,
        }
    }

    /// Convert one playbook file and write `<output>/bpmn/<process>.bpmn`.
    ///
    /// Returns the conversion and the path of the written BPMN file.
    pub fn convert_file(&self, file: &Path, phase_dir: &Path) -> Result<(Conversion, PathBuf)> {
        info!(file = %file.display(), "processing playbook");
        let yaml = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read playbook: {}", file.display()))?;
        let phase = PhaseContext::new(phase_dir, &self.config.playbooks_root);
        let conversion = convert_playbook_yaml(&yaml, &phase, &self.provider, &self.options)
            .with_context(|| format!("Failed to convert playbook: {}", file.display()))?;

        if self.config.emit_combined_yaml {
            let combined = playbook_to_yaml(&conversion.combined)?;
            let path = self
                .config
                .output_dir
                .join(format!("{}.yml", conversion.process_id));
            write_output(&path, &combined)?;
            info!(path = %path.display(), "combined playbook written");
        }

        let bpmn_path = self
            .config
            .bpmn_dir()
            .join(format!("{}.bpmn", conversion.process_id));
        write_output(&bpmn_path, &conversion.xml)?;
        info!(process = %conversion.process_id, path = %bpmn_path.display(), "BPMN written");

        Ok((conversion, bpmn_path))
    }

    /// Discover and convert every playbook; failures are collected, not fatal.
    pub fn run_batch(&self) -> Result<BatchReport> {
        let files = discover_playbooks(
            &self.config.playbooks_root,
            &self.config.skip_dirs,
            self.config.only_playbooks.as_deref(),
        )?;
        info!(
            root = %self.config.playbooks_root.display(),
            count = files.len(),
            "playbooks discovered"
        );

        let mut report = BatchReport::default();
        for file in files {
            match self.convert_file(&file.path, &file.phase_dir) {
                Ok((conversion, path)) => {
                    report.warnings += conversion
                        .diagnostics
                        .iter()
                        .filter(|d| d.severity == Severity::Warning)
                        .count();
                    report.converted.push(path);
                }
                Err(e) => {
                    error!(file = %file.path.display(), "{:#}", e);
                    report.failed.push((file.path, format!("{:#}", e)));
                }
            }
        }

        if report.is_success() {
            info!(converted = report.converted.len(), warnings = report.warnings, "batch finished");
        } else {
            warn!(
                converted = report.converted.len(),
                failed = report.failed.len(),
                "batch finished with failures"
            );
        }
        Ok(report)
    }
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write output: {}", path.display()))
}
