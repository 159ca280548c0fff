use crate::error::Result;
use std::collections::HashMap;
use std::path::PathBuf;

/// Where a playbook lives: its phase directory and the playbooks root that
/// holds the shared documentation modules.
#[derive(Debug, Clone)]
pub struct PhaseContext {
    pub phase_dir: PathBuf,
    pub playbooks_root: PathBuf,
}

impl PhaseContext {
    pub fn new(phase_dir: impl Into<PathBuf>, playbooks_root: impl Into<PathBuf>) -> Self {
        Self {
            phase_dir: phase_dir.into(),
            playbooks_root: playbooks_root.into(),
        }
    }
}

/// Raw contents of a module as found by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// Human-readable origin (a path for files).
    pub location: String,
    pub contents: String,
}

/// Module lookup. Implementations return the first match from their ordered
/// candidate locations, or `None` when the module does not exist anywhere.
///
/// An `Err` means a candidate exists but could not be read.
pub trait ModuleProvider {
    fn find_module(&self, module_id: &str, phase: &PhaseContext) -> Result<Option<ModuleSource>>;
}

// ── Filesystem provider ──

/// Default candidate directories, searched in order.
pub const DEFAULT_MODULE_DIRS: [&str; 3] = [
    "{phase}/modules",
    "{playbooks}/05_documentation",
    "{playbooks}/05_documentation/modules",
];

pub const MODULE_FILE_EXT: &str = "yml";

/// Looks for `<dir>/<module_id>.yml` in each candidate directory.
///
/// Directory templates may use `{phase}` and `{playbooks}`, which expand to
/// the phase directory and the playbooks root of the current playbook.
#[derive(Debug, Clone)]
pub struct FsModuleProvider {
    dir_templates: Vec<String>,
}

impl FsModuleProvider {
    pub fn new(dir_templates: Vec<String>) -> Self {
        Self { dir_templates }
    }

    pub fn candidate_paths(&self, module_id: &str, phase: &PhaseContext) -> Vec<PathBuf> {
        let file_name = format!("{}.{}", module_id, MODULE_FILE_EXT);
        self.dir_templates
            .iter()
            .map(|tpl| expand_dir(tpl, phase).join(&file_name))
            .collect()
    }
}

impl Default for FsModuleProvider {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE_DIRS.iter().map(|s| s.to_string()).collect())
    }
}

fn expand_dir(template: &str, phase: &PhaseContext) -> PathBuf {
    let phase_dir = phase.phase_dir.to_string_lossy();
    let root = phase.playbooks_root.to_string_lossy();
    PathBuf::from(
        template
            .replace("{phase}", &phase_dir)
            .replace("{playbooks}", &root),
    )
}

impl ModuleProvider for FsModuleProvider {
    fn find_module(&self, module_id: &str, phase: &PhaseContext) -> Result<Option<ModuleSource>> {
        for path in self.candidate_paths(module_id, phase) {
            tracing::debug!(module = module_id, path = %path.display(), "searching module");
            if path.is_file() {
                tracing::debug!(path = %path.display(), "module found");
                let contents = std::fs::read_to_string(&path)?;
                return Ok(Some(ModuleSource {
                    location: path.display().to_string(),
                    contents,
                }));
            }
        }
        Ok(None)
    }
}

// ── In-memory provider ──

/// In-memory ModuleProvider for testing. Ignores the phase context.
#[derive(Debug, Clone, Default)]
pub struct MemoryModuleProvider {
    modules: HashMap<String, String>,
}

impl MemoryModuleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module_id: impl Into<String>, yaml: impl Into<String>) -> Self {
        self.modules.insert(module_id.into(), yaml.into());
        self
    }
}

impl ModuleProvider for MemoryModuleProvider {
    fn find_module(&self, module_id: &str, _phase: &PhaseContext) -> Result<Option<ModuleSource>> {
        Ok(self.modules.get(module_id).map(|contents| ModuleSource {
            location: format!("memory:{}", module_id),
            contents: contents.clone(),
        }))
    }
}
