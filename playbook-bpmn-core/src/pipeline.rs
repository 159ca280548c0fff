//! One playbook, end to end: resolve → deduplicate → lower → export.

use crate::activity::PlaybookDocument;
use crate::counters::IdCounters;
use crate::dedup::deduplicate_ids;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;
use crate::export_bpmn::process_to_bpmn_xml;
use crate::lower::{lower_playbook, LoweringOptions};
use crate::model::Process;
use crate::provider::{ModuleProvider, PhaseContext};
use crate::resolver::resolve_modules;
use crate::yaml::parse_playbook_yaml;

/// Everything produced for one playbook.
#[derive(Debug)]
pub struct Conversion {
    pub process_id: String,
    /// The playbook after module inlining and renaming.
    pub combined: PlaybookDocument,
    pub process: Process,
    pub xml: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Convert an already parsed playbook. Counters start fresh for every call.
pub fn convert_playbook(
    doc: PlaybookDocument,
    phase: &PhaseContext,
    provider: &dyn ModuleProvider,
    options: &LoweringOptions,
) -> Result<Conversion> {
    let mut counters = IdCounters::new();
    let mut diagnostics = Diagnostics::new();
    let process_id = doc.process_id().to_string();

    let PlaybookDocument {
        process,
        activities,
        extra,
    } = doc;
    let activities = resolve_modules(activities, phase, provider, &mut diagnostics);
    let activities = deduplicate_ids(activities, &mut counters)?;
    let combined = PlaybookDocument {
        process,
        activities,
        extra,
    };

    let bpmn = lower_playbook(&combined, &mut counters, options, &mut diagnostics)?;
    let xml = process_to_bpmn_xml(&bpmn)?;

    tracing::info!(
        process = %process_id,
        diagnostics = diagnostics.len(),
        "playbook converted"
    );

    Ok(Conversion {
        process_id,
        combined,
        process: bpmn,
        xml,
        diagnostics: diagnostics.into_vec(),
    })
}

/// Parse and convert YAML source.
pub fn convert_playbook_yaml(
    yaml: &str,
    phase: &PhaseContext,
    provider: &dyn ModuleProvider,
    options: &LoweringOptions,
) -> Result<Conversion> {
    let doc = parse_playbook_yaml(yaml)?;
    convert_playbook(doc, phase, provider, options)
}
