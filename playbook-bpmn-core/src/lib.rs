//! Security playbooks (YAML activity trees) to BPMN 2.0 XML.
//!
//! # Architecture
//!
//! ```text
//! playbook.yml ──► PlaybookDocument ──► resolve_modules ──► deduplicate_ids
//!                                            │                    │
//!                                   ModuleProvider        IdCounters (per run)
//!                                                                 │
//!            BPMN XML ◄── process_to_bpmn_xml ◄── Process ◄── lower_playbook
//!                                                                 │
//!                                              add_implicit_start_end_events
//! ```
//!
//! # Key Concepts
//!
//! - **Module**: a YAML file named after a task id; inlining turns the task
//!   into a subprocess holding the module's activities.
//! - **IdCounters**: every generated id (`_N` suffixes, `sequenceFlow_N`,
//!   `startEvent_N`, ...) comes from one counter set created per playbook.
//! - **Diagnostics**: recoverable problems are logged and returned, never fatal.
//!
//! # Example
//!
//! ```ignore
//! use playbook_bpmn_core::{convert_playbook_yaml, FsModuleProvider, LoweringOptions, PhaseContext};
//!
//! let phase = PhaseContext::new("playbooks/malware/02_containment", "playbooks");
//! let conversion = convert_playbook_yaml(&yaml, &phase, &FsModuleProvider::default(), &LoweringOptions::default())?;
//! std::fs::write(format!("{}.bpmn", conversion.process_id), conversion.xml)?;
//! ```

pub mod activity;
pub mod counters;
pub mod dedup;
pub mod diagnostics;
pub mod error;
pub mod export_bpmn;
pub mod inference;
pub mod lower;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod yaml;

pub use activity::{
    Activities, Activity, ActivityCategory, ActivityType, Branch, Goto, ModuleDocument,
    PlaybookDocument, DEFAULT_PROCESS_ID,
};
pub use counters::IdCounters;
pub use dedup::deduplicate_ids;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use error::{PlaybookError, Result};
pub use export_bpmn::process_to_bpmn_xml;
pub use inference::{add_implicit_start_end_events, ContainerKind};
pub use lower::{lower_activities, lower_playbook, LoweringOptions, DEFAULT_CONDITION_NAME_MAX_LEN};
pub use model::{FlowContainer, FlowNode, FlowNodeKind, Process, SequenceFlow};
pub use pipeline::{convert_playbook, convert_playbook_yaml, Conversion};
pub use provider::{
    FsModuleProvider, MemoryModuleProvider, ModuleProvider, ModuleSource, PhaseContext,
    DEFAULT_MODULE_DIRS,
};
pub use resolver::resolve_modules;
pub use yaml::{parse_module_yaml, parse_playbook_yaml, playbook_to_yaml};
