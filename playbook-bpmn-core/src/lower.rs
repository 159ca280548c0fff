//! Activity tree → BPMN graph.
//!
//! Two passes per container: nodes first (recursing into subprocesses), then
//! edges from `goto`. Start and end events are inferred once a container is
//! complete.

use crate::activity::{Activities, Activity, ActivityCategory, ActivityType, Branch, Goto, PlaybookDocument};
use crate::counters::IdCounters;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::{PlaybookError, Result};
use crate::inference::{add_implicit_start_end_events, ContainerKind};
use crate::model::{FlowContainer, FlowNode, FlowNodeKind, Process, SequenceFlow};

/// Conditions shorter than this (in characters) also become the flow name.
pub const DEFAULT_CONDITION_NAME_MAX_LEN: usize = 50;

#[derive(Debug, Clone)]
pub struct LoweringOptions {
    pub condition_name_max_len: usize,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            condition_name_max_len: DEFAULT_CONDITION_NAME_MAX_LEN,
        }
    }
}

/// Lower a deduplicated playbook into a process with inferred start/end events.
pub fn lower_playbook(
    doc: &PlaybookDocument,
    counters: &mut IdCounters,
    options: &LoweringOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Process> {
    reserve_activity_ids(&doc.activities, counters);
    let process_id = doc.process_id();
    let mut process = Process::new(process_id, process_id);
    process.container = lower_activities(&doc.activities, counters, options, diagnostics)?;
    add_implicit_start_end_events(&mut process.container, ContainerKind::Process, counters)?;
    Ok(process)
}

/// Generated ids must never reuse an activity id, whatever container it is in.
fn reserve_activity_ids(activities: &Activities, counters: &mut IdCounters) {
    for activity in activities {
        counters.reserve(activity.id.as_str());
        if let Some(children) = &activity.activities {
            reserve_activity_ids(children, counters);
        }
    }
}

/// Lower one container level. Start/end events are not added here.
pub fn lower_activities(
    activities: &Activities,
    counters: &mut IdCounters,
    options: &LoweringOptions,
    diagnostics: &mut Diagnostics,
) -> Result<FlowContainer> {
    let mut container = FlowContainer::new();

    // ── Pass 1: nodes ──
    for activity in activities {
        let kind = node_kind(activity, counters, options, diagnostics)?;
        container.add_element(FlowNode::new(&activity.id, activity.display_name(), kind))?;
    }

    // ── Pass 2: edges ──
    // Targets are siblings only; `connect` rejects anything else.
    for activity in activities {
        let Some(goto) = &activity.goto else {
            continue;
        };
        match goto {
            Goto::Target(target) => {
                let flow = SequenceFlow::new(counters.next_sequence_flow_id(), &activity.id, target);
                container.connect(flow)?;
            }
            Goto::Branches(branches) => {
                if activity.activity_type != Some(ActivityType::Xgw) {
                    let violation = PlaybookError::StructuralPolicy {
                        activity: activity.id.clone(),
                        reason: "goto list is only allowed on exclusive gateways; edges skipped"
                            .to_string(),
                    };
                    diagnostics.warn(
                        DiagnosticCode::GotoListOnNonGateway,
                        &activity.id,
                        violation.to_string(),
                    );
                    continue;
                }
                for branch in branches {
                    let (condition, target) = match branch {
                        Branch::Conditional {
                            condition: Some(condition),
                            target: Some(target),
                        } if !condition.is_empty() && !target.is_empty() => (condition, target),
                        _ => {
                            diagnostics.warn(
                                DiagnosticCode::IncompleteBranch,
                                &activity.id,
                                "branch without both 'if' and 'then' skipped",
                            );
                            continue;
                        }
                    };
                    let mut flow =
                        SequenceFlow::new(counters.next_sequence_flow_id(), &activity.id, target);
                    if condition.chars().count() < options.condition_name_max_len {
                        flow.name = Some(condition.clone());
                    }
                    flow.condition_expression = Some(condition.clone());
                    container.connect(flow)?;
                }
            }
        }
    }

    Ok(container)
}

fn node_kind(
    activity: &Activity,
    counters: &mut IdCounters,
    options: &LoweringOptions,
    diagnostics: &mut Diagnostics,
) -> Result<FlowNodeKind> {
    let kind = match &activity.activity_type {
        Some(ActivityType::Human) => FlowNodeKind::UserTask,
        Some(ActivityType::Send) => FlowNodeKind::SendTask,
        Some(ActivityType::Manual) => FlowNodeKind::ManualTask,
        Some(ActivityType::InTimer) => FlowNodeKind::TimerCatchEvent {
            timer_definition_id: counters.next_timer_definition_id(),
        },
        Some(ActivityType::Xgw) => FlowNodeKind::ExclusiveGateway,
        Some(ActivityType::Sub) => {
            let mut child = match &activity.activities {
                Some(children) => lower_activities(children, counters, options, diagnostics)?,
                None => FlowContainer::new(),
            };
            add_implicit_start_end_events(
                &mut child,
                ContainerKind::SubProcess(&activity.id),
                counters,
            )?;
            FlowNodeKind::SubProcess(child)
        }
        Some(ActivityType::Other(code)) => {
            diagnostics.warn(
                DiagnosticCode::UnknownActivityType,
                &activity.id,
                format!("unknown activity type '{}', lowered as task", code),
            );
            FlowNodeKind::Task
        }
        Some(other) => {
            let category = match other.category() {
                Some(ActivityCategory::Gateway) => "gateway",
                Some(ActivityCategory::Event) => "event",
                _ => "task",
            };
            diagnostics.info(
                DiagnosticCode::UnknownActivityType,
                &activity.id,
                format!("{} type '{}' has no dedicated element, lowered as task", category, other.code()),
            );
            FlowNodeKind::Task
        }
        None => {
            diagnostics.warn(
                DiagnosticCode::UnknownActivityType,
                &activity.id,
                "activity without type, lowered as task",
            );
            FlowNodeKind::Task
        }
    };
    Ok(kind)
}
