//! Module inlining.
//!
//! A task whose id names a module file is replaced by a subprocess wrapping
//! that module's activities. The tree is rebuilt, never mutated in place.

use crate::activity::{Activities, Activity, ActivityCategory, ActivityType};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::PlaybookError;
use crate::provider::{ModuleProvider, PhaseContext};
use crate::yaml::parse_module_yaml;

/// Inline every module referenced by a task anywhere in `activities`.
///
/// Failures are recovered: the affected task is kept as is and a diagnostic
/// is recorded.
pub fn resolve_modules(
    activities: Activities,
    phase: &PhaseContext,
    provider: &dyn ModuleProvider,
    diagnostics: &mut Diagnostics,
) -> Activities {
    let mut expanding = Vec::new();
    resolve_level(activities, phase, provider, diagnostics, &mut expanding)
}

fn resolve_level(
    activities: Activities,
    phase: &PhaseContext,
    provider: &dyn ModuleProvider,
    diagnostics: &mut Diagnostics,
    expanding: &mut Vec<String>,
) -> Activities {
    activities
        .into_iter()
        .map(|mut activity| match activity.category() {
            Some(ActivityCategory::Task) => {
                inline_module(activity, phase, provider, diagnostics, expanding)
            }
            Some(ActivityCategory::Subprocess) => {
                if let Some(children) = activity.activities.take() {
                    activity.activities =
                        Some(resolve_level(children, phase, provider, diagnostics, expanding));
                }
                activity
            }
            _ => activity,
        })
        .collect()
}

fn inline_module(
    mut activity: Activity,
    phase: &PhaseContext,
    provider: &dyn ModuleProvider,
    diagnostics: &mut Diagnostics,
    expanding: &mut Vec<String>,
) -> Activity {
    tracing::debug!(task = %activity.id, "task found, looking for module");

    if expanding.iter().any(|m| *m == activity.id) {
        diagnostics.warn(
            DiagnosticCode::ModuleCycle,
            &activity.id,
            format!(
                "module '{}' is already being inlined ({}); keeping task",
                activity.id,
                expanding.join(" -> ")
            ),
        );
        return activity;
    }

    let source = match provider.find_module(&activity.id, phase) {
        Ok(Some(source)) => source,
        Ok(None) => return activity,
        Err(e) => {
            diagnostics.warn(
                DiagnosticCode::UnresolvedModule,
                &activity.id,
                format!("unable to read module: {}", e),
            );
            return activity;
        }
    };

    let module = match parse_module_yaml(&source.contents) {
        Ok(module) => module,
        Err(e) => {
            let err = PlaybookError::ModuleResolution {
                module: activity.id.clone(),
                location: source.location,
                reason: e.to_string(),
            };
            diagnostics.warn(DiagnosticCode::UnresolvedModule, &activity.id, err.to_string());
            return activity;
        }
    };

    tracing::info!(task = %activity.id, location = %source.location, "inlining module");
    expanding.push(activity.id.clone());
    let inner = resolve_level(module.activities, phase, provider, diagnostics, expanding);
    expanding.pop();

    activity.activities = Some(inner);
    activity.activity_type = Some(ActivityType::Sub);
    activity
}
