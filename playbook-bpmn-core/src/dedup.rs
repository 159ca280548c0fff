//! Activity id deduplication.
//!
//! Inlined modules routinely reuse ids (`quarantine_device` may appear in
//! several phases), so every id gets a `_<n>` suffix from one counter shared
//! by the whole tree. Children are renamed before their parent; gotos are
//! rewritten per level once all siblings carry their final names.
//! Branch lists are only rewritten on gateways; lowering reports and skips
//! them anywhere else.

use crate::activity::{Activities, ActivityCategory, Goto};
use crate::counters::IdCounters;
use crate::error::{PlaybookError, Result};
use std::collections::HashMap;

/// Rename every activity in the tree and rewrite all goto targets.
///
/// A goto naming an id that is not a sibling fails with
/// [`PlaybookError::Reference`].
pub fn deduplicate_ids(activities: Activities, counters: &mut IdCounters) -> Result<Activities> {
    let mut renamed = HashMap::with_capacity(activities.len());

    // Pass 1: children first, then the activity itself.
    let mut level: Vec<_> = Vec::with_capacity(activities.len());
    for mut activity in activities {
        if let Some(children) = activity.activities.take() {
            activity.activities = Some(deduplicate_ids(children, counters)?);
        }
        let new_id = format!("{}_{}", activity.id, counters.next_activity_suffix());
        renamed.insert(std::mem::replace(&mut activity.id, new_id.clone()), new_id);
        level.push(activity);
    }

    // Pass 2: gotos at this level, through the level's mapping.
    for activity in &mut level {
        let source_id = activity.id.clone();
        let is_gateway = activity.category() == Some(ActivityCategory::Gateway);
        if let Some(goto) = activity.goto.as_mut() {
            if matches!(goto, Goto::Branches(_)) && !is_gateway {
                continue;
            }
            goto.try_rename(|target| {
                renamed
                    .get(target)
                    .cloned()
                    .ok_or_else(|| PlaybookError::Reference {
                        source_id: source_id.clone(),
                        target: target.to_string(),
                    })
            })?;
        }
    }

    Ok(level.into_iter().collect())
}
