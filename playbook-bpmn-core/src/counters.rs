use std::collections::HashSet;

/// Identifier counters for one playbook run.
///
/// Create one per playbook and pass it through every stage; nothing else
/// keeps numbering state, so two runs never influence each other's ids.
///
/// Ids already used by activities can be reserved; generated ids skip them.
#[derive(Debug, Clone, Default)]
pub struct IdCounters {
    activity: u64,
    sequence_flow: u64,
    start_event: u64,
    end_event: u64,
    timer_definition: u64,
    reserved: HashSet<String>,
}

impl IdCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next suffix for activity renaming (starts at 1).
    pub fn next_activity_suffix(&mut self) -> u64 {
        self.activity += 1;
        self.activity
    }

    /// Keep `id` out of every generated id sequence.
    pub fn reserve(&mut self, id: impl Into<String>) {
        self.reserved.insert(id.into());
    }

    pub fn is_reserved(&self, id: &str) -> bool {
        self.reserved.contains(id)
    }

    pub fn next_sequence_flow_id(&mut self) -> String {
        next_free(&mut self.sequence_flow, "sequenceFlow", &self.reserved)
    }

    pub fn next_start_event_id(&mut self) -> String {
        next_free(&mut self.start_event, "startEvent", &self.reserved)
    }

    pub fn next_end_event_id(&mut self) -> String {
        next_free(&mut self.end_event, "endEvent", &self.reserved)
    }

    pub fn next_timer_definition_id(&mut self) -> String {
        next_free(&mut self.timer_definition, "timerEventDefinition", &self.reserved)
    }
}

fn next_free(counter: &mut u64, prefix: &str, reserved: &HashSet<String>) -> String {
    loop {
        *counter += 1;
        let id = format!("{}_{}", prefix, counter);
        if !reserved.contains(&id) {
            return id;
        }
    }
}
