//! In-memory BPMN graph produced by lowering and read by the XML export.

use crate::error::{PlaybookError, Result};
use std::collections::HashSet;

// ─── Flow nodes ───────────────────────────────────────────────

/// Variant-specific part of a flow node.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowNodeKind {
    StartEvent,
    EndEvent,
    UserTask,
    SendTask,
    ManualTask,
    /// `intermediateCatchEvent` with a nested `timerEventDefinition`.
    TimerCatchEvent { timer_definition_id: String },
    ExclusiveGateway,
    /// A subprocess node owns its own container.
    SubProcess(FlowContainer),
    /// Fallback for everything without a dedicated element.
    Task,
}

impl FlowNodeKind {
    /// Local name of the BPMN element (without the `bpmn:` prefix).
    pub fn tag(&self) -> &'static str {
        match self {
            FlowNodeKind::StartEvent => "startEvent",
            FlowNodeKind::EndEvent => "endEvent",
            FlowNodeKind::UserTask => "userTask",
            FlowNodeKind::SendTask => "sendTask",
            FlowNodeKind::ManualTask => "manualTask",
            FlowNodeKind::TimerCatchEvent { .. } => "intermediateCatchEvent",
            FlowNodeKind::ExclusiveGateway => "exclusiveGateway",
            FlowNodeKind::SubProcess(_) => "subProcess",
            FlowNodeKind::Task => "task",
        }
    }

    /// Start and end events are inferred, never lowered from activities.
    pub fn is_boundary_event(&self) -> bool {
        matches!(self, FlowNodeKind::StartEvent | FlowNodeKind::EndEvent)
    }
}

/// A node connectable by sequence flows.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    pub id: String,
    pub name: String,
    pub kind: FlowNodeKind,
    incoming: Vec<String>,
    outgoing: Vec<String>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: FlowNodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// Events created by inference are named after their id.
    pub fn event(id: impl Into<String>, kind: FlowNodeKind) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, kind)
    }

    pub fn incoming(&self) -> &[String] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[String] {
        &self.outgoing
    }

    pub fn add_incoming(&mut self, flow_id: &str) {
        if !self.incoming.iter().any(|f| f == flow_id) {
            self.incoming.push(flow_id.to_string());
        }
    }

    pub fn add_outgoing(&mut self, flow_id: &str) {
        if !self.outgoing.iter().any(|f| f == flow_id) {
            self.outgoing.push(flow_id.to_string());
        }
    }

    fn forget_flows(&mut self, flow_ids: &HashSet<String>) {
        self.incoming.retain(|f| !flow_ids.contains(f));
        self.outgoing.retain(|f| !flow_ids.contains(f));
    }
}

// ─── Sequence flows ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFlow {
    pub id: String,
    pub name: Option<String>,
    pub source_ref: String,
    pub target_ref: String,
    pub condition_expression: Option<String>,
}

impl SequenceFlow {
    pub fn new(id: impl Into<String>, source_ref: impl Into<String>, target_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            source_ref: source_ref.into(),
            target_ref: target_ref.into(),
            condition_expression: None,
        }
    }
}

// ─── Containers ───────────────────────────────────────────────

/// Shared shape of a process and a subprocess.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowContainer {
    start_event: Option<String>,
    end_events: Vec<String>,
    elements: Vec<FlowNode>,
    sequence_flows: Vec<SequenceFlow>,
}

impl FlowContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[FlowNode] {
        &self.elements
    }

    pub fn sequence_flows(&self) -> &[SequenceFlow] {
        &self.sequence_flows
    }

    pub fn start_event(&self) -> Option<&FlowNode> {
        self.start_event.as_deref().and_then(|id| self.element(id))
    }

    pub fn end_events(&self) -> impl Iterator<Item = &FlowNode> {
        self.end_events.iter().filter_map(|id| self.element(id))
    }

    pub fn element(&self, id: &str) -> Option<&FlowNode> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn flow(&self, id: &str) -> Option<&SequenceFlow> {
        self.sequence_flows.iter().find(|f| f.id == id)
    }

    /// Appends an element. Ids are unique within a container.
    pub fn add_element(&mut self, element: FlowNode) -> Result<()> {
        if self.element(&element.id).is_some() {
            return Err(PlaybookError::DuplicateElement { id: element.id });
        }
        self.elements.push(element);
        Ok(())
    }

    pub fn set_start_event(&mut self, id: &str) {
        self.start_event = Some(id.to_string());
    }

    pub fn add_end_event(&mut self, id: &str) {
        if !self.end_events.iter().any(|e| e == id) {
            self.end_events.push(id.to_string());
        }
    }

    /// Adds `flow` and registers it on both endpoints.
    pub fn connect(&mut self, flow: SequenceFlow) -> Result<()> {
        if self.flow(&flow.id).is_some() {
            return Ok(());
        }
        for endpoint in [&flow.source_ref, &flow.target_ref] {
            if self.element(endpoint).is_none() {
                return Err(PlaybookError::Reference {
                    source_id: flow.source_ref.clone(),
                    target: endpoint.clone(),
                });
            }
        }
        if let Some(source) = self.element_mut(&flow.source_ref) {
            source.add_outgoing(&flow.id);
        }
        if let Some(target) = self.element_mut(&flow.target_ref) {
            target.add_incoming(&flow.id);
        }
        self.sequence_flows.push(flow);
        Ok(())
    }

    /// Drops previously inferred start/end events together with their flows
    /// and the references those flows left on other elements.
    pub fn clear_start_end_events(&mut self) {
        let event_ids: HashSet<String> = self
            .elements
            .iter()
            .filter(|e| e.kind.is_boundary_event())
            .map(|e| e.id.clone())
            .collect();
        let flow_ids: HashSet<String> = self
            .sequence_flows
            .iter()
            .filter(|f| event_ids.contains(&f.source_ref) || event_ids.contains(&f.target_ref))
            .map(|f| f.id.clone())
            .collect();

        self.elements.retain(|e| !event_ids.contains(&e.id));
        self.sequence_flows.retain(|f| !flow_ids.contains(&f.id));
        for element in &mut self.elements {
            element.forget_flows(&flow_ids);
        }
        self.start_event = None;
        self.end_events.clear();
    }
}

// ─── Process ──────────────────────────────────────────────────

/// The root container of one playbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub id: String,
    pub name: String,
    pub is_executable: bool,
    pub container: FlowContainer,
}

impl Process {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_executable: true,
            container: FlowContainer::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tasks() -> FlowContainer {
        let mut c = FlowContainer::new();
        c.add_element(FlowNode::new("a", "A", FlowNodeKind::UserTask)).unwrap();
        c.add_element(FlowNode::new("b", "B", FlowNodeKind::Task)).unwrap();
        c
    }

    #[test]
    fn connect_registers_both_ends_once() {
        let mut c = two_tasks();
        c.connect(SequenceFlow::new("f1", "a", "b")).unwrap();
        c.connect(SequenceFlow::new("f1", "a", "b")).unwrap();
        assert_eq!(c.sequence_flows().len(), 1);
        assert_eq!(c.element("a").unwrap().outgoing(), ["f1".to_string()]);
        assert_eq!(c.element("b").unwrap().incoming(), ["f1".to_string()]);
    }

    #[test]
    fn connect_to_unknown_node_fails() {
        let mut c = two_tasks();
        assert!(matches!(
            c.connect(SequenceFlow::new("f1", "a", "zzz")),
            Err(PlaybookError::Reference { .. })
        ));
        assert!(c.sequence_flows().is_empty());
        assert!(c.element("a").unwrap().outgoing().is_empty());
    }

    #[test]
    fn duplicate_elements_are_rejected() {
        let mut c = two_tasks();
        let err = c
            .add_element(FlowNode::event("a", FlowNodeKind::StartEvent))
            .unwrap_err();
        assert!(matches!(err, PlaybookError::DuplicateElement { ref id } if id == "a"));
        assert_eq!(c.elements().len(), 2);
        assert_eq!(c.element("a").unwrap().name, "A");
    }

    #[test]
    fn clearing_events_detaches_their_flows() {
        let mut c = two_tasks();
        c.connect(SequenceFlow::new("f1", "a", "b")).unwrap();
        c.add_element(FlowNode::event("start", FlowNodeKind::StartEvent)).unwrap();
        c.add_element(FlowNode::event("end", FlowNodeKind::EndEvent)).unwrap();
        c.connect(SequenceFlow::new("f2", "start", "a")).unwrap();
        c.connect(SequenceFlow::new("f3", "b", "end")).unwrap();
        c.set_start_event("start");
        c.add_end_event("end");
        assert_eq!(c.start_event().unwrap().id, "start");

        c.clear_start_end_events();
        assert!(c.start_event().is_none());
        assert_eq!(c.end_events().count(), 0);
        assert_eq!(c.elements().len(), 2);
        assert_eq!(c.sequence_flows().len(), 1);
        assert!(c.element("a").unwrap().incoming().is_empty());
        assert!(c.element("b").unwrap().outgoing().is_empty());
    }
}
