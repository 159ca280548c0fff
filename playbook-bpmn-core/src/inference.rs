//! Implicit start/end events.
//!
//! Playbooks never declare start or end events. Every container gets exactly
//! one start event and one end event per dead end, so that each element has
//! at least one incoming and one outgoing flow.

use crate::counters::IdCounters;
use crate::error::Result;
use crate::model::{FlowContainer, FlowNode, FlowNodeKind, SequenceFlow};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use std::collections::HashSet;

/// Which kind of container is being completed.
#[derive(Debug, Clone, Copy)]
pub enum ContainerKind<'a> {
    Process,
    /// Carries the subprocess id, used to name the events of an empty body.
    SubProcess(&'a str),
}

/// Replace any earlier start/end events of `container` with freshly inferred ones.
///
/// Entry points are the elements without incoming flows (or the first element
/// when every element has one). Anything still unreachable afterwards, such
/// as an isolated cycle, is wired to the start event as well. Exits are the
/// elements without outgoing flows (or the last element when none qualifies),
/// each with its own end event.
pub fn add_implicit_start_end_events(
    container: &mut FlowContainer,
    kind: ContainerKind<'_>,
    counters: &mut IdCounters,
) -> Result<()> {
    container.clear_start_end_events();

    if container.elements().is_empty() {
        let named = match kind {
            ContainerKind::SubProcess(id) => Some((format!("{}_start", id), format!("{}_end", id)))
                .filter(|(s, e)| !counters.is_reserved(s) && !counters.is_reserved(e)),
            ContainerKind::Process => None,
        };
        let (start_id, end_id) = match named {
            Some(pair) => pair,
            None => (counters.next_start_event_id(), counters.next_end_event_id()),
        };
        container.add_element(FlowNode::event(&start_id, FlowNodeKind::StartEvent))?;
        container.add_element(FlowNode::event(&end_id, FlowNodeKind::EndEvent))?;
        container.connect(SequenceFlow::new(
            counters.next_sequence_flow_id(),
            &start_id,
            &end_id,
        ))?;
        container.set_start_event(&start_id);
        container.add_end_event(&end_id);
        return Ok(());
    }

    let elements = container.elements();
    let mut entries: Vec<String> = elements
        .iter()
        .filter(|e| e.incoming().is_empty())
        .map(|e| e.id.clone())
        .collect();
    let mut exits: Vec<String> = elements
        .iter()
        .filter(|e| e.outgoing().is_empty())
        .map(|e| e.id.clone())
        .collect();
    if entries.is_empty() {
        entries.push(elements[0].id.clone());
    }
    if exits.is_empty() {
        exits.push(elements[elements.len() - 1].id.clone());
    }

    let start_id = counters.next_start_event_id();
    container.add_element(FlowNode::event(&start_id, FlowNodeKind::StartEvent))?;
    container.set_start_event(&start_id);
    for target in &entries {
        container.connect(SequenceFlow::new(
            counters.next_sequence_flow_id(),
            &start_id,
            target,
        ))?;
    }

    while let Some(orphan) = first_unreachable(container, &start_id) {
        tracing::debug!(element = %orphan, "element unreachable from start event, wiring it");
        container.connect(SequenceFlow::new(
            counters.next_sequence_flow_id(),
            &start_id,
            &orphan,
        ))?;
    }

    for source in &exits {
        let end_id = counters.next_end_event_id();
        container.add_element(FlowNode::event(&end_id, FlowNodeKind::EndEvent))?;
        container.add_end_event(&end_id);
        container.connect(SequenceFlow::new(
            counters.next_sequence_flow_id(),
            source,
            &end_id,
        ))?;
    }

    Ok(())
}

/// First non-event element (in insertion order) not reachable from `start_id`.
fn first_unreachable(container: &FlowContainer, start_id: &str) -> Option<String> {
    let mut graph = DiGraphMap::<&str, ()>::new();
    for element in container.elements() {
        graph.add_node(element.id.as_str());
    }
    for flow in container.sequence_flows() {
        graph.add_edge(flow.source_ref.as_str(), flow.target_ref.as_str(), ());
    }

    let mut reached = HashSet::new();
    let mut dfs = Dfs::new(&graph, start_id);
    while let Some(node) = dfs.next(&graph) {
        reached.insert(node);
    }

    container
        .elements()
        .iter()
        .find(|e| !e.kind.is_boundary_event() && !reached.contains(e.id.as_str()))
        .map(|e| e.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain(ids: &[&str], links: &[(&str, &str)]) -> (FlowContainer, IdCounters) {
        let mut counters = IdCounters::new();
        let mut c = FlowContainer::new();
        for id in ids {
            c.add_element(FlowNode::new(*id, *id, FlowNodeKind::Task)).unwrap();
        }
        for (from, to) in links {
            c.connect(SequenceFlow::new(counters.next_sequence_flow_id(), *from, *to))
                .unwrap();
        }
        (c, counters)
    }

    fn start_targets(c: &FlowContainer) -> Vec<String> {
        let start = c.start_event().unwrap();
        start
            .outgoing()
            .iter()
            .map(|f| c.flow(f).unwrap().target_ref.clone())
            .collect()
    }

    fn end_sources(c: &FlowContainer) -> Vec<String> {
        c.end_events()
            .map(|e| {
                assert_eq!(e.incoming().len(), 1);
                c.flow(&e.incoming()[0]).unwrap().source_ref.clone()
            })
            .collect()
    }

    #[test]
    fn linear_chain_gets_one_start_and_one_end() {
        let (mut c, mut counters) = chain(&["t1", "t2", "t3"], &[("t1", "t2"), ("t2", "t3")]);
        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();

        assert_eq!(c.start_event().unwrap().id, "startEvent_1");
        assert_eq!(start_targets(&c), vec!["t1"]);
        assert_eq!(end_sources(&c), vec!["t3"]);
        assert_eq!(c.end_events().next().unwrap().id, "endEvent_1");
        // t1..t3, start, end
        let order: Vec<&str> = c.elements().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["t1", "t2", "t3", "startEvent_1", "endEvent_1"]);
        assert_eq!(c.sequence_flows().len(), 4);
    }

    #[test]
    fn every_dead_end_gets_its_own_end_event() {
        let (mut c, mut counters) = chain(&["g", "a", "b"], &[("g", "a"), ("g", "b")]);
        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();
        assert_eq!(start_targets(&c), vec!["g"]);
        assert_eq!(end_sources(&c), vec!["a", "b"]);
        assert_eq!(c.end_events().count(), 2);
    }

    #[test]
    fn several_entries_share_one_start() {
        let (mut c, mut counters) = chain(&["a", "b", "j"], &[("a", "j"), ("b", "j")]);
        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();
        assert_eq!(start_targets(&c), vec!["a", "b"]);
        assert_eq!(c.elements().iter().filter(|e| e.kind == FlowNodeKind::StartEvent).count(), 1);
    }

    #[test]
    fn fully_cyclic_container_uses_first_and_last() {
        let (mut c, mut counters) =
            chain(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();
        assert_eq!(start_targets(&c), vec!["a"]);
        assert_eq!(end_sources(&c), vec!["c"]);
    }

    #[test]
    fn isolated_cycle_is_wired_to_start() {
        // x is an entry; loop p <-> q has no entry of its own
        let (mut c, mut counters) = chain(&["x", "p", "q"], &[("p", "q"), ("q", "p")]);
        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();
        assert_eq!(start_targets(&c), vec!["x", "p"]);
        assert_eq!(end_sources(&c), vec!["x"]);
    }

    #[test]
    fn empty_subprocess_gets_named_pair() {
        let mut c = FlowContainer::new();
        let mut counters = IdCounters::new();
        add_implicit_start_end_events(&mut c, ContainerKind::SubProcess("triage_4"), &mut counters)
            .unwrap();
        assert_eq!(c.start_event().unwrap().id, "triage_4_start");
        assert_eq!(end_sources(&c), vec!["triage_4_start"]);
        assert_eq!(c.end_events().next().unwrap().id, "triage_4_end");
        assert_eq!(c.sequence_flows()[0].id, "sequenceFlow_1");
    }

    #[test]
    fn empty_subprocess_falls_back_when_name_is_taken() {
        let mut c = FlowContainer::new();
        let mut counters = IdCounters::new();
        counters.reserve("box_start");
        add_implicit_start_end_events(&mut c, ContainerKind::SubProcess("box"), &mut counters)
            .unwrap();
        assert_eq!(c.start_event().unwrap().id, "startEvent_1");
        assert_eq!(c.end_events().next().unwrap().id, "endEvent_1");
    }

    #[test]
    fn empty_process_gets_generated_pair() {
        let mut c = FlowContainer::new();
        let mut counters = IdCounters::new();
        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();
        assert_eq!(c.start_event().unwrap().id, "startEvent_1");
        assert_eq!(c.end_events().next().unwrap().id, "endEvent_1");
    }

    #[test]
    fn second_run_reproduces_topology() {
        let (mut c, mut counters) = chain(&["g", "a", "b"], &[("g", "a"), ("g", "b")]);
        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();
        let first = (start_targets(&c), end_sources(&c), c.elements().len(), c.sequence_flows().len());

        add_implicit_start_end_events(&mut c, ContainerKind::Process, &mut counters).unwrap();
        let second = (start_targets(&c), end_sources(&c), c.elements().len(), c.sequence_flows().len());
        assert_eq!(first, second);
        assert_eq!(c.start_event().unwrap().id, "startEvent_2");
    }
}
