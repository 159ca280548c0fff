use crate::error::{PlaybookError, Result};
use crate::model::{FlowContainer, FlowNode, FlowNodeKind, Process, SequenceFlow};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const BPMN_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
pub const BPMNDI_NS: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
pub const DC_NS: &str = "http://www.omg.org/spec/DD/20100524/DC";
pub const DI_NS: &str = "http://www.omg.org/spec/DD/20100524/DI";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const TARGET_NS: &str = "http://bpmn.io/schema/bpmn";

/// Export a lowered `Process` to BPMN 2.0 XML.
///
/// ## Layout
/// - One `bpmn:process` inside `bpmn:definitions`, no diagram interchange.
/// - Per container: flow elements in insertion order, then sequence flows.
/// - Each element lists `bpmn:incoming` then `bpmn:outgoing`, before any
///   nested content (timer definition, subprocess body).
/// - Tab indentation, one level per nesting depth.
pub fn process_to_bpmn_xml(process: &Process) -> Result<String> {
    let mut out = XmlOut::new();

    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.start(
        "bpmn:definitions",
        &[
            ("xmlns:bpmn", BPMN_NS),
            ("xmlns:bpmndi", BPMNDI_NS),
            ("xmlns:dc", DC_NS),
            ("xmlns:di", DI_NS),
            ("xmlns:xsi", XSI_NS),
            ("targetNamespace", TARGET_NS),
        ],
    )?;
    let executable = if process.is_executable { "true" } else { "false" };
    out.start(
        "bpmn:process",
        &[
            ("id", process.id.as_str()),
            ("name", process.name.as_str()),
            ("isExecutable", executable),
        ],
    )?;
    write_container(&mut out, &process.container)?;
    out.end("bpmn:process")?;
    out.end("bpmn:definitions")?;

    out.finish()
}

fn write_container(out: &mut XmlOut, container: &FlowContainer) -> Result<()> {
    for node in container.elements() {
        write_node(out, node)?;
    }
    for flow in container.sequence_flows() {
        write_flow(out, flow)?;
    }
    Ok(())
}

fn write_node(out: &mut XmlOut, node: &FlowNode) -> Result<()> {
    let tag = format!("bpmn:{}", node.kind.tag());
    let attrs = [("id", node.id.as_str()), ("name", node.name.as_str())];

    let has_body = !node.incoming().is_empty()
        || !node.outgoing().is_empty()
        || matches!(
            node.kind,
            FlowNodeKind::TimerCatchEvent { .. } | FlowNodeKind::SubProcess(_)
        );
    if !has_body {
        return out.empty(&tag, &attrs);
    }

    out.start(&tag, &attrs)?;
    for flow_id in node.incoming() {
        out.text_element("bpmn:incoming", flow_id)?;
    }
    for flow_id in node.outgoing() {
        out.text_element("bpmn:outgoing", flow_id)?;
    }
    match &node.kind {
        FlowNodeKind::TimerCatchEvent { timer_definition_id } => {
            out.empty("bpmn:timerEventDefinition", &[("id", timer_definition_id.as_str())])?;
        }
        FlowNodeKind::SubProcess(inner) => write_container(out, inner)?,
        FlowNodeKind::StartEvent
        | FlowNodeKind::EndEvent
        | FlowNodeKind::UserTask
        | FlowNodeKind::SendTask
        | FlowNodeKind::ManualTask
        | FlowNodeKind::ExclusiveGateway
        | FlowNodeKind::Task => {}
    }
    out.end(&tag)
}

fn write_flow(out: &mut XmlOut, flow: &SequenceFlow) -> Result<()> {
    let mut attrs = vec![("id", flow.id.as_str())];
    if let Some(name) = &flow.name {
        attrs.push(("name", name.as_str()));
    }
    attrs.push(("sourceRef", flow.source_ref.as_str()));
    attrs.push(("targetRef", flow.target_ref.as_str()));

    match &flow.condition_expression {
        Some(condition) => {
            out.start("bpmn:sequenceFlow", &attrs)?;
            out.start("bpmn:conditionExpression", &[("xsi:type", "tFormalExpression")])?;
            out.text(condition)?;
            out.end("bpmn:conditionExpression")?;
            out.end("bpmn:sequenceFlow")
        }
        None => out.empty("bpmn:sequenceFlow", &attrs),
    }
}

// ── Writer wrapper ──

/// Thin layer over `quick_xml::Writer` that maps errors into `PlaybookError`.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b'\t', 1),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| PlaybookError::Xml(e.to_string()))
    }

    fn start(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.event(Event::Start(elem))
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(elem))
    }

    fn end(&mut self, tag: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn text_element(&mut self, tag: &str, text: &str) -> Result<()> {
        self.start(tag, &[])?;
        self.text(text)?;
        self.end(tag)
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| PlaybookError::Xml(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::IdCounters;
    use crate::diagnostics::Diagnostics;
    use crate::lower::{lower_playbook, LoweringOptions};
    use crate::yaml::parse_playbook_yaml;

    fn export(yaml: &str) -> String {
        let doc = parse_playbook_yaml(yaml).unwrap();
        let process = lower_playbook(
            &doc,
            &mut IdCounters::new(),
            &LoweringOptions::default(),
            &mut Diagnostics::new(),
        )
        .unwrap();
        process_to_bpmn_xml(&process).unwrap()
    }

    #[test]
    fn header_and_namespaces() {
        let xml = export("process: Contain_malware\nactivities:\n  a:\n    type: human\n");
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL""#));
        assert!(xml.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
        assert!(xml.contains(r#"targetNamespace="http://bpmn.io/schema/bpmn""#));
        assert!(xml.contains(
            r#"<bpmn:process id="Contain_malware" name="Contain_malware" isExecutable="true">"#
        ));
        assert!(xml.contains("\n\t\t<bpmn:userTask id=\"a\" name=\"a\">"));
        assert!(xml.contains("\t\t\t<bpmn:incoming>sequenceFlow_1</bpmn:incoming>"));
    }

    #[test]
    fn conditions_are_escaped() {
        let xml = export(
            r#"
activities:
  g:
    type: xgw
    goto:
      - if: "x>1 & ready"
        then: a
  a:
    type: human
"#,
        );
        assert!(xml.contains(r#"name="x&gt;1 &amp; ready""#));
        assert!(xml.contains(
            r#"<bpmn:conditionExpression xsi:type="tFormalExpression">x&gt;1 &amp; ready</bpmn:conditionExpression>"#
        ));
    }

    #[test]
    fn unnamed_flow_has_no_name_attribute() {
        let xml = export("activities:\n  a:\n    type: human\n    goto: b\n  b:\n    type: human\n");
        assert!(xml.contains(r#"<bpmn:sequenceFlow id="sequenceFlow_1" sourceRef="a" targetRef="b"/>"#));
    }

    #[test]
    fn timer_definition_is_nested() {
        let xml = export("activities:\n  wait:\n    type: intimer\n");
        assert!(xml.contains(r#"<bpmn:intermediateCatchEvent id="wait" name="wait">"#));
        assert_eq!(xml.matches("<bpmn:timerEventDefinition").count(), 1);
        assert!(xml.contains(r#"<bpmn:timerEventDefinition id="timerEventDefinition_1"/>"#));
    }

    #[test]
    fn subprocess_body_is_nested() {
        let xml = export(
            "activities:\n  box:\n    type: sub\n    activities:\n      inner:\n        type: manual\n",
        );
        let sub_open = xml.find(r#"<bpmn:subProcess id="box""#).unwrap();
        let inner = xml.find(r#"<bpmn:manualTask id="inner""#).unwrap();
        let sub_close = xml.find("</bpmn:subProcess>").unwrap();
        assert!(sub_open < inner && inner < sub_close);
    }
}
