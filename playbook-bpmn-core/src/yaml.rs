use crate::activity::{ModuleDocument, PlaybookDocument};
use crate::error::Result;

/// Parse a YAML string into a PlaybookDocument.
///
/// Modules are NOT resolved here. Run `resolve_modules()` or use
/// `convert_playbook()` which resolves, renames and lowers in one go.
pub fn parse_playbook_yaml(yaml_str: &str) -> Result<PlaybookDocument> {
    let doc: PlaybookDocument = serde_yaml::from_str(yaml_str)?;
    Ok(doc)
}

/// Parse a module file. A module without an `activities` mapping is an error.
pub fn parse_module_yaml(yaml_str: &str) -> Result<ModuleDocument> {
    let module: ModuleDocument = serde_yaml::from_str(yaml_str)?;
    Ok(module)
}

/// Render the combined playbook back to YAML, keeping activity order.
pub fn playbook_to_yaml(doc: &PlaybookDocument) -> Result<String> {
    Ok(serde_yaml::to_string(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::*;

    #[test]
    fn test_basic_yaml_parse() {
        let yaml = r#"
process: contain_malware
activities:
  isolate_host:
    type: human
    name: Isolate host
    goto: notify_soc
  notify_soc:
    type: send
"#;
        let doc = parse_playbook_yaml(yaml).unwrap();
        assert_eq!(doc.process_id(), "contain_malware");
        assert_eq!(doc.activities.len(), 2);
        let ids: Vec<&str> = doc.activities.ids().collect();
        assert_eq!(ids, vec!["isolate_host", "notify_soc"]);

        let first = doc.activities.get("isolate_host").unwrap();
        assert_eq!(first.activity_type, Some(ActivityType::Human));
        assert_eq!(first.display_name(), "Isolate host");
        assert_eq!(first.goto, Some(Goto::Target("notify_soc".into())));
        assert_eq!(doc.activities.get("notify_soc").unwrap().display_name(), "notify_soc");
    }

    #[test]
    fn test_yaml_with_branches() {
        let yaml = r#"
process: triage
activities:
  check:
    type: xgw
    goto:
      - if: "severity > 3"
        then: escalate
      - if: "severity <= 3"
        then: close
      - fan_out
  escalate:
    type: human
  close:
    type: manual
  fan_out:
    type: task
"#;
        let doc = parse_playbook_yaml(yaml).unwrap();
        let gw = doc.activities.get("check").unwrap();
        match gw.goto.as_ref().unwrap() {
            Goto::Branches(branches) => {
                assert_eq!(branches.len(), 3);
                assert_eq!(
                    branches[0],
                    Branch::Conditional {
                        condition: Some("severity > 3".into()),
                        target: Some("escalate".into()),
                    }
                );
                assert_eq!(branches[2], Branch::Target("fan_out".into()));
            }
            other => panic!("Expected branches, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_subprocess_and_unknown_type() {
        let yaml = r#"
process: p
activities:
  analysis:
    type: sub
    activities:
      collect:
        type: serv
      review:
        type: lane
  untyped: {}
"#;
        let doc = parse_playbook_yaml(yaml).unwrap();
        let sub = doc.activities.get("analysis").unwrap();
        assert_eq!(sub.category(), Some(ActivityCategory::Subprocess));
        let inner = sub.activities.as_ref().unwrap();
        assert_eq!(
            inner.get("review").unwrap().activity_type,
            Some(ActivityType::Other("lane".into()))
        );
        assert_eq!(doc.activities.get("untyped").unwrap().category(), None);
    }

    #[test]
    fn test_missing_process_uses_default() {
        let doc = parse_playbook_yaml("activities: {}\n").unwrap();
        assert_eq!(doc.process_id(), DEFAULT_PROCESS_ID);
        assert!(doc.activities.is_empty());
    }

    #[test]
    fn test_duplicate_activity_id_fails() {
        let yaml = r#"
activities:
  a:
    type: human
  a:
    type: send
"#;
        assert!(parse_playbook_yaml(yaml).is_err());
    }

    #[test]
    fn test_module_requires_activities() {
        assert!(parse_module_yaml("description: nothing here\n").is_err());
        let module = parse_module_yaml("activities:\n  step:\n    type: human\n").unwrap();
        assert_eq!(module.activities.len(), 1);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let yaml = r#"
process: p
owner: soc
activities:
  step:
    type: human
    sla: 4h
"#;
        let doc = parse_playbook_yaml(yaml).unwrap();
        let out = playbook_to_yaml(&doc).unwrap();
        assert!(out.contains("owner: soc"));
        assert!(out.contains("sla: 4h"));
        let again = parse_playbook_yaml(&out).unwrap();
        assert_eq!(doc, again);
    }
}
