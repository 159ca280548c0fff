use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ── Activity type vocabulary ──

/// The `type` tag of an activity as written in the playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Human,
    Manual,
    Send,
    Receive,
    Script,
    Serv,
    Call,
    Busin,
    Task,
    Xgw,
    Pgw,
    Igw,
    InsThrow,
    InsCatch,
    InmThrow,
    InmCatch,
    InTimer,
    InEscal,
    Sub,
    /// Anything outside the vocabulary, kept verbatim.
    Other(String),
}

/// Coarse classification used by module resolution and renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityCategory {
    Task,
    Gateway,
    Event,
    Subprocess,
}

impl ActivityType {
    pub fn code(&self) -> &str {
        match self {
            ActivityType::Human => "human",
            ActivityType::Manual => "manual",
            ActivityType::Send => "send",
            ActivityType::Receive => "receive",
            ActivityType::Script => "script",
            ActivityType::Serv => "serv",
            ActivityType::Call => "call",
            ActivityType::Busin => "busin",
            ActivityType::Task => "task",
            ActivityType::Xgw => "xgw",
            ActivityType::Pgw => "pgw",
            ActivityType::Igw => "igw",
            ActivityType::InsThrow => "insthrow",
            ActivityType::InsCatch => "inscatch",
            ActivityType::InmThrow => "inmthrow",
            ActivityType::InmCatch => "inmcatch",
            ActivityType::InTimer => "intimer",
            ActivityType::InEscal => "inescal",
            ActivityType::Sub => "sub",
            ActivityType::Other(code) => code,
        }
    }

    /// `None` for codes outside the vocabulary.
    pub fn category(&self) -> Option<ActivityCategory> {
        match self {
            ActivityType::Human
            | ActivityType::Manual
            | ActivityType::Send
            | ActivityType::Receive
            | ActivityType::Script
            | ActivityType::Serv
            | ActivityType::Call
            | ActivityType::Busin
            | ActivityType::Task => Some(ActivityCategory::Task),
            ActivityType::Xgw | ActivityType::Pgw | ActivityType::Igw => {
                Some(ActivityCategory::Gateway)
            }
            ActivityType::InsThrow
            | ActivityType::InsCatch
            | ActivityType::InmThrow
            | ActivityType::InmCatch
            | ActivityType::InTimer
            | ActivityType::InEscal => Some(ActivityCategory::Event),
            ActivityType::Sub => Some(ActivityCategory::Subprocess),
            ActivityType::Other(_) => None,
        }
    }
}

impl From<String> for ActivityType {
    fn from(code: String) -> Self {
        match code.as_str() {
            "human" => ActivityType::Human,
            "manual" => ActivityType::Manual,
            "send" => ActivityType::Send,
            "receive" => ActivityType::Receive,
            "script" => ActivityType::Script,
            "serv" => ActivityType::Serv,
            "call" => ActivityType::Call,
            "busin" => ActivityType::Busin,
            "task" => ActivityType::Task,
            "xgw" => ActivityType::Xgw,
            "pgw" => ActivityType::Pgw,
            "igw" => ActivityType::Igw,
            "insthrow" => ActivityType::InsThrow,
            "inscatch" => ActivityType::InsCatch,
            "inmthrow" => ActivityType::InmThrow,
            "inmcatch" => ActivityType::InmCatch,
            "intimer" => ActivityType::InTimer,
            "inescal" => ActivityType::InEscal,
            "sub" => ActivityType::Sub,
            _ => ActivityType::Other(code),
        }
    }
}

impl From<ActivityType> for String {
    fn from(t: ActivityType) -> Self {
        match t {
            ActivityType::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

// ── Goto ──

/// Outgoing control link(s) of an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Goto {
    /// `goto: some_sibling`
    Target(String),
    /// `goto: [{if: ..., then: ...}, ...]`
    Branches(Vec<Branch>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Branch {
    /// Bare target inside a list (parallel gateway style).
    Target(String),
    Conditional {
        #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        #[serde(rename = "then", default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
}

impl Branch {
    pub fn target(&self) -> Option<&str> {
        match self {
            Branch::Target(t) => Some(t),
            Branch::Conditional { target, .. } => target.as_deref().filter(|t| !t.is_empty()),
        }
    }

    fn target_mut(&mut self) -> Option<&mut String> {
        match self {
            Branch::Target(t) => Some(t),
            Branch::Conditional { target, .. } => target.as_mut().filter(|t| !t.is_empty()),
        }
    }
}

impl Goto {
    /// Every target named by this goto, in order.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Goto::Target(t) => vec![t.as_str()],
            Goto::Branches(branches) => branches.iter().filter_map(Branch::target).collect(),
        }
    }

    /// Rewrite every target through `rename`, stopping at the first failure.
    pub fn try_rename<E>(&mut self, mut rename: impl FnMut(&str) -> Result<String, E>) -> Result<(), E> {
        match self {
            Goto::Target(t) => *t = rename(t)?,
            Goto::Branches(branches) => {
                for target in branches.iter_mut().filter_map(Branch::target_mut) {
                    *target = rename(target)?;
                }
            }
        }
        Ok(())
    }
}

// ── Activity ──

/// One node of the playbook tree. The id is the mapping key in YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<Goto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Activities>,
    /// Keys the converter does not interpret, preserved for the combined YAML.
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

impl Activity {
    pub fn new(id: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            id: id.into(),
            activity_type: Some(activity_type),
            ..Self::default()
        }
    }

    pub fn with_branches(mut self, branches: Vec<Branch>) -> Self {
        self.goto = Some(Goto::Branches(branches));
        self
    }

    pub fn category(&self) -> Option<ActivityCategory> {
        self.activity_type.as_ref().and_then(ActivityType::category)
    }

    /// Display label, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

// ── Ordered activity mapping ──

/// Activities of one container, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activities(Vec<Activity>);

impl Activities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, activity: Activity) {
        self.0.push(activity);
    }

    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.0.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|a| a.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Activity> for Activities {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Activities {
    type Item = Activity;
    type IntoIter = std::vec::IntoIter<Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Activities {
    type Item = &'a Activity;
    type IntoIter = std::slice::Iter<'a, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Activities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for activity in &self.0 {
            map.serialize_entry(&activity.id, activity)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Activities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ActivitiesVisitor;

        impl<'de> Visitor<'de> for ActivitiesVisitor {
            type Value = Activities;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of activity ids to activities")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Activities, A::Error> {
                let mut activities = Activities::new();
                while let Some(id) = access.next_key::<String>()? {
                    if activities.contains(&id) {
                        return Err(de::Error::custom(format!("duplicate activity id '{}'", id)));
                    }
                    let mut activity: Activity = access.next_value()?;
                    activity.id = id;
                    activities.push(activity);
                }
                Ok(activities)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Activities, E> {
                Ok(Activities::new())
            }
        }

        deserializer.deserialize_map(ActivitiesVisitor)
    }
}

// ── Documents ──

/// A playbook file: the process id and its top-level activities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default)]
    pub activities: Activities,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

pub const DEFAULT_PROCESS_ID: &str = "DefaultPlaybookProcess";

impl PlaybookDocument {
    pub fn process_id(&self) -> &str {
        self.process.as_deref().unwrap_or(DEFAULT_PROCESS_ID)
    }
}

/// A module file. Unlike a playbook, `activities` is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDocument {
    pub activities: Activities,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_classify() {
        assert_eq!(
            ActivityType::from("serv".to_string()).category(),
            Some(ActivityCategory::Task)
        );
        assert_eq!(
            ActivityType::from("igw".to_string()).category(),
            Some(ActivityCategory::Gateway)
        );
        assert_eq!(
            ActivityType::from("inescal".to_string()).category(),
            Some(ActivityCategory::Event)
        );
        assert_eq!(
            ActivityType::from("sub".to_string()).category(),
            Some(ActivityCategory::Subprocess)
        );
        let unknown = ActivityType::from("lane".to_string());
        assert_eq!(unknown, ActivityType::Other("lane".into()));
        assert_eq!(unknown.category(), None);
        assert_eq!(String::from(unknown), "lane");
    }

    #[test]
    fn goto_rename_touches_every_target() {
        let mut goto = Goto::Branches(vec![
            Branch::Conditional {
                condition: Some("ok".into()),
                target: Some("a".into()),
            },
            Branch::Target("b".into()),
            Branch::Conditional {
                condition: Some("orphan".into()),
                target: None,
            },
        ]);
        goto.try_rename(|t| Ok::<_, ()>(format!("{}_9", t))).unwrap();
        assert_eq!(goto.targets(), vec!["a_9", "b_9"]);
    }

    #[test]
    fn goto_rename_propagates_failure() {
        let mut goto = Goto::Target("missing".into());
        let result = goto.try_rename(|t| Err::<String, _>(t.to_string()));
        assert_eq!(result, Err("missing".to_string()));
    }
}
