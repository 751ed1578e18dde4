use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type TaskId = String;

pub const DEFAULT_COLOR: &str = "#3498db";

/// Task urgency, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn all() -> &'static [TaskPriority] {
        &[
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Urgent,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Urgent => "Urgent",
        }
    }

    /// Lowercase identifier, as stored and exported.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            TaskPriority::Low => egui_phosphor::regular::NOTE_PENCIL,
            TaskPriority::Medium => egui_phosphor::regular::PUSH_PIN,
            TaskPriority::High => egui_phosphor::regular::WARNING,
            TaskPriority::Urgent => egui_phosphor::regular::FIRE,
        }
    }

    /// Lenient parse: anything unrecognised falls back to `Medium`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => TaskPriority::Low,
            "high" => TaskPriority::High,
            "urgent" => TaskPriority::Urgent,
            _ => TaskPriority::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(TaskPriority::parse).unwrap_or_default())
    }
}

/// A single scheduled task on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(with = "datetime_serde")]
    pub start: NaiveDateTime,
    #[serde(with = "datetime_serde")]
    pub end: NaiveDateTime,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Display color as a `#rrggbb` hex string.
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent_id: Option<TaskId>,
}

impl Task {
    /// Build a task from a draft, assigning a fresh id.
    pub fn from_draft(draft: TaskDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            start: draft.start,
            end: draft.end,
            description: draft.description,
            priority: draft.priority,
            color: draft.color,
            parent_id: draft.parent_id,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_hours(&self) -> f64 {
        hours_between(self.start, self.end)
    }

    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Shallow merge: every field present in the patch overwrites ours.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(parent_id) = patch.parent_id {
            self.parent_id = parent_id;
        }
    }

    /// Case-insensitive substring match on name or description.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// Every task field except the id; the input to `TaskRepository::add`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub color: String,
    pub parent_id: Option<TaskId>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            description: None,
            priority: TaskPriority::default(),
            color: default_color(),
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<TaskId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub color: Option<String>,
    pub parent_id: Option<Option<TaskId>>,
}

impl TaskPatch {
    pub fn interval(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn start(start: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    pub fn end(end: NaiveDateTime) -> Self {
        Self {
            end: Some(end),
            ..Default::default()
        }
    }
}

impl From<TaskDraft> for TaskPatch {
    /// A full-form edit overwrites every field.
    fn from(draft: TaskDraft) -> Self {
        Self {
            name: Some(draft.name),
            start: Some(draft.start),
            end: Some(draft.end),
            description: Some(draft.description),
            priority: Some(draft.priority),
            color: Some(draft.color),
            parent_id: Some(draft.parent_id),
        }
    }
}

/// Signed fractional hours from `from` to `to`.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// Duration of a (possibly fractional) number of hours, rounded to whole
/// seconds so it survives `datetime_serde` unchanged.
pub fn duration_from_hours(hours: f64) -> Duration {
    Duration::seconds((hours * 3_600.0).round() as i64)
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Serde helper for `NaiveDateTime`.
///
/// Writes second precision; reads minute precision too, which is what
/// datetime-local form inputs produce.
pub mod datetime_serde {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
    const READ_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(WRITE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid datetime '{}'", s)))
    }

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        READ_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }
}
