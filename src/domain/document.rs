use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Branch written when the caller does not name one.
pub const DEFAULT_BRANCH: &str = "main";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inward,
    Outward,
}

text_enum!(Direction, "direction", {
    Inward => "inward",
    Outward => "outward",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

text_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Received,
    UnderProcess,
    Forwarded,
    Closed,
    Escalated,
    Draft,
    Sent,
}

text_enum!(Status, "status", {
    Received => "received",
    UnderProcess => "under_process",
    Forwarded => "forwarded",
    Closed => "closed",
    Escalated => "escalated",
    Draft => "draft",
    Sent => "sent",
});

impl Status {
    /// Still waiting on someone in the organization.
    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Received | Status::UnderProcess)
    }

    /// No further action expected.
    pub fn is_finished(&self) -> bool {
        matches!(self, Status::Closed | Status::Sent)
    }
}

/// Department name and code embedded in a document row by the store's join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRef {
    pub name: String,
    pub code: String,
}

/// A DAK document row as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DakDocument {
    pub id: String,
    pub dak_number: String,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub subject: String,
    pub sender: String,
    #[serde(default)]
    pub sender_address: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(with = "timestamp")]
    pub date_received: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub date_sent: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub departments: Option<DepartmentRef>,
}

impl DakDocument {
    pub fn department_name(&self) -> Option<&str> {
        self.departments.as_ref().map(|d| d.name.as_str())
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill all required fields: {}", .missing.join(", "))]
    MissingFields { missing: Vec<&'static str> },
}

/// Fields a caller supplies when registering a document.
///
/// Blank strings are treated the same as absent values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub direction: Option<Direction>,
    pub reference_number: Option<String>,
    pub subject: String,
    pub sender: String,
    pub sender_address: Option<String>,
    pub receiver: Option<String>,
    pub receiver_address: Option<String>,
    pub department_id: Option<String>,
    pub branch: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub date_received: Option<DateTime<Utc>>,
    pub date_sent: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub remarks: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
}

impl NewDocument {
    pub fn inward(subject: &str, sender: &str, department_id: &str) -> Self {
        Self {
            direction: Some(Direction::Inward),
            subject: subject.to_string(),
            sender: sender.to_string(),
            department_id: Some(department_id.to_string()),
            ..Self::default()
        }
    }

    pub fn outward(subject: &str, sender: &str, department_id: &str) -> Self {
        Self {
            direction: Some(Direction::Outward),
            ..Self::inward(subject, sender, department_id)
        }
    }

    /// Check required fields and fill defaults, producing the row to insert.
    pub fn normalize(self, now: DateTime<Utc>) -> Result<DocumentInsert, ValidationError> {
        let department_id = non_blank(self.department_id);
        let subject = non_blank(Some(self.subject));
        let sender = non_blank(Some(self.sender));

        let mut missing = Vec::new();
        if self.direction.is_none() {
            missing.push("type");
        }
        if department_id.is_none() {
            missing.push("department");
        }
        if subject.is_none() {
            missing.push("subject");
        }
        if sender.is_none() {
            missing.push("sender");
        }

        match (self.direction, department_id, subject, sender) {
            (Some(direction), Some(department_id), Some(subject), Some(sender)) => {
                Ok(DocumentInsert {
                    reference_number: non_blank(self.reference_number),
                    direction,
                    subject,
                    sender,
                    sender_address: non_blank(self.sender_address),
                    receiver: non_blank(self.receiver),
                    receiver_address: non_blank(self.receiver_address),
                    department_id: Some(department_id),
                    branch: non_blank(self.branch).unwrap_or_else(default_branch),
                    priority: self.priority.unwrap_or_default(),
                    status: self.status.unwrap_or_default(),
                    date_received: self.date_received.unwrap_or(now),
                    date_sent: self.date_sent,
                    due_date: self.due_date,
                    content: non_blank(self.content),
                    remarks: non_blank(self.remarks),
                    created_by: non_blank(self.created_by),
                    assigned_to: non_blank(self.assigned_to),
                })
            }
            _ => Err(ValidationError::MissingFields { missing }),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The normalized insert payload. Absent optional fields serialize as
/// explicit `null` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInsert {
    pub reference_number: Option<String>,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub subject: String,
    pub sender: String,
    pub sender_address: Option<String>,
    pub receiver: Option<String>,
    pub receiver_address: Option<String>,
    pub department_id: Option<String>,
    pub branch: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(with = "timestamp")]
    pub date_received: DateTime<Utc>,
    #[serde(with = "timestamp::option")]
    pub date_sent: Option<DateTime<Utc>>,
    #[serde(with = "timestamp::option")]
    pub due_date: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub remarks: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
}

/// A partial update. Unset fields are left unchanged by the store;
/// `Some(None)` on a nullable column clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<Option<String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none", with = "patch_timestamp")]
    pub date_sent: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none", with = "patch_timestamp")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<String>>,
}

impl DocumentPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Column/value pairs in wire form, keyed by column name.
    pub fn to_columns(&self) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

mod patch_timestamp {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    // Only reached when the outer option is set; `skip_serializing_if` drops the rest.
    pub fn serialize<S: Serializer>(
        ts: &Option<Option<DateTime<Utc>>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        super::timestamp::option::serialize(&ts.unwrap_or(None), serializer)
    }
}
