use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub head_name: Option<String>,
    #[serde(default)]
    pub head_email: Option<String>,
    pub branch: String,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Department {
    pub fn new(name: &str, code: &str, branch: &str) -> Self {
        let now = Utc::now();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            head_name: None,
            head_email: None,
            branch: branch.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
