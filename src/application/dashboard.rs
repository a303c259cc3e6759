//! Dashboard figures derived from an already fetched document list.
//!
//! Nothing here touches the store. Every function takes `now` explicitly; the
//! time zone of `now` decides what "today" means.

use crate::domain::{DakDocument, Direction, Priority};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

pub const RECENT_ACTIVITY_LIMIT: usize = 4;
pub const DEPARTMENT_ROLLUP_LIMIT: usize = 5;
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub inward: usize,
    pub outward: usize,
    pub pending: usize,
    pub overdue: usize,
    pub closed_today: usize,
}

impl DashboardStats {
    pub fn compute<Tz: TimeZone>(docs: &[DakDocument], now: &DateTime<Tz>) -> Self {
        Self {
            total: docs.len(),
            inward: direction_count(docs, Direction::Inward),
            outward: direction_count(docs, Direction::Outward),
            pending: pending_count(docs),
            overdue: overdue_count(docs, now),
            closed_today: closed_today_count(docs, now),
        }
    }
}

pub fn direction_count(docs: &[DakDocument], direction: Direction) -> usize {
    docs.iter().filter(|d| d.direction == direction).count()
}

pub fn pending_count(docs: &[DakDocument]) -> usize {
    docs.iter().filter(|d| d.status.is_pending()).count()
}

/// Due strictly before `now` and not yet closed or sent.
pub fn is_overdue<Tz: TimeZone>(doc: &DakDocument, now: &DateTime<Tz>) -> bool {
    let now = now.with_timezone(&Utc);
    doc.due_date.map_or(false, |due| due < now) && !doc.status.is_finished()
}

pub fn overdue_count<Tz: TimeZone>(docs: &[DakDocument], now: &DateTime<Tz>) -> usize {
    docs.iter().filter(|d| is_overdue(d, now)).count()
}

/// Closed or sent, with the last update falling on `now`'s calendar day.
pub fn closed_today_count<Tz: TimeZone>(docs: &[DakDocument], now: &DateTime<Tz>) -> usize {
    let today = now.date_naive();
    let tz = now.timezone();

    docs.iter()
        .filter(|d| d.status.is_finished())
        .filter(|d| d.updated_at.with_timezone(&tz).date_naive() == today)
        .count()
}

/// Relative label from a whole number of elapsed minutes.
pub fn time_ago_label(minutes: i64) -> String {
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else if minutes < 1440 {
        format!("{} hours ago", minutes / 60)
    } else {
        format!("{} days ago", minutes / 1440)
    }
}

pub fn time_ago<Tz: TimeZone>(then: &DateTime<Utc>, now: &DateTime<Tz>) -> String {
    let elapsed = now.with_timezone(&Utc) - *then;
    time_ago_label(elapsed.num_minutes())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    pub id: String,
    pub action: String,
    pub dak_number: String,
    pub department: String,
    pub priority: Priority,
    pub time: String,
}

/// The first few documents, in list order.
pub fn recent_activity<Tz: TimeZone>(docs: &[DakDocument], now: &DateTime<Tz>) -> Vec<ActivityItem> {
    docs.iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|doc| ActivityItem {
            id: doc.id.clone(),
            action: match doc.direction {
                Direction::Inward => "New Inward DAK Registered",
                Direction::Outward => "New Outward DAK Created",
            }
            .to_string(),
            dak_number: doc.dak_number.clone(),
            department: doc.department_name().unwrap_or(UNKNOWN_DEPARTMENT).to_string(),
            priority: doc.priority,
            time: time_ago(&doc.created_at, now),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentRollup {
    pub name: String,
    pub inward: usize,
    pub outward: usize,
    pub pending: usize,
}

/// Per-department counts, grouped by display name in order of first
/// appearance and cut to the first few groups.
pub fn department_rollup(docs: &[DakDocument]) -> Vec<DepartmentRollup> {
    let mut groups: Vec<DepartmentRollup> = Vec::new();

    for doc in docs {
        let name = doc.department_name().unwrap_or(UNKNOWN_DEPARTMENT);
        let idx = match groups.iter().position(|g| g.name == name) {
            Some(idx) => idx,
            None => {
                groups.push(DepartmentRollup {
                    name: name.to_string(),
                    inward: 0,
                    outward: 0,
                    pending: 0,
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        match doc.direction {
            Direction::Inward => group.inward += 1,
            Direction::Outward => group.outward += 1,
        }
        if doc.status.is_pending() {
            group.pending += 1;
        }
    }

    groups.truncate(DEPARTMENT_ROLLUP_LIMIT);
    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_activity: Vec<ActivityItem>,
    pub departments: Vec<DepartmentRollup>,
}

impl Dashboard {
    pub fn build<Tz: TimeZone>(docs: &[DakDocument], now: &DateTime<Tz>) -> Self {
        Self {
            stats: DashboardStats::compute(docs, now),
            recent_activity: recent_activity(docs, now),
            departments: department_rollup(docs),
        }
    }
}
