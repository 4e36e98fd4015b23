//! System alerts and maintenance notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::timestamp_opt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    #[default]
    Info,
    Warning,
    Critical,
    #[serde(other)]
    Unknown,
}

/// Row of the `alerts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub severity: AlertSeverity,
    pub alert_type: String,
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub is_resolved: Option<bool>,
    #[serde(default)]
    pub related_entity_id: Option<String>,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Insert payload for `alerts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub alert_type: String,
    pub is_read: bool,
    pub is_resolved: bool,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}

impl NewAlert {
    pub fn new(alert_type: &str, severity: AlertSeverity, title: String, message: String) -> Self {
        Self {
            title,
            message,
            severity,
            alert_type: alert_type.to_string(),
            is_read: false,
            is_resolved: false,
            related_entity_id: None,
            related_entity_type: None,
        }
    }

    pub fn related_to(mut self, entity_type: &str, entity_id: &str) -> Self {
        self.related_entity_type = Some(entity_type.to_string());
        self.related_entity_id = Some(entity_id.to_string());
        self
    }
}

/// Alerts page split into active and resolved lists.
#[derive(Debug, Clone, Serialize)]
pub struct AlertBoard {
    pub active: Vec<Alert>,
    pub resolved: Vec<Alert>,
    pub unread: usize,
}
