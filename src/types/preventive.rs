//! Recurring preventive maintenance schedules.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::time::{date, date_opt, timestamp_opt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyType {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    #[serde(other)]
    Unknown,
}

impl FrequencyType {
    /// The date `count` intervals after `from`; `None` on calendar overflow
    /// or an unrecognised frequency.
    pub fn advance(&self, from: NaiveDate, count: u32) -> Option<NaiveDate> {
        match self {
            Self::Daily => from.checked_add_days(Days::new(u64::from(count))),
            Self::Weekly => from.checked_add_days(Days::new(7 * u64::from(count))),
            Self::Monthly => from.checked_add_months(Months::new(count)),
            Self::Quarterly => from.checked_add_months(Months::new(count.checked_mul(3)?)),
            Self::Yearly => from.checked_add_months(Months::new(count.checked_mul(12)?)),
            Self::Unknown => None,
        }
    }
}

/// Row of the `preventive_schedules` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventiveSchedule {
    pub id: String,
    pub machine_id: String,
    pub schedule_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub frequency_type: FrequencyType,
    #[serde(default = "default_frequency_value")]
    pub frequency_value: i64,
    #[serde(with = "date")]
    pub next_due_date: NaiveDate,
    #[serde(with = "date_opt", default)]
    pub last_performed_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub estimated_duration_hours: Option<f64>,
    #[serde(default)]
    pub checklist_items: Option<Vec<String>>,
    #[serde(with = "timestamp_opt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_opt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_frequency_value() -> i64 {
    1
}

/// Checklist as typed into the textarea (one item per line) or as a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Checklist {
    Items(Vec<String>),
    Text(String),
}

impl Checklist {
    /// Trimmed, non-blank items; `None` when nothing is left.
    pub fn into_items(self) -> Option<Vec<String>> {
        let items: Vec<String> = match self {
            Self::Items(items) => items,
            Self::Text(text) => text.lines().map(str::to_string).collect(),
        }
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}

/// The "Create Preventive Schedule" form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleForm {
    pub schedule_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub frequency_type: FrequencyType,
    #[serde(default = "default_frequency_value")]
    pub frequency_value: i64,
    #[serde(with = "date")]
    pub next_due_date: NaiveDate,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub estimated_duration_hours: Option<f64>,
    #[serde(default)]
    pub checklist_items: Option<Checklist>,
}

/// Insert payload for `preventive_schedules`.
#[derive(Debug, Clone, Serialize)]
pub struct NewSchedule {
    pub machine_id: String,
    pub schedule_name: String,
    pub description: Option<String>,
    pub frequency_type: FrequencyType,
    pub frequency_value: i64,
    #[serde(with = "date")]
    pub next_due_date: NaiveDate,
    pub assigned_to: Option<String>,
    pub estimated_duration_hours: Option<f64>,
    pub checklist_items: Option<Vec<String>>,
    pub is_active: bool,
}

/// Partial update of a schedule. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_type: Option<FrequencyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_value: Option<i64>,
    #[serde(with = "date_opt", default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_items: Option<Vec<String>>,
}

/// Where a schedule stands relative to today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Inactive,
    Overdue,
    DueSoon,
    Scheduled,
}

/// Schedule row annotated for the list view.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: PreventiveSchedule,
    pub due_state: DueState,
    pub days_until_due: i64,
}

/// Body of the "mark performed" action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformedRequest {
    #[serde(with = "date_opt", default)]
    pub performed_on: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_advance_by_frequency() {
        let start = d(2025, 1, 31);
        assert_eq!(FrequencyType::Daily.advance(start, 2), Some(d(2025, 2, 2)));
        assert_eq!(FrequencyType::Weekly.advance(start, 1), Some(d(2025, 2, 7)));
        // Month-end clamps to the last day of the shorter month.
        assert_eq!(FrequencyType::Monthly.advance(start, 1), Some(d(2025, 2, 28)));
        assert_eq!(FrequencyType::Quarterly.advance(start, 1), Some(d(2025, 4, 30)));
        assert_eq!(FrequencyType::Yearly.advance(start, 2), Some(d(2027, 1, 31)));
    }

    #[test]
    fn test_checklist_from_text_drops_blank_lines() {
        let checklist = Checklist::Text("Check oil levels\n\n  Clean filters \nInspect belts\n".into());
        assert_eq!(
            checklist.into_items(),
            Some(vec![
                "Check oil levels".to_string(),
                "Clean filters".to_string(),
                "Inspect belts".to_string()
            ])
        );
        assert_eq!(Checklist::Text("  \n ".into()).into_items(), None);
        assert_eq!(Checklist::Items(vec![" a ".into(), String::new()]).into_items(), Some(vec!["a".to_string()]));
    }
}
