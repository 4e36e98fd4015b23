//! Maintenance calendar.
//!
//! Combines active preventive schedules (on their next due date) with open
//! and in-progress work orders (on the date they were started). Work orders
//! that have not started yet do not appear.

use chrono::NaiveDate;
use serde::Serialize;

use super::ServiceResult;
use crate::store::{self, Query, Table, TableStore};
use crate::types::{MaintenanceRecord, PreventiveSchedule, WorkOrderStatus};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Preventive,
    Maintenance,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub date: NaiveDate,
    pub title: String,
    /// Id of the schedule or work order
    pub entity_id: String,
}

/// The calendar page for one selected date.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    pub date: NaiveDate,
    pub dates_with_events: Vec<NaiveDate>,
    pub events: Vec<CalendarEvent>,
}

/// Events from schedules and work orders.
pub fn build_events(
    schedules: &[PreventiveSchedule],
    records: &[MaintenanceRecord],
) -> Vec<CalendarEvent> {
    let preventive = schedules.iter().map(|s| CalendarEvent {
        kind: EventKind::Preventive,
        date: s.next_due_date,
        title: s.schedule_name.clone(),
        entity_id: s.id.clone(),
    });
    let maintenance = records.iter().filter_map(|r| {
        Some(CalendarEvent {
            kind: EventKind::Maintenance,
            date: r.started_at?.date_naive(),
            title: format!("{} - {}", r.work_order_number, r.maintenance_type.as_str()),
            entity_id: r.id.clone(),
        })
    });
    preventive.chain(maintenance).collect()
}

/// Distinct event dates, ascending.
pub fn dates_with_events(events: &[CalendarEvent]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

pub fn events_for_date(events: &[CalendarEvent], date: NaiveDate) -> Vec<CalendarEvent> {
    events.iter().filter(|e| e.date == date).cloned().collect()
}

pub async fn load_events(store: &dyn TableStore) -> ServiceResult<Vec<CalendarEvent>> {
    let schedules: Vec<PreventiveSchedule> = store::fetch(
        store,
        Table::PreventiveSchedules,
        &Query::new().eq("is_active", true),
    )
    .await?;
    let records: Vec<MaintenanceRecord> = store::fetch(
        store,
        Table::MaintenanceRecords,
        &Query::new().in_list(
            "status",
            [WorkOrderStatus::Open.as_str(), WorkOrderStatus::InProgress.as_str()],
        ),
    )
    .await?;
    Ok(build_events(&schedules, &records))
}

pub async fn calendar(store: &dyn TableStore, date: NaiveDate) -> ServiceResult<CalendarView> {
    let events = load_events(store).await?;
    Ok(CalendarView {
        date,
        dates_with_events: dates_with_events(&events),
        events: events_for_date(&events, date),
    })
}
