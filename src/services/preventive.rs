//! Preventive maintenance schedules.
//!
//! A schedule is a recurring task with a frequency (`frequency_value` times
//! daily/weekly/monthly/quarterly/yearly) and the date it is next due.
//! Recording a schedule as performed rolls `next_due_date` forward by
//! `frequency_value` intervals from the performed date.

use chrono::NaiveDate;
use serde_json::json;
use tracing::info;

use super::{machine, Problems, ServiceError, ServiceResult};
use crate::store::{self, Filter, Query, Table, TableStore};
use crate::types::{
    non_blank, Checklist, DueState, FrequencyType, NewSchedule, PreventiveSchedule, ScheduleForm,
    ScheduleUpdate, ScheduleView,
};

/// Due state of a schedule on `today` and the signed days until it is due.
pub fn due_state(schedule: &PreventiveSchedule, today: NaiveDate, due_soon_days: i64) -> (DueState, i64) {
    let days = (schedule.next_due_date - today).num_days();
    let state = if !schedule.is_active.unwrap_or(true) {
        DueState::Inactive
    } else if days < 0 {
        DueState::Overdue
    } else if days <= due_soon_days {
        DueState::DueSoon
    } else {
        DueState::Scheduled
    };
    (state, days)
}

/// All schedules ordered by next due date, annotated for `today`.
pub async fn list_schedules(
    store: &dyn TableStore,
    today: NaiveDate,
    due_soon_days: i64,
) -> ServiceResult<Vec<ScheduleView>> {
    let schedules: Vec<PreventiveSchedule> = store::fetch(
        store,
        Table::PreventiveSchedules,
        &Query::new().order_by("next_due_date", true),
    )
    .await?;
    Ok(schedules
        .into_iter()
        .map(|schedule| {
            let (due_state, days_until_due) = due_state(&schedule, today, due_soon_days);
            ScheduleView {
                schedule,
                due_state,
                days_until_due,
            }
        })
        .collect())
}

pub async fn create_schedule(
    store: &dyn TableStore,
    form: ScheduleForm,
) -> ServiceResult<PreventiveSchedule> {
    let mut problems = Problems::new();
    problems.require("schedule_name", &form.schedule_name);
    check_frequency(&mut problems, Some(form.frequency_type));
    problems.check(form.frequency_value >= 1, "frequency_value must be at least 1");
    check_duration(&mut problems, form.estimated_duration_hours);
    problems.finish()?;

    let machine_id = machine::machine_id(store).await?;
    let row = NewSchedule {
        machine_id,
        schedule_name: form.schedule_name.trim().to_string(),
        description: non_blank(form.description.as_deref()),
        frequency_type: form.frequency_type,
        frequency_value: form.frequency_value,
        next_due_date: form.next_due_date,
        assigned_to: non_blank(form.assigned_to.as_deref()),
        estimated_duration_hours: form.estimated_duration_hours,
        checklist_items: form.checklist_items.and_then(|c| c.into_items()),
        is_active: true,
    };
    let schedule: PreventiveSchedule =
        store::insert_one(store, Table::PreventiveSchedules, &row).await?;
    info!(schedule = %schedule.schedule_name, due = %schedule.next_due_date, "Preventive schedule created");
    Ok(schedule)
}

fn check_frequency(problems: &mut Problems, frequency: Option<FrequencyType>) {
    problems.check(
        frequency != Some(FrequencyType::Unknown),
        "frequency_type must be daily, weekly, monthly, quarterly or yearly",
    );
}

fn check_duration(problems: &mut Problems, hours: Option<f64>) {
    problems.check(
        hours.map_or(true, |h| h.is_finite() && h >= 0.0),
        "estimated_duration_hours must be a non-negative number",
    );
}

/// Apply a partial update.
pub async fn update_schedule(
    store: &dyn TableStore,
    id: &str,
    mut update: ScheduleUpdate,
) -> ServiceResult<PreventiveSchedule> {
    let mut problems = Problems::new();
    if let Some(name) = &update.schedule_name {
        problems.require("schedule_name", name);
    }
    check_frequency(&mut problems, update.frequency_type);
    if let Some(value) = update.frequency_value {
        problems.check(value >= 1, "frequency_value must be at least 1");
    }
    check_duration(&mut problems, update.estimated_duration_hours);
    problems.finish()?;

    update.schedule_name = update.schedule_name.map(|n| n.trim().to_string());
    let clears_checklist = update.checklist_items.is_some();
    update.checklist_items = update
        .checklist_items
        .and_then(|items| Checklist::Items(items).into_items());

    let mut patch = serde_json::to_value(&update).map_err(crate::store::StoreError::from)?;
    // An update that leaves no checklist items stores null, as create does.
    if clears_checklist && update.checklist_items.is_none() {
        patch["checklist_items"] = serde_json::Value::Null;
    }
    if patch.as_object().is_some_and(serde_json::Map::is_empty) {
        return get_schedule(store, id).await;
    }
    patch_schedule(store, id, &patch).await
}

pub async fn get_schedule(store: &dyn TableStore, id: &str) -> ServiceResult<PreventiveSchedule> {
    store::fetch_optional(store, Table::PreventiveSchedules, &Query::new().eq("id", id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("schedule {id}")))
}

async fn patch_schedule(
    store: &dyn TableStore,
    id: &str,
    patch: &serde_json::Value,
) -> ServiceResult<PreventiveSchedule> {
    let mut updated: Vec<PreventiveSchedule> = store::update_where(
        store,
        Table::PreventiveSchedules,
        &[Filter::eq("id", id)],
        patch,
    )
    .await?;
    updated
        .pop()
        .ok_or_else(|| ServiceError::NotFound(format!("schedule {id}")))
}

pub async fn delete_schedule(store: &dyn TableStore, id: &str) -> ServiceResult<()> {
    let removed = store
        .delete(Table::PreventiveSchedules, &[Filter::eq("id", id)])
        .await?;
    if removed == 0 {
        return Err(ServiceError::NotFound(format!("schedule {id}")));
    }
    info!(schedule = %id, "Preventive schedule deleted");
    Ok(())
}

/// Mark a schedule performed on `performed_on` and roll it forward.
pub async fn record_performed(
    store: &dyn TableStore,
    id: &str,
    performed_on: NaiveDate,
) -> ServiceResult<PreventiveSchedule> {
    let schedule = get_schedule(store, id).await?;
    let count = u32::try_from(schedule.frequency_value.max(1))
        .map_err(|_| ServiceError::Validation("frequency_value is too large".into()))?;
    if schedule.frequency_type == FrequencyType::Unknown {
        return Err(ServiceError::Validation(
            "schedule has an unrecognised frequency_type; set one before recording it performed".into(),
        ));
    }
    let next_due = schedule
        .frequency_type
        .advance(performed_on, count)
        .ok_or_else(|| ServiceError::Validation("next due date is out of range".into()))?;

    let patch = json!({
        "last_performed_date": performed_on.format("%Y-%m-%d").to_string(),
        "next_due_date": next_due.format("%Y-%m-%d").to_string(),
    });
    let updated = patch_schedule(store, id, &patch).await?;
    info!(schedule = %updated.schedule_name, performed = %performed_on, next_due = %next_due, "Preventive task performed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::store_with_machine;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn form(name: &str, due: NaiveDate) -> ScheduleForm {
        serde_json::from_value(json!({
            "schedule_name": name,
            "frequency_type": "weekly",
            "frequency_value": 2,
            "next_due_date": due.format("%Y-%m-%d").to_string(),
            "checklist_items": "Check oil levels\n\nClean chaff collector\n",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list_ordered_with_due_state() {
        let (store, machine) = store_with_machine().await;
        let today = d(2025, 6, 10);
        create_schedule(&store, form("Later", d(2025, 7, 1))).await.unwrap();
        let soon = create_schedule(&store, form("Soon", d(2025, 6, 14))).await.unwrap();
        create_schedule(&store, form("Late", d(2025, 6, 1))).await.unwrap();

        assert_eq!(soon.machine_id, machine.id);
        assert_eq!(soon.is_active, Some(true));
        assert_eq!(
            soon.checklist_items,
            Some(vec!["Check oil levels".to_string(), "Clean chaff collector".to_string()])
        );

        let views = list_schedules(&store, today, 7).await.unwrap();
        let summary: Vec<(&str, DueState)> = views
            .iter()
            .map(|v| (v.schedule.schedule_name.as_str(), v.due_state))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Late", DueState::Overdue),
                ("Soon", DueState::DueSoon),
                ("Later", DueState::Scheduled)
            ]
        );
        assert_eq!(views[0].days_until_due, -9);
    }

    #[tokio::test]
    async fn test_validation() {
        let (store, _) = store_with_machine().await;
        let mut bad = form(" ", d(2025, 1, 1));
        bad.frequency_value = 0;
        match create_schedule(&store, bad).await {
            Err(ServiceError::Validation(msg)) => {
                assert!(msg.contains("schedule_name is required"));
                assert!(msg.contains("frequency_value"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_deactivate_and_delete() {
        let (store, _) = store_with_machine().await;
        let s = create_schedule(&store, form("Belt check", d(2025, 6, 14))).await.unwrap();

        let updated = update_schedule(
            &store,
            &s.id,
            ScheduleUpdate {
                is_active: Some(false),
                frequency_type: Some(FrequencyType::Monthly),
                ..ScheduleUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.is_active, Some(false));
        assert_eq!(updated.frequency_type, FrequencyType::Monthly);
        assert_eq!(updated.schedule_name, "Belt check");
        assert_eq!(due_state(&updated, d(2025, 6, 30), 7).0, DueState::Inactive);

        delete_schedule(&store, &s.id).await.unwrap();
        assert!(matches!(delete_schedule(&store, &s.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_performed_rolls_forward() {
        let (store, _) = store_with_machine().await;
        let s = create_schedule(&store, form("Bearing grease", d(2025, 6, 14))).await.unwrap();
        let done = record_performed(&store, &s.id, d(2025, 6, 16)).await.unwrap();
        assert_eq!(done.last_performed_date, Some(d(2025, 6, 16)));
        // Every 2 weeks from the performed date.
        assert_eq!(done.next_due_date, d(2025, 6, 30));
    }

    #[tokio::test]
    async fn test_unrecognised_frequency_rows_still_list() {
        let (store, _) = store_with_machine().await;
        create_schedule(&store, form("Belt check", d(2025, 6, 14))).await.unwrap();
        let inserted = store
            .insert(
                Table::PreventiveSchedules,
                vec![json!({
                    "machine_id": "m",
                    "schedule_name": "Drum inspection",
                    "frequency_type": "biweekly",
                    "frequency_value": 1,
                    "next_due_date": "2025-06-12",
                    "is_active": true
                })],
            )
            .await
            .unwrap();
        let odd_id = inserted[0]["id"].as_str().unwrap().to_string();

        let views = list_schedules(&store, d(2025, 6, 10), 7).await.unwrap();
        assert_eq!(views.len(), 2);
        let odd = views
            .iter()
            .find(|v| v.schedule.id == odd_id)
            .unwrap();
        assert_eq!(odd.schedule.frequency_type, FrequencyType::Unknown);

        let events = crate::services::calendar::load_events(&store).await.unwrap();
        assert_eq!(events.len(), 2);

        assert!(matches!(
            record_performed(&store, &odd_id, d(2025, 6, 12)).await,
            Err(ServiceError::Validation(_))
        ));
        let untouched = get_schedule(&store, &odd_id).await.unwrap();
        assert_eq!(untouched.next_due_date, d(2025, 6, 12));
    }

    #[tokio::test]
    async fn test_unrecognised_frequency_is_rejected_on_write() {
        let (store, _) = store_with_machine().await;
        let mut bad = form("Drum inspection", d(2025, 6, 12));
        bad.frequency_type = FrequencyType::Unknown;
        match create_schedule(&store, bad).await {
            Err(ServiceError::Validation(msg)) => assert!(msg.contains("frequency_type")),
            other => panic!("unexpected {other:?}"),
        }

        let s = create_schedule(&store, form("Belt check", d(2025, 6, 14))).await.unwrap();
        let update: ScheduleUpdate =
            serde_json::from_value(json!({ "frequency_type": "fortnightly" })).unwrap();
        assert!(matches!(
            update_schedule(&store, &s.id, update).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(get_schedule(&store, &s.id).await.unwrap().frequency_type, FrequencyType::Weekly);
    }

    #[tokio::test]
    async fn test_update_with_blank_checklist_clears_it() {
        let (store, _) = store_with_machine().await;
        let s = create_schedule(&store, form("Belt check", d(2025, 6, 14))).await.unwrap();
        assert!(s.checklist_items.is_some());

        let update = ScheduleUpdate {
            checklist_items: Some(vec!["  ".into(), String::new()]),
            ..ScheduleUpdate::default()
        };
        let updated = update_schedule(&store, &s.id, update).await.unwrap();
        assert_eq!(updated.checklist_items, None);

        let stored = store
            .select(Table::PreventiveSchedules, &Query::new().eq("id", s.id.as_str()))
            .await
            .unwrap();
        assert!(stored[0]["checklist_items"].is_null());

        let update = ScheduleUpdate {
            checklist_items: Some(vec![" Inspect belt ".into(), " ".into()]),
            ..ScheduleUpdate::default()
        };
        let updated = update_schedule(&store, &s.id, update).await.unwrap();
        assert_eq!(updated.checklist_items, Some(vec!["Inspect belt".to_string()]));
    }
}
