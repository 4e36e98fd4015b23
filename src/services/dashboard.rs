//! Reliability KPIs for the dashboard.
//!
//! All figures are derived from completed work orders over a fixed
//! observation period (one year by default):
//!
//! - **MTBF** = period / number of corrective (failure) records, reported
//!   only once there is more than one failure.
//! - **MTTR** = mean of `completed_at - started_at` over records that have
//!   both timestamps.
//! - **Availability** = (period - total downtime) / period, as a percentage.
//!
//! With no completed records the figures read "No data".

use serde::Serialize;

use super::ServiceResult;
use crate::store::{self, Query, Table, TableStore};
use crate::types::{MaintenanceRecord, MaintenanceType, WorkOrderStatus};

const NO_DATA: &str = "No data";

/// Dashboard KPI cards: raw numbers plus the display strings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Kpis {
    pub has_data: bool,
    pub period_hours: f64,
    pub completed_records: usize,
    pub failures: usize,
    pub mtbf_hours: Option<f64>,
    pub mttr_hours: Option<f64>,
    pub availability_percent: Option<f64>,
    pub total_downtime_hours: f64,
    pub total_cost: f64,
    pub active_alerts: usize,
    pub mtbf: String,
    pub mttr: String,
    pub availability: String,
    pub total_cost_display: String,
}

/// Compute the KPIs from completed records and the unresolved alert count.
pub fn compute_kpis(completed: &[MaintenanceRecord], active_alerts: usize, period_hours: f64) -> Kpis {
    if completed.is_empty() {
        return Kpis {
            has_data: false,
            period_hours,
            completed_records: 0,
            failures: 0,
            mtbf_hours: None,
            mttr_hours: None,
            availability_percent: None,
            total_downtime_hours: 0.0,
            total_cost: 0.0,
            active_alerts,
            mtbf: NO_DATA.to_string(),
            mttr: NO_DATA.to_string(),
            availability: NO_DATA.to_string(),
            total_cost_display: format_currency(0.0),
        };
    }

    let failures = completed
        .iter()
        .filter(|r| r.maintenance_type == MaintenanceType::Corrective)
        .count();
    let total_downtime: f64 = completed.iter().map(|r| r.downtime_hours.unwrap_or(0.0)).sum();
    let total_cost: f64 = completed.iter().map(|r| r.cost.unwrap_or(0.0)).sum();

    let repair_times: Vec<f64> = completed.iter().filter_map(MaintenanceRecord::repair_hours).collect();
    let mttr = if repair_times.is_empty() {
        0.0
    } else {
        repair_times.iter().sum::<f64>() / repair_times.len() as f64
    };

    let mtbf = (failures > 1).then(|| period_hours / failures as f64);
    let availability = (period_hours - total_downtime) / period_hours * 100.0;

    Kpis {
        has_data: true,
        period_hours,
        completed_records: completed.len(),
        failures,
        mtbf_hours: mtbf,
        mttr_hours: Some(mttr),
        availability_percent: Some(availability),
        total_downtime_hours: total_downtime,
        total_cost,
        active_alerts,
        mtbf: mtbf.map_or_else(|| "N/A".to_string(), |h| format!("{h:.1} hrs")),
        mttr: format!("{mttr:.1} hrs"),
        availability: format!("{availability:.1}%"),
        total_cost_display: format_currency(total_cost),
    }
}

/// Load the completed records and active alerts, then compute the KPIs.
pub async fn load_dashboard(store: &dyn TableStore, period_hours: f64) -> ServiceResult<Kpis> {
    let completed: Vec<MaintenanceRecord> = store::fetch(
        store,
        Table::MaintenanceRecords,
        &Query::new().eq("status", WorkOrderStatus::Completed.as_str()),
    )
    .await?;
    let active_alerts = store
        .select(Table::Alerts, &Query::new().eq("is_resolved", false))
        .await?
        .len();
    Ok(compute_kpis(&completed, active_alerts, period_hours))
}

/// `$12,345.5` style amount with thousands separators.
fn format_currency(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match cents {
        0 => format!("{sign}${grouped}"),
        c if c % 10 == 0 => format!("{sign}${grouped}.{}", c / 10),
        c => format!("{sign}${grouped}.{c:02}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: MaintenanceType, downtime: Option<f64>, cost: Option<f64>, repair: Option<(&str, &str)>) -> MaintenanceRecord {
        let mut row = serde_json::json!({
            "id": "r",
            "machine_id": "m",
            "work_order_number": "WO",
            "maintenance_type": kind,
            "status": "completed",
            "downtime_hours": downtime,
            "cost": cost,
        });
        if let Some((start, end)) = repair {
            row["started_at"] = start.into();
            row["completed_at"] = end.into();
        }
        serde_json::from_value(row).unwrap()
    }

    #[test]
    fn test_no_records_reads_no_data() {
        let kpis = compute_kpis(&[], 3, 8760.0);
        assert!(!kpis.has_data);
        assert_eq!(kpis.mtbf, "No data");
        assert_eq!(kpis.mttr, "No data");
        assert_eq!(kpis.availability, "No data");
        assert_eq!(kpis.total_cost_display, "$0");
        assert_eq!(kpis.active_alerts, 3);
    }

    #[test]
    fn test_kpis_from_completed_records() {
        let records = vec![
            record(
                MaintenanceType::Corrective,
                Some(10.0),
                Some(1200.0),
                Some(("2025-01-01T08:00:00Z", "2025-01-01T12:00:00Z")),
            ),
            record(
                MaintenanceType::Corrective,
                Some(6.0),
                None,
                Some(("2025-02-01T08:00:00Z", "2025-02-01T10:00:00Z")),
            ),
            record(MaintenanceType::Preventive, None, Some(300.5), None),
        ];
        let kpis = compute_kpis(&records, 1, 8760.0);
        assert_eq!(kpis.failures, 2);
        assert_eq!(kpis.mtbf_hours, Some(4380.0));
        assert_eq!(kpis.mtbf, "4380.0 hrs");
        assert_eq!(kpis.mttr_hours, Some(3.0));
        assert_eq!(kpis.mttr, "3.0 hrs");
        assert!((kpis.total_downtime_hours - 16.0).abs() < 1e-9);
        // (8760 - 16) / 8760 * 100 = 99.817...
        assert_eq!(kpis.availability, "99.8%");
        assert!((kpis.total_cost - 1500.5).abs() < 1e-9);
        assert_eq!(kpis.total_cost_display, "$1,500.5");
    }

    #[test]
    fn test_single_failure_has_no_mtbf() {
        let records = vec![record(MaintenanceType::Corrective, Some(2.0), None, None)];
        let kpis = compute_kpis(&records, 0, 8760.0);
        assert_eq!(kpis.mtbf_hours, None);
        assert_eq!(kpis.mtbf, "N/A");
        assert_eq!(kpis.mttr, "0.0 hrs");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234567.0), "$1,234,567");
        assert_eq!(format_currency(999.99), "$999.99");
        assert_eq!(format_currency(12.3), "$12.3");
    }

    #[tokio::test]
    async fn test_load_dashboard_only_counts_completed_and_unresolved() {
        let store = crate::store::LocalStore::temporary().unwrap();
        store
            .insert(
                Table::MaintenanceRecords,
                vec![
                    serde_json::json!({"machine_id": "m", "work_order_number": "WO-1", "maintenance_type": "corrective", "status": "completed", "downtime_hours": 4.0}),
                    serde_json::json!({"machine_id": "m", "work_order_number": "WO-2", "maintenance_type": "corrective", "status": "in_progress", "downtime_hours": 50.0}),
                ],
            )
            .await
            .unwrap();
        store
            .insert(
                Table::Alerts,
                vec![
                    serde_json::json!({"title": "a", "message": "m", "alert_type": "x", "is_resolved": false}),
                    serde_json::json!({"title": "b", "message": "m", "alert_type": "x", "is_resolved": true}),
                ],
            )
            .await
            .unwrap();

        let kpis = load_dashboard(&store, 8760.0).await.unwrap();
        assert_eq!(kpis.completed_records, 1);
        assert!((kpis.total_downtime_hours - 4.0).abs() < 1e-9);
        assert_eq!(kpis.active_alerts, 1);
    }
}
