//! The single tracked machine.

use serde_json::{Map, Value};
use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::store::{self, Filter, Query, StoreError, Table, TableStore};
use crate::types::{non_blank, Machine, MachineForm};

/// The machine row; fails with `MachineMissing` when none is registered.
pub async fn get_machine(store: &dyn TableStore) -> ServiceResult<Machine> {
    let query = Query::new().order_by("created_at", true);
    match store::fetch_single(store, Table::Machine, &query).await {
        Ok(machine) => Ok(machine),
        Err(StoreError::NotFound(_)) => Err(ServiceError::MachineMissing),
        Err(e) => Err(e.into()),
    }
}

/// Id of the machine every record is attached to.
pub async fn machine_id(store: &dyn TableStore) -> ServiceResult<String> {
    Ok(get_machine(store).await?.id)
}

/// Update the machine in place, or register it when none exists yet.
///
/// Never creates a second machine row.
pub async fn save_machine(store: &dyn TableStore, form: MachineForm) -> ServiceResult<Machine> {
    let form = normalize(form);
    let existing: Option<Machine> =
        store::fetch_optional(store, Table::Machine, &Query::new().order_by("created_at", true))
            .await?;

    match existing {
        Some(machine) => {
            let patch = serde_json::to_value(&form).map_err(StoreError::from)?;
            if patch.as_object().is_some_and(Map::is_empty) {
                return Ok(machine);
            }
            let mut updated: Vec<Machine> = store::update_where(
                store,
                Table::Machine,
                &[Filter::eq("id", machine.id.as_str())],
                &patch,
            )
            .await?;
            info!(machine = %machine.id, "Machine details updated");
            updated.pop().ok_or(ServiceError::MachineMissing)
        }
        None => {
            let missing = form.missing_required();
            if !missing.is_empty() {
                return Err(ServiceError::invalid(
                    missing.iter().map(|f| format!("{f} is required")).collect(),
                ));
            }
            let mut row = serde_json::to_value(&form).map_err(StoreError::from)?;
            if let Value::Object(map) = &mut row {
                map.entry("status").or_insert(Value::String("operational".into()));
            }
            let machine: Machine = store::insert_one(store, Table::Machine, &row).await?;
            info!(machine = %machine.id, name = %machine.name, "Machine registered");
            Ok(machine)
        }
    }
}

/// Trim text fields; blank input is treated as "not submitted".
fn normalize(form: MachineForm) -> MachineForm {
    MachineForm {
        name: non_blank(form.name.as_deref()),
        model: non_blank(form.model.as_deref()),
        serial_number: non_blank(form.serial_number.as_deref()),
        manufacturer: non_blank(form.manufacturer.as_deref()),
        installation_date: form.installation_date,
        location: non_blank(form.location.as_deref()),
        description: non_blank(form.description.as_deref()),
        status: form.status,
        image_url: non_blank(form.image_url.as_deref()),
    }
}
