//! Supplier contacts.

use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use super::{Problems, ServiceError, ServiceResult};
use crate::store::{self, Filter, Query, Table, TableStore};
use crate::types::{non_blank, Vendor, VendorForm};

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().map_or(true, |re| re.is_match(email))
}

/// Vendors ordered by name, optionally filtered by a case-insensitive name
/// substring.
pub async fn list_vendors(store: &dyn TableStore, search: Option<&str>) -> ServiceResult<Vec<Vendor>> {
    let vendors: Vec<Vendor> =
        store::fetch(store, Table::Vendors, &Query::new().order_by("name", true)).await?;
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    Ok(match needle {
        Some(n) => vendors
            .into_iter()
            .filter(|v| v.name.to_lowercase().contains(&n))
            .collect(),
        None => vendors,
    })
}

pub async fn create_vendor(store: &dyn TableStore, form: VendorForm) -> ServiceResult<Vendor> {
    let form = VendorForm {
        name: form.name.trim().to_string(),
        contact_person: non_blank(form.contact_person.as_deref()),
        email: non_blank(form.email.as_deref()),
        phone: non_blank(form.phone.as_deref()),
        address: non_blank(form.address.as_deref()),
        website: non_blank(form.website.as_deref()),
        notes: non_blank(form.notes.as_deref()),
    };

    let mut problems = Problems::new();
    problems.require("name", &form.name);
    if let Some(email) = &form.email {
        problems.check(is_valid_email(email), format!("'{email}' is not a valid email address"));
    }
    problems.finish()?;

    let vendor: Vendor = store::insert_one(store, Table::Vendors, &form).await?;
    info!(vendor = %vendor.name, "Vendor added");
    Ok(vendor)
}

pub async fn delete_vendor(store: &dyn TableStore, id: &str) -> ServiceResult<()> {
    let removed = store.delete(Table::Vendors, &[Filter::eq("id", id)]).await?;
    if removed == 0 {
        return Err(ServiceError::NotFound(format!("vendor {id}")));
    }
    info!(vendor = %id, "Vendor deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;

    fn form(name: &str, email: Option<&str>) -> VendorForm {
        VendorForm {
            name: name.into(),
            email: email.map(str::to_string),
            phone: Some("  ".into()),
            ..VendorForm::default()
        }
    }

    #[test]
    fn test_email_check() {
        assert!(is_valid_email("parts@probat.example"));
        assert!(!is_valid_email("parts at probat"));
        assert!(!is_valid_email("a@b"));
    }

    #[tokio::test]
    async fn test_create_list_search_delete() {
        let store = LocalStore::temporary().unwrap();
        let probat = create_vendor(&store, form("Probat Parts", Some("parts@probat.example")))
            .await
            .unwrap();
        assert!(probat.phone.is_none());
        create_vendor(&store, form("Coffee Tech Supply", None)).await.unwrap();

        let all = list_vendors(&store, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Coffee Tech Supply", "Probat Parts"]);
        assert_eq!(list_vendors(&store, Some("PROBAT")).await.unwrap().len(), 1);

        delete_vendor(&store, &probat.id).await.unwrap();
        assert!(matches!(delete_vendor(&store, &probat.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_validation() {
        let store = LocalStore::temporary().unwrap();
        match create_vendor(&store, form(" ", Some("nope"))).await {
            Err(ServiceError::Validation(msg)) => {
                assert!(msg.contains("name is required"));
                assert!(msg.contains("not a valid email"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
