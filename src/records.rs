//! Generic list/create/update/delete over the entity collections.

use crate::errors::AppError;
use crate::models::{
    Appointment, AppointmentStatus, Contact, ContactStatus, Customer, NewAppointment, NewContact, NewCustomer,
    NewProduct, NewService, Product, Service,
};
use crate::storage::{Collection, Store};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::info;

pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Capitalized singular, used in messages ("Appointment not found").
    const LABEL: &'static str;
    /// Alternate field names accepted from forms, mapped to the stored name.
    const ALIASES: &'static [(&'static str, &'static str)] = &[];

    fn id(&self) -> u64;

    /// Format checks that must hold after an update merge.
    fn check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// A validated create payload that becomes a record once it has an id.
pub trait Draft<R: Record> {
    fn validate(&self) -> Result<(), AppError>;
    fn into_record(self, id: u64, now: DateTime<Utc>) -> R;
}

impl Record for Appointment {
    const COLLECTION: Collection = Collection::Appointments;
    const LABEL: &'static str = "Appointment";
    const ALIASES: &'static [(&'static str, &'static str)] = &[("name", "customerName"), ("message", "notes")];

    fn id(&self) -> u64 {
        self.id
    }

    fn check(&self) -> Result<(), AppError> {
        check_email(&self.email)?;
        check_phone(&self.phone)
    }
}

impl Record for Contact {
    const COLLECTION: Collection = Collection::Contacts;
    const LABEL: &'static str = "Contact";

    fn id(&self) -> u64 {
        self.id
    }

    fn check(&self) -> Result<(), AppError> {
        check_email(&self.email)?;
        check_optional_phone(&self.phone)
    }
}

impl Record for Customer {
    const COLLECTION: Collection = Collection::Customers;
    const LABEL: &'static str = "Customer";

    fn id(&self) -> u64 {
        self.id
    }

    fn check(&self) -> Result<(), AppError> {
        check_email(&self.email)?;
        check_optional_phone(&self.phone)
    }
}

impl Record for Service {
    const COLLECTION: Collection = Collection::Services;
    const LABEL: &'static str = "Service";

    fn id(&self) -> u64 {
        self.id
    }
}

impl Record for Product {
    const COLLECTION: Collection = Collection::Products;
    const LABEL: &'static str = "Product";

    fn id(&self) -> u64 {
        self.id
    }
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

/// `local@domain.tld`: one `@`, no whitespace, a dot inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    let plain = |part: &str| !part.is_empty() && !part.contains('@') && !part.chars().any(char::is_whitespace);
    plain(local)
        && plain(domain)
        && domain
            .char_indices()
            .any(|(at, ch)| ch == '.' && at > 0 && at + 1 < domain.len())
}

/// Digits with the usual separators, and at least ten digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    phone
        .chars()
        .all(|ch| ch.is_ascii_digit() || ch.is_whitespace() || matches!(ch, '-' | '+' | '(' | ')'))
        && phone.chars().filter(char::is_ascii_digit).count() >= 10
}

fn check_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::bad_request("Please enter a valid email address"));
    }
    Ok(())
}

fn check_phone(phone: &str) -> Result<(), AppError> {
    if !is_valid_phone(phone) {
        return Err(AppError::bad_request("Please enter a valid phone number"));
    }
    Ok(())
}

fn check_optional_phone(phone: &str) -> Result<(), AppError> {
    if phone.trim().is_empty() {
        return Ok(());
    }
    check_phone(phone)
}

impl Draft<Appointment> for NewAppointment {
    fn validate(&self) -> Result<(), AppError> {
        require("customerName", &self.customer_name)?;
        require("email", &self.email)?;
        require("phone", &self.phone)?;
        require("service", &self.service)?;
        require("date", &self.date)?;
        require("time", &self.time)?;
        check_email(&self.email)?;
        check_phone(&self.phone)
    }

    fn into_record(self, id: u64, now: DateTime<Utc>) -> Appointment {
        Appointment {
            id,
            customer_name: self.customer_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            service: self.service,
            date: self.date,
            time: self.time,
            status: AppointmentStatus::Pending,
            notes: self.notes,
            created_at: now,
            extra: without_reserved(self.extra),
        }
    }
}

impl Draft<Contact> for NewContact {
    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("message", &self.message)?;
        check_email(&self.email)?;
        check_optional_phone(&self.phone)
    }

    fn into_record(self, id: u64, now: DateTime<Utc>) -> Contact {
        Contact {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            service: self.service,
            message: self.message,
            status: ContactStatus::New,
            created_at: now,
            extra: without_reserved(self.extra),
        }
    }
}

impl Draft<Service> for NewService {
    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)
    }

    fn into_record(self, id: u64, _now: DateTime<Utc>) -> Service {
        Service {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            icon: self.icon,
            category: self.category,
            extra: without_reserved(self.extra),
        }
    }
}

impl Draft<Product> for NewProduct {
    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)
    }

    fn into_record(self, id: u64, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name.trim().to_string(),
            category: self.category,
            description: self.description,
            price: self.price,
            icon: self.icon,
            badge: self.badge.filter(|badge| !badge.trim().is_empty()),
            image: self.image.filter(|image| !image.trim().is_empty()),
            created_at: Some(now),
            extra: without_reserved(self.extra),
        }
    }
}

/// Server-assigned keys a client may not smuggle in through the extra fields.
fn without_reserved(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in ["id", "createdAt", "status"] {
        extra.remove(key);
    }
    extra
}

pub async fn list<R: Record>(store: &Store) -> Vec<R> {
    store.read(R::COLLECTION).await
}

pub async fn create<R, D>(store: &Store, draft: D, now: DateTime<Utc>) -> Result<R, AppError>
where
    R: Record,
    D: Draft<R>,
{
    draft.validate()?;
    let record = store
        .mutate(R::COLLECTION, move |records: &mut Vec<R>, ids| {
            for existing in records.iter() {
                ids.observe(existing.id());
            }
            let record = draft.into_record(ids.next_id(), now);
            records.push(record.clone());
            Ok(record)
        })
        .await?;
    info!(collection = R::COLLECTION.name(), id = record.id(), "record created");
    Ok(record)
}

pub async fn update<R: Record>(store: &Store, id: u64, patch: Map<String, Value>) -> Result<R, AppError> {
    store
        .mutate(R::COLLECTION, move |records: &mut Vec<R>, _| {
            let index = records
                .iter()
                .position(|record| record.id() == id)
                .ok_or_else(|| not_found::<R>())?;
            let merged = merge_record(&records[index], patch)?;
            merged.check()?;
            records[index] = merged.clone();
            Ok(merged)
        })
        .await
}

pub async fn delete<R: Record>(store: &Store, id: u64) -> Result<(), AppError> {
    store
        .mutate(R::COLLECTION, move |records: &mut Vec<R>, _| {
            let before = records.len();
            records.retain(|record| record.id() != id);
            if records.len() == before {
                return Err(not_found::<R>());
            }
            Ok(())
        })
        .await?;
    info!(collection = R::COLLECTION.name(), id, "record deleted");
    Ok(())
}

fn not_found<R: Record>() -> AppError {
    AppError::not_found(format!("{} not found", R::LABEL))
}

pub fn merge_record<R: Record>(current: &R, patch: Map<String, Value>) -> Result<R, AppError> {
    merge_fields(current, patch, R::ALIASES, &R::LABEL.to_lowercase())
}

/// Shallow merge of `patch` over the serialized value. `id` is never taken
/// from the patch; alias keys land on the field they stand for.
pub fn merge_fields<T>(
    current: &T,
    patch: Map<String, Value>,
    aliases: &[(&str, &str)],
    label: &str,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(current).map_err(AppError::internal)?;
    if let Value::Object(fields) = &mut value {
        for (key, field) in patch {
            if key == "id" {
                continue;
            }
            let key = aliases
                .iter()
                .find(|(alias, _)| *alias == key)
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or(key);
            fields.insert(key, field);
        }
    }
    serde_json::from_value(value).map_err(|err| AppError::bad_request(format!("invalid {label}: {err}")))
}

/// Whether an upsert made a new record or touched an existing one.
#[derive(Debug)]
pub enum Upsert<R> {
    Created(R),
    Updated(R),
}

/// Customers are keyed by email: a repeat customer gets their counter bumped
/// and `lastService` moved to today instead of a second record.
pub async fn upsert_customer(store: &Store, draft: NewCustomer, now: DateTime<Utc>) -> Result<Upsert<Customer>, AppError> {
    require("email", &draft.email)?;
    check_email(&draft.email)?;
    check_optional_phone(&draft.phone)?;
    let email = draft.email.trim().to_string();
    let today = now.date_naive();

    store
        .mutate(Collection::Customers, move |customers: &mut Vec<Customer>, ids| {
            if let Some(existing) = customers
                .iter_mut()
                .find(|customer| customer.email.trim().eq_ignore_ascii_case(&email))
            {
                if !draft.name.trim().is_empty() {
                    existing.name = draft.name.trim().to_string();
                }
                if !draft.phone.trim().is_empty() {
                    existing.phone = draft.phone.trim().to_string();
                }
                existing.extra.extend(without_reserved(draft.extra));
                existing.total_services = existing.total_services.saturating_add(1);
                existing.last_service = Some(today);
                return Ok(Upsert::Updated(existing.clone()));
            }

            for customer in customers.iter() {
                ids.observe(customer.id);
            }
            let customer = Customer {
                id: ids.next_id(),
                name: draft.name.trim().to_string(),
                email,
                phone: draft.phone.trim().to_string(),
                total_services: 1,
                last_service: Some(today),
                created_at: now,
                extra: without_reserved(draft.extra),
            };
            customers.push(customer.clone());
            Ok(Upsert::Created(customer))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::unique_dir;
    use axum::http::StatusCode;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;

    async fn empty_store(label: &str) -> Store {
        let mut defaults = HashMap::new();
        defaults.insert(Collection::Appointments, json!([]));
        defaults.insert(Collection::Customers, json!([]));
        Store::open(unique_dir(label), &defaults).await.unwrap()
    }

    fn appointment(name: &str) -> NewAppointment {
        NewAppointment {
            customer_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "0241234567".to_string(),
            service: "Solar Repair".to_string(),
            date: "2026-11-02".to_string(),
            time: "10:00".to_string(),
            ..Default::default()
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_pending_status() {
        let store = empty_store("create").await;

        let first: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();
        let second: Appointment = create(&store, appointment("Kofi"), at(10)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, AppointmentStatus::Pending);
        assert_eq!(first.created_at, at(9));
        assert_eq!(list::<Appointment>(&store).await.len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let store = empty_store("missing").await;
        let mut draft = appointment("Ama");
        draft.time = "  ".to_string();

        let err = create::<Appointment, _>(&store, draft, at(9)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("time"));
        assert!(list::<Appointment>(&store).await.is_empty());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_deleting_the_highest() {
        let store = empty_store("reuse").await;
        let _: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();
        let second: Appointment = create(&store, appointment("Kofi"), at(10)).await.unwrap();
        delete::<Appointment>(&store, second.id).await.unwrap();

        let third: Appointment = create(&store, appointment("Esi"), at(11)).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let store = empty_store("delete").await;
        let _: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();

        let err = delete::<Appointment>(&store, 42).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Appointment not found");
        assert_eq!(list::<Appointment>(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn update_merges_fields_and_keeps_id() {
        let store = empty_store("update").await;
        let created: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();

        let patch = json!({ "id": 99, "status": "confirmed", "notes": "bring ladder" });
        let updated: Appointment = update(&store, created.id, patch.as_object().unwrap().clone())
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.notes, "bring ladder");
        assert_eq!(updated.customer_name, "Ama");
    }

    #[tokio::test]
    async fn update_rejects_unknown_status() {
        let store = empty_store("status").await;
        let created: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();

        let patch = json!({ "status": "teleported" });
        let err = update::<Appointment>(&store, created.id, patch.as_object().unwrap().clone())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_accepts_form_aliases() {
        let store = empty_store("aliases").await;
        let created: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();

        let patch = json!({ "name": "Renamed", "message": "gate code 1234" });
        let updated: Appointment = update(&store, created.id, patch.as_object().unwrap().clone())
            .await
            .unwrap();

        assert_eq!(updated.customer_name, "Renamed");
        assert_eq!(updated.notes, "gate code 1234");
        assert!(!updated.extra.contains_key("name"));
    }

    #[tokio::test]
    async fn create_and_update_check_contact_formats() {
        let store = empty_store("formats").await;
        let mut draft = appointment("Ama");
        draft.email = "ama.example.com".to_string();
        let err = create::<Appointment, _>(&store, draft, at(9)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("email"));

        let mut draft = appointment("Ama");
        draft.phone = "12345".to_string();
        let err = create::<Appointment, _>(&store, draft, at(9)).await.unwrap_err();
        assert!(err.message.contains("phone"));

        let created: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();
        let patch = json!({ "email": "not-an-email" });
        let err = update::<Appointment>(&store, created.id, patch.as_object().unwrap().clone())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let stored = list::<Appointment>(&store).await;
        assert_eq!(stored[0].email, "ama@example.com");
    }

    #[test]
    fn email_and_phone_rules() {
        assert!(is_valid_email("ama@example.com"));
        assert!(is_valid_email(" kofi.b@mail.co.uk "));
        assert!(!is_valid_email("ama@example"));
        assert!(!is_valid_email("ama@@example.com"));
        assert!(!is_valid_email("ama mensah@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ama@.com"));

        assert!(is_valid_phone("024 123 4567"));
        assert!(is_valid_phone("+233 (24) 123-4567"));
        assert!(!is_valid_phone("024-123"));
        assert!(!is_valid_phone("0241234567x"));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_restart() {
        let dir = unique_dir("restart_ids");
        let mut defaults = HashMap::new();
        defaults.insert(Collection::Appointments, json!([]));

        let store = Store::open(&dir, &defaults).await.unwrap();
        let _: Appointment = create(&store, appointment("Ama"), at(9)).await.unwrap();
        let second: Appointment = create(&store, appointment("Kofi"), at(10)).await.unwrap();
        delete::<Appointment>(&store, second.id).await.unwrap();
        drop(store);

        let store = Store::open(&dir, &defaults).await.unwrap();
        let third: Appointment = create(&store, appointment("Esi"), at(11)).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn customer_upsert_by_email() {
        let store = empty_store("upsert").await;
        let draft = |email: &str| NewCustomer {
            name: "Ama Mensah".to_string(),
            email: email.to_string(),
            phone: "0241234567".to_string(),
            ..Default::default()
        };

        let created = upsert_customer(&store, draft("ama@example.com"), at(9)).await.unwrap();
        let Upsert::Created(created) = created else {
            panic!("expected a new customer");
        };
        assert_eq!(created.total_services, 1);

        let later = Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap();
        let updated = upsert_customer(&store, draft(" AMA@example.com "), later).await.unwrap();
        let Upsert::Updated(updated) = updated else {
            panic!("expected the existing customer");
        };
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.total_services, 2);
        assert_eq!(updated.last_service, Some(later.date_naive()));
        assert_eq!(list::<Customer>(&store).await.len(), 1);
    }
}
