use crate::models::{
    Appointment, AppointmentStatus, AppointmentsByStatus, Contact, ContactStatus, ContactsByStatus, Customer,
    Product, ReportResponse, ReportSummary, Service, StatsResponse,
};
use crate::records::list;
use crate::storage::Store;
use chrono::{DateTime, Utc};

const RECENT_COUNT: usize = 5;

/// Everything the dashboard counts over.
pub struct Collections {
    pub appointments: Vec<Appointment>,
    pub contacts: Vec<Contact>,
    pub customers: Vec<Customer>,
    pub services: Vec<Service>,
    pub products: Vec<Product>,
}

impl Collections {
    pub async fn load(store: &Store) -> Self {
        Self {
            appointments: list(store).await,
            contacts: list(store).await,
            customers: list(store).await,
            services: list(store).await,
            products: list(store).await,
        }
    }
}

pub fn build_stats(data: &Collections) -> StatsResponse {
    StatsResponse {
        total_appointments: data.appointments.len(),
        total_contacts: data.contacts.len(),
        total_customers: data.customers.len(),
        total_services: data.services.len(),
        total_products: data.products.len(),
        appointments_by_status: appointments_by_status(&data.appointments),
        contacts_by_status: contacts_by_status(&data.contacts),
        recent_appointments: most_recent(&data.appointments, |a| a.created_at),
        recent_contacts: most_recent(&data.contacts, |c| c.created_at),
    }
}

pub fn build_report(data: &Collections, now: DateTime<Utc>) -> ReportResponse {
    ReportResponse {
        generated_date: now,
        summary: ReportSummary {
            total_appointments: data.appointments.len(),
            total_contacts: data.contacts.len(),
            total_customers: data.customers.len(),
            total_services: data.services.len(),
        },
        appointments_by_status: appointments_by_status(&data.appointments),
        contacts_by_status: contacts_by_status(&data.contacts),
    }
}

pub fn appointments_by_status(appointments: &[Appointment]) -> AppointmentsByStatus {
    let mut counts = AppointmentsByStatus::default();
    for appointment in appointments {
        match appointment.status {
            AppointmentStatus::Pending => counts.pending += 1,
            AppointmentStatus::Confirmed => counts.confirmed += 1,
            AppointmentStatus::Completed => counts.completed += 1,
            AppointmentStatus::Cancelled => counts.cancelled += 1,
        }
    }
    counts
}

pub fn contacts_by_status(contacts: &[Contact]) -> ContactsByStatus {
    let mut counts = ContactsByStatus::default();
    for contact in contacts {
        match contact.status {
            ContactStatus::New => counts.new += 1,
            ContactStatus::Read => counts.read += 1,
            ContactStatus::Replied => counts.replied += 1,
        }
    }
    counts
}

/// Newest first; equal timestamps keep file order.
fn most_recent<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    sorted.into_iter().take(RECENT_COUNT).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::Map;

    fn appointment(id: u64, status: AppointmentStatus, minutes: i64) -> Appointment {
        Appointment {
            id,
            customer_name: format!("Customer {id}"),
            email: String::new(),
            phone: String::new(),
            service: "Consultation".to_string(),
            date: "2026-10-20".to_string(),
            time: "09:00".to_string(),
            status,
            notes: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes),
            extra: Map::new(),
        }
    }

    fn contact(id: u64, status: ContactStatus) -> Contact {
        Contact {
            id,
            name: format!("Contact {id}"),
            email: String::new(),
            phone: String::new(),
            service: String::new(),
            message: "hello".to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap(),
            extra: Map::new(),
        }
    }

    fn collections(appointments: Vec<Appointment>, contacts: Vec<Contact>) -> Collections {
        Collections {
            appointments,
            contacts,
            customers: Vec::new(),
            services: Vec::new(),
            products: Vec::new(),
        }
    }

    #[test]
    fn breakdowns_sum_to_totals() {
        let data = collections(
            vec![
                appointment(1, AppointmentStatus::Pending, 0),
                appointment(2, AppointmentStatus::Pending, 1),
                appointment(3, AppointmentStatus::Cancelled, 2),
                appointment(4, AppointmentStatus::Completed, 3),
            ],
            vec![contact(1, ContactStatus::New), contact(2, ContactStatus::Replied)],
        );

        let stats = build_stats(&data);
        assert_eq!(stats.total_appointments, 4);
        assert_eq!(stats.appointments_by_status.pending, 2);
        assert_eq!(stats.appointments_by_status.total(), stats.total_appointments);
        assert_eq!(stats.contacts_by_status.total(), stats.total_contacts);
    }

    #[test]
    fn recent_is_newest_first_and_capped() {
        let appointments = (1..=7)
            .map(|id| appointment(id, AppointmentStatus::Pending, id as i64))
            .collect();
        let stats = build_stats(&collections(appointments, Vec::new()));

        let ids: Vec<u64> = stats.recent_appointments.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn recent_ties_keep_file_order() {
        let contacts = vec![contact(3, ContactStatus::New), contact(1, ContactStatus::New), contact(2, ContactStatus::Read)];
        let stats = build_stats(&collections(Vec::new(), contacts));

        let ids: Vec<u64> = stats.recent_contacts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn report_summarizes_counts() {
        let data = collections(vec![appointment(1, AppointmentStatus::Confirmed, 0)], vec![]);
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let report = build_report(&data, now);
        assert_eq!(report.generated_date, now);
        assert_eq!(report.summary.total_appointments, 1);
        assert_eq!(report.appointments_by_status.confirmed, 1);
    }
}
