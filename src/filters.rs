//! Search and filter over collections that are already loaded.

use crate::models::{Appointment, AppointmentStatus, Contact, ContactStatus, Customer, Product};
use serde::Deserialize;

/// Query string of the admin panel. Empty values mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListFilter {
    pub q: String,
    pub status: String,
    pub category: String,
}

impl ListFilter {
    fn needle(&self) -> String {
        self.q.trim().to_lowercase()
    }

    fn category(&self) -> Option<&str> {
        let category = self.category.trim();
        (!category.is_empty()).then_some(category)
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

/// Matches customer name or service; an unknown status matches nothing.
pub fn appointments<'a>(items: &'a [Appointment], filter: &ListFilter) -> Vec<&'a Appointment> {
    let needle = filter.needle();
    let status = filter.status.trim();
    let wanted = (!status.is_empty()).then(|| AppointmentStatus::parse(status));

    items
        .iter()
        .filter(|item| contains(&item.customer_name, &needle) || contains(&item.service, &needle))
        .filter(|item| match wanted {
            None => true,
            Some(wanted) => wanted == Some(item.status),
        })
        .collect()
}

/// Matches name or email.
pub fn contacts<'a>(items: &'a [Contact], filter: &ListFilter) -> Vec<&'a Contact> {
    let needle = filter.needle();
    let status = filter.status.trim();
    let wanted = (!status.is_empty()).then(|| ContactStatus::parse(status));

    items
        .iter()
        .filter(|item| contains(&item.name, &needle) || contains(&item.email, &needle))
        .filter(|item| match wanted {
            None => true,
            Some(wanted) => wanted == Some(item.status),
        })
        .collect()
}

/// Matches name or description, narrowed by exact category.
pub fn products<'a>(items: &'a [Product], filter: &ListFilter) -> Vec<&'a Product> {
    let needle = filter.needle();
    let category = filter.category();

    items
        .iter()
        .filter(|item| contains(&item.name, &needle) || contains(&item.description, &needle))
        .filter(|item| category.is_none_or(|category| item.category == category))
        .collect()
}

pub fn customers<'a>(items: &'a [Customer], filter: &ListFilter) -> Vec<&'a Customer> {
    let needle = filter.needle();
    items
        .iter()
        .filter(|item| contains(&item.name, &needle) || contains(&item.email, &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;

    fn appointment(id: u64, name: &str, service: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id,
            customer_name: name.to_string(),
            email: String::new(),
            phone: String::new(),
            service: service.to_string(),
            date: String::new(),
            time: String::new(),
            status,
            notes: String::new(),
            created_at: Utc::now(),
            extra: Map::new(),
        }
    }

    fn product(id: u64, name: &str, description: &str, category: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            price: 10.0,
            icon: String::new(),
            badge: None,
            image: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    fn filter(q: &str, status: &str, category: &str) -> ListFilter {
        ListFilter {
            q: q.to_string(),
            status: status.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn appointment_search_is_case_insensitive() {
        let items = vec![
            appointment(1, "Ama Mensah", "Solar Repair", AppointmentStatus::Pending),
            appointment(2, "Kofi Boateng", "Consultation", AppointmentStatus::Confirmed),
        ];

        let ids = |found: Vec<&Appointment>| found.iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids(appointments(&items, &filter("SOLAR", "", ""))), vec![1]);
        assert_eq!(ids(appointments(&items, &filter("kofi", "", ""))), vec![2]);
        assert_eq!(ids(appointments(&items, &filter("", "confirmed", ""))), vec![2]);
        assert_eq!(ids(appointments(&items, &filter("", "", ""))), vec![1, 2]);
        assert!(appointments(&items, &filter("", "lost", "")).is_empty());
    }

    #[test]
    fn product_filter_combines_search_and_category() {
        let items = vec![
            product(1, "Solar Panel Kit", "Panels and inverter", "solar"),
            product(2, "Solar Inverter", "Grid-tie inverter", "solar"),
            product(3, "Smart Switch", "WiFi inverter-friendly switch", "electronics"),
        ];

        let found = products(&items, &filter("inverter", "", "solar"));
        let ids: Vec<u64> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
