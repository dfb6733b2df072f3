use crate::models::{Contact, Customer};

/// Quotes a field when it holds a delimiter, quote or line break.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn csv_row(fields: &[&str]) -> String {
    fields.iter().map(|field| csv_field(field)).collect::<Vec<_>>().join(",")
}

pub fn contacts_csv(contacts: &[Contact]) -> String {
    let mut lines = vec![csv_row(&["name", "email", "phone", "service", "date"])];
    for contact in contacts {
        let date = contact.created_at.date_naive().to_string();
        lines.push(csv_row(&[
            contact.name.as_str(),
            contact.email.as_str(),
            contact.phone.as_str(),
            contact.service.as_str(),
            date.as_str(),
        ]));
    }
    lines.join("\n") + "\n"
}

pub fn customers_csv(customers: &[Customer]) -> String {
    let mut lines = vec![csv_row(&["name", "email", "phone", "totalServices", "lastService"])];
    for customer in customers {
        let total = customer.total_services.to_string();
        let last = customer.last_service.map(|date| date.to_string()).unwrap_or_default();
        lines.push(csv_row(&[
            customer.name.as_str(),
            customer.email.as_str(),
            customer.phone.as_str(),
            total.as_str(),
            last.as_str(),
        ]));
    }
    lines.join("\n") + "\n"
}
