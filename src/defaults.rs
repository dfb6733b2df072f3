use crate::storage::Collection;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Content written for each collection file that does not exist yet.
pub fn default_collections() -> HashMap<Collection, Value> {
    let mut defaults = HashMap::new();
    defaults.insert(Collection::Appointments, json!([]));
    defaults.insert(Collection::Contacts, json!([]));
    defaults.insert(Collection::Customers, json!([]));
    defaults.insert(Collection::Services, default_services());
    defaults.insert(Collection::Products, default_products());
    defaults.insert(Collection::Settings, default_settings());
    defaults
}

fn default_services() -> Value {
    json!([
        {
            "id": 1,
            "name": "Electrical Services",
            "description": "Wiring, panel upgrades and troubleshooting for homes and businesses.",
            "price": 1500,
            "icon": "⚡",
            "category": "electrical"
        },
        {
            "id": 2,
            "name": "Electronics Repair",
            "description": "Repairs for TVs, computers and home appliances.",
            "price": 750,
            "icon": "🔧",
            "category": "electronics"
        },
        {
            "id": 3,
            "name": "Solar Systems",
            "description": "Design, installation and maintenance of solar panel systems.",
            "price": 25000,
            "icon": "☀️",
            "category": "solar"
        },
        {
            "id": 4,
            "name": "Solar Repair",
            "description": "Repair and maintenance of existing solar installations.",
            "price": 2000,
            "icon": "🔋",
            "category": "solar"
        },
        {
            "id": 5,
            "name": "Emergency Services",
            "description": "Round-the-clock call-outs for urgent electrical and solar failures.",
            "price": 3000,
            "icon": "🚨",
            "category": "emergency"
        },
        {
            "id": 6,
            "name": "Consultation",
            "description": "Advice on energy efficiency, system design and upgrades.",
            "price": 1000,
            "icon": "💡",
            "category": "consultation"
        }
    ])
}

fn default_products() -> Value {
    json!([
        { "id": 1, "name": "Circuit Breaker Panel", "category": "electrical", "description": "Breaker panel with modern safety features.", "price": 2999.99, "icon": "⚡", "badge": "Best Seller" },
        { "id": 2, "name": "LED Light Bulbs Set", "category": "electrical", "description": "Long-life energy-efficient LED bulbs.", "price": 459.99, "icon": "💡", "badge": "Eco-Friendly" },
        { "id": 3, "name": "Solar Panel Kit", "category": "solar", "description": "Panels, mounting hardware and inverter.", "price": 12999.99, "icon": "☀️", "badge": "Popular" },
        { "id": 4, "name": "Battery Charger", "category": "electronics", "description": "Fast charger for multiple battery types.", "price": 899.99, "icon": "🔋", "badge": "New" },
        { "id": 5, "name": "Electrical Tester", "category": "accessories", "description": "Voltage, current and resistance tester.", "price": 1599.99, "icon": "🔧", "badge": "Pro Tool" },
        { "id": 6, "name": "Solar Inverter", "category": "solar", "description": "High-efficiency grid-tie inverter.", "price": 8999.99, "icon": "🔄", "badge": "Premium" },
        { "id": 7, "name": "Wire Strippers", "category": "accessories", "description": "Wire strippers with multiple gauge settings.", "price": 349.99, "icon": "✂️", "badge": "Essential" },
        { "id": 8, "name": "Smart Switch", "category": "electronics", "description": "WiFi switch for home automation.", "price": 799.99, "icon": "📱", "badge": "Smart Home" }
    ])
}

fn default_settings() -> Value {
    json!({
        "businessName": "Ultimate Joy Home",
        "businessPhone": "+233 54 655 109",
        "businessEmail": "info@ultimatejoyhome.com",
        "businessAddress": "Tamale, Northern Region, Ghana",
        "businessHours": {
            "monday": "8:00 AM - 6:00 PM",
            "tuesday": "8:00 AM - 6:00 PM",
            "wednesday": "8:00 AM - 6:00 PM",
            "thursday": "8:00 AM - 6:00 PM",
            "friday": "8:00 AM - 6:00 PM",
            "saturday": "9:00 AM - 4:00 PM",
            "sunday": "Closed"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, Service, Settings};

    #[test]
    fn defaults_deserialize_into_models() {
        let defaults = default_collections();
        let services: Vec<Service> = serde_json::from_value(defaults[&Collection::Services].clone()).unwrap();
        let products: Vec<Product> = serde_json::from_value(defaults[&Collection::Products].clone()).unwrap();
        let settings: Settings = serde_json::from_value(defaults[&Collection::Settings].clone()).unwrap();

        assert_eq!(services.len(), 6);
        assert_eq!(products.len(), 8);
        assert!(products.iter().all(|product| product.image.is_none()));
        assert_eq!(settings.business_hours.len(), 7);
    }
}
