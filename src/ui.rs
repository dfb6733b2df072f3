use crate::filters::{self, ListFilter};
use crate::models::{
    Appointment, AppointmentStatus, Contact, ContactStatus, Customer, Product, Service, Settings, StatsResponse,
};
use crate::stats::Collections;
use std::fmt::Write;

/// What the public site shows.
pub struct SiteView<'a> {
    pub settings: &'a Settings,
    pub services: &'a [Service],
    pub products: &'a [Product],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Appointments,
    Contacts,
    Customers,
    Services,
    Products,
    Settings,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Dashboard,
        Section::Appointments,
        Section::Contacts,
        Section::Customers,
        Section::Services,
        Section::Products,
        Section::Settings,
    ];

    /// Unknown or empty names fall back to the dashboard.
    pub fn parse(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|section| section.slug() == raw.trim())
            .unwrap_or(Section::Dashboard)
    }

    pub fn slug(self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Appointments => "appointments",
            Section::Contacts => "contacts",
            Section::Customers => "customers",
            Section::Services => "services",
            Section::Products => "products",
            Section::Settings => "settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Appointments => "Appointments",
            Section::Contacts => "Messages",
            Section::Customers => "Customers",
            Section::Services => "Services",
            Section::Products => "Products",
            Section::Settings => "Settings",
        }
    }
}

/// What one admin page needs; built per request from freshly read collections.
pub struct AdminView<'a> {
    pub username: &'a str,
    pub section: Section,
    pub filter: &'a ListFilter,
    pub data: &'a Collections,
    pub stats: &'a StatsResponse,
    pub settings: &'a Settings,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn money(price: f64) -> String {
    format!("GHS {price:.2}")
}

fn record_no(id: u64) -> String {
    format!("#{id:03}")
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}…")
}

fn page(title: &str, body: &str, script: &str) -> String {
    // Body goes in last so placeholder-looking user text is never expanded.
    PAGE_HTML
        .replace("{{STYLE}}", STYLE_CSS)
        .replace("{{SCRIPT}}", script)
        .replace("{{TITLE}}", &escape(title))
        .replace("{{BODY}}", body)
}

/// One input of an admin form, prefilled with `value`.
struct Field<'a> {
    name: &'static str,
    kind: &'static str,
    value: &'a str,
}

fn field<'a>(name: &'static str, kind: &'static str, value: &'a str) -> Field<'a> {
    Field { name, kind, value }
}

fn inputs(fields: &[Field]) -> String {
    let mut out = String::new();
    for Field { name, kind, value } in fields {
        let value = escape(value);
        let _ = match *kind {
            "textarea" => write!(out, r#"<textarea name="{name}" placeholder="{name}">{value}</textarea>"#),
            "file" => write!(out, r#"<input name="{name}" type="file" accept=".jpg,.jpeg,.png,.gif,.webp">"#),
            "number" => write!(
                out,
                r#"<input name="{name}" type="number" step="0.01" min="0" value="{value}" placeholder="{name}">"#
            ),
            _ => write!(out, r#"<input name="{name}" type="{kind}" value="{value}" placeholder="{name}">"#),
        };
    }
    out
}

/// Collapsed form that PUTs its fields to `url`.
fn edit_form(url: &str, fields: &[Field]) -> String {
    format!(
        r#"<details class="edit"><summary>Edit</summary><form data-edit-url="{url}">{}<button type="submit">Save</button></form></details>"#,
        inputs(fields)
    )
}

// Public site

pub fn render_site(view: &SiteView) -> String {
    let settings = view.settings;
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<header class="hero"><h1>{name}</h1><p>{address}</p><p><a href="tel:{phone}">{phone}</a> · <a href="mailto:{email}">{email}</a></p></header>"#,
        name = escape(&settings.business_name),
        address = escape(&settings.business_address),
        phone = escape(&settings.business_phone),
        email = escape(&settings.business_email),
    );

    body.push_str(r#"<section id="services"><h2>Services</h2><div class="grid">"#);
    for service in view.services {
        let _ = write!(
            body,
            r#"<article class="card"><div class="icon">{icon}</div><h3>{name}</h3><p>{description}</p><p class="price">From {price}</p><button type="button" data-book="{name}">Book Service</button></article>"#,
            icon = escape(&service.icon),
            name = escape(&service.name),
            description = escape(&service.description),
            price = money(service.price),
        );
    }
    body.push_str("</div></section>");

    body.push_str(r#"<section id="products"><h2>Products</h2><div class="filters"><button type="button" class="filter-btn active" data-category="all">All</button>"#);
    let mut categories: Vec<&str> = view.products.iter().map(|p| p.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();
    for category in categories.into_iter().filter(|c| !c.is_empty()) {
        let _ = write!(
            body,
            r#"<button type="button" class="filter-btn" data-category="{category}">{category}</button>"#,
            category = escape(category),
        );
    }
    body.push_str(r#"</div><div class="grid">"#);
    for product in view.products {
        body.push_str(&product_card(product, false));
    }
    body.push_str("</div></section>");

    let mut service_options = String::from(r#"<option value="">Select a service</option>"#);
    for service in view.services {
        let _ = write!(service_options, "<option>{}</option>", escape(&service.name));
    }

    let _ = write!(
        body,
        r#"<section id="contact" class="forms">
<form id="appointmentForm" data-submit-url="/api/appointments" data-success="Appointment request submitted successfully! We will confirm shortly.">
  <h2>Book an appointment</h2>
  <input name="customerName" placeholder="Full name" required>
  <input name="email" type="email" placeholder="Email" required>
  <input name="phone" type="tel" placeholder="Phone" required>
  <select name="service" id="service" required>{service_options}</select>
  <input name="date" type="date" required>
  <input name="time" type="time" required>
  <textarea name="notes" placeholder="Anything we should know?"></textarea>
  <button type="submit">Request appointment</button>
</form>
<form id="contactForm" data-submit-url="/api/contact" data-success="Thank you for contacting us! We will get back to you soon.">
  <h2>Send us a message</h2>
  <input name="name" placeholder="Full name" required>
  <input name="email" type="email" placeholder="Email" required>
  <input name="phone" type="tel" placeholder="Phone">
  <textarea name="message" placeholder="Message" required></textarea>
  <button type="submit">Send message</button>
</form>
</section>"#
    );

    body.push_str(r#"<footer><h3>Opening hours</h3><ul>"#);
    for (day, hours) in &settings.business_hours {
        let _ = write!(body, "<li><span>{}</span> {}</li>", escape(day), escape(hours));
    }
    body.push_str(r#"</ul><p><a href="/admin">Admin</a></p></footer><div id="notice" class="notice" hidden></div>"#);

    let script = format!("{COMMON_JS}{SITE_JS}");
    page(&settings.business_name, &body, &script)
}

fn product_card(product: &Product, admin: bool) -> String {
    let visual = match product.image.as_deref() {
        Some(src) if !src.is_empty() => format!(r#"<img src="{}" alt="{}">"#, escape(src), escape(&product.name)),
        _ => format!(r#"<div class="icon">{}</div>"#, escape(&product.icon)),
    };
    let badge = product
        .badge
        .as_deref()
        .map(|badge| format!(r#"<span class="badge">{}</span>"#, escape(badge)))
        .unwrap_or_default();
    let actions = if admin {
        let url = format!("/api/products/{}", product.id);
        let price = product.price.to_string();
        let edit = edit_form(
            &url,
            &[
                field("name", "text", &product.name),
                field("category", "text", &product.category),
                field("icon", "text", &product.icon),
                field("badge", "text", product.badge.as_deref().unwrap_or_default()),
                field("price", "number", &price),
                field("description", "textarea", &product.description),
                field("image", "file", ""),
            ],
        );
        format!(r#"{edit}<button type="button" class="danger" data-delete-url="{url}">Delete</button>"#)
    } else {
        String::new()
    };

    format!(
        r#"<article class="card product" data-category="{category}">{visual}{badge}<h3>{name}</h3><span class="tag">{category}</span><p>{description}</p><p class="price">{price}</p>{actions}</article>"#,
        category = escape(&product.category),
        name = escape(&product.name),
        description = escape(&product.description),
        price = money(product.price),
    )
}

// Login

pub fn render_login(business_name: &str) -> String {
    let body = format!(
        r#"<main class="login"><form id="loginForm">
  <h1>{name} admin</h1>
  <input name="username" placeholder="Username" autocomplete="username" required>
  <input name="password" type="password" placeholder="Password" autocomplete="current-password" required>
  <button type="submit">Sign in</button>
  <p id="loginError" class="error" hidden></p>
</form></main>"#,
        name = escape(business_name),
    );
    page("Admin login", &body, LOGIN_JS)
}

// Admin panel

pub fn render_admin(view: &AdminView) -> String {
    let mut body = String::new();

    body.push_str(r#"<nav class="admin-nav">"#);
    for section in Section::ALL {
        let class = if section == view.section { " class=\"active\"" } else { "" };
        let _ = write!(
            body,
            r#"<a href="/admin?section={slug}"{class}>{title}</a>"#,
            slug = section.slug(),
            title = section.title(),
        );
    }
    let _ = write!(
        body,
        r#"<span class="spacer"></span><span>Signed in as {user}</span><button type="button" id="logout">Log out</button></nav><main class="admin" data-business="{business}"><h1>{title}</h1>"#,
        user = escape(view.username),
        business = escape(&view.settings.business_name),
        title = view.section.title(),
    );

    let content = match view.section {
        Section::Dashboard => dashboard(view),
        Section::Appointments => appointments_section(view),
        Section::Contacts => contacts_section(view),
        Section::Customers => customers_section(view),
        Section::Services => services_section(&view.data.services),
        Section::Products => products_section(view),
        Section::Settings => settings_section(view.settings),
    };
    body.push_str(&content);
    body.push_str(r#"</main><div id="notice" class="notice" hidden></div>"#);

    let script = format!("{COMMON_JS}{ADMIN_JS}");
    page(&format!("{} · Admin", view.section.title()), &body, &script)
}

fn dashboard(view: &AdminView) -> String {
    let stats = view.stats;
    let mut out = String::from(r#"<div class="stats">"#);
    for (label, value) in [
        ("Appointments", stats.total_appointments),
        ("Messages", stats.total_contacts),
        ("Customers", stats.total_customers),
        ("Services", stats.total_services),
        ("Products", stats.total_products),
    ] {
        let _ = write!(out, r#"<div class="stat"><span>{label}</span><strong>{value}</strong></div>"#);
    }
    out.push_str("</div>");

    let by_status = &stats.appointments_by_status;
    let _ = write!(
        out,
        r#"<p class="breakdown">Pending {} · Confirmed {} · Completed {} · Cancelled {}</p>"#,
        by_status.pending, by_status.confirmed, by_status.completed, by_status.cancelled
    );
    let contacts = &stats.contacts_by_status;
    let _ = write!(
        out,
        r#"<p class="breakdown">New {} · Read {} · Replied {}</p>"#,
        contacts.new, contacts.read, contacts.replied
    );

    out.push_str("<h2>Recent appointments</h2>");
    let recent: Vec<&Appointment> = stats.recent_appointments.iter().collect();
    out.push_str(&appointments_table(&recent));
    out.push_str("<h2>Recent messages</h2>");
    let recent: Vec<&Contact> = stats.recent_contacts.iter().collect();
    out.push_str(&contacts_table(&recent));

    out.push_str(r#"<p class="links"><a href="/api/export" download>Export data (JSON)</a> <a href="/api/report" download>Generate report</a></p>"#);
    out
}

fn search_form(section: Section, filter: &ListFilter, extra: &str) -> String {
    format!(
        r#"<form class="filters" method="get" action="/admin"><input type="hidden" name="section" value="{slug}"><input name="q" value="{q}" placeholder="Search">{extra}<button type="submit">Filter</button></form>"#,
        slug = section.slug(),
        q = escape(&filter.q),
    )
}

fn select(name: &str, current: &str, values: &[&str], empty_label: &str) -> String {
    let mut out = format!(r#"<select name="{name}"><option value="">{empty_label}</option>"#);
    for value in values {
        let selected = if *value == current { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{v}"{selected}>{v}</option>"#, v = escape(value));
    }
    out.push_str("</select>");
    out
}

fn status_select(url: &str, current: &str, values: &[&str]) -> String {
    let mut out = format!(r#"<select data-status-url="{url}">"#);
    for value in values {
        let selected = if *value == current { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{value}"{selected}>{value}</option>"#);
    }
    out.push_str("</select>");
    out
}

fn appointments_section(view: &AdminView) -> String {
    let statuses: Vec<&str> = AppointmentStatus::ALL.iter().map(|s| s.as_str()).collect();
    let mut out = search_form(
        Section::Appointments,
        view.filter,
        &select("status", view.filter.status.trim(), &statuses, "All statuses"),
    );

    let services: Vec<&str> = view.data.services.iter().map(|s| s.name.as_str()).collect();
    let _ = write!(
        out,
        r#"<form class="create" data-create-url="/api/appointments"><h2>New appointment</h2>{fields}{service}{status}<textarea name="notes" placeholder="Notes"></textarea><button type="submit">Add</button></form>"#,
        fields = inputs(&[
            field("customerName", "text", ""),
            field("email", "email", ""),
            field("phone", "tel", ""),
            field("date", "date", ""),
            field("time", "time", ""),
        ]),
        service = select("service", "", &services, "Select a service"),
        status = select("status", "", &statuses, "Status"),
    );

    out.push_str(&appointments_table(&filters::appointments(&view.data.appointments, view.filter)));
    out
}

fn appointments_table(items: &[&Appointment]) -> String {
    if items.is_empty() {
        return r#"<p class="empty">No appointments.</p>"#.to_string();
    }
    let statuses: Vec<&str> = AppointmentStatus::ALL.iter().map(|s| s.as_str()).collect();
    let mut out = String::from(
        "<table><thead><tr><th>No.</th><th>Customer</th><th>Contact</th><th>Service</th><th>Date</th><th>Time</th><th>Status</th><th></th></tr></thead><tbody>",
    );
    for item in items {
        let url = format!("/api/appointments/{}", item.id);
        let edit = edit_form(
            &url,
            &[
                field("customerName", "text", &item.customer_name),
                field("email", "email", &item.email),
                field("phone", "tel", &item.phone),
                field("service", "text", &item.service),
                field("date", "date", &item.date),
                field("time", "time", &item.time),
                field("notes", "textarea", &item.notes),
            ],
        );
        let _ = write!(
            out,
            r#"<tr><td>{no}</td><td>{name}</td><td>{email}<br>{phone}</td><td>{service}</td><td>{date}</td><td>{time}</td><td>{status}</td><td>{edit}<button type="button" class="danger" data-delete-url="{url}">Delete</button></td></tr>"#,
            no = record_no(item.id),
            name = escape(&item.customer_name),
            email = escape(&item.email),
            phone = escape(&item.phone),
            service = escape(&item.service),
            date = escape(&item.date),
            time = escape(&item.time),
            status = status_select(&url, item.status.as_str(), &statuses),
        );
    }
    out.push_str("</tbody></table>");
    out
}

fn contacts_section(view: &AdminView) -> String {
    let statuses: Vec<&str> = ContactStatus::ALL.iter().map(|s| s.as_str()).collect();
    let mut out = search_form(
        Section::Contacts,
        view.filter,
        &select("status", view.filter.status.trim(), &statuses, "All statuses"),
    );
    out.push_str(r#"<p class="links"><a href="/api/export/contacts.csv" download>Export CSV</a></p>"#);
    out.push_str(&contacts_table(&filters::contacts(&view.data.contacts, view.filter)));
    out
}

fn contacts_table(items: &[&Contact]) -> String {
    if items.is_empty() {
        return r#"<p class="empty">No messages.</p>"#.to_string();
    }
    let statuses: Vec<&str> = ContactStatus::ALL.iter().map(|s| s.as_str()).collect();
    let mut out = String::from(
        "<table><thead><tr><th>No.</th><th>Name</th><th>Email</th><th>Phone</th><th>Message</th><th>Received</th><th>Status</th><th></th></tr></thead><tbody>",
    );
    for item in items {
        let url = format!("/api/contacts/{}", item.id);
        let _ = write!(
            out,
            r#"<tr><td>{no}</td><td>{name}</td><td><a href="mailto:{email}">{email}</a></td><td>{phone}</td><td title="{full}">{message}</td><td>{received}</td><td>{status}</td><td><button type="button" data-reply-url="{url}" data-email="{email}" data-name="{name}" data-service="{service}">Reply</button><button type="button" class="danger" data-delete-url="{url}">Delete</button></td></tr>"#,
            no = record_no(item.id),
            name = escape(&item.name),
            email = escape(&item.email),
            phone = escape(&item.phone),
            service = escape(&item.service),
            full = escape(&item.message),
            message = escape(&excerpt(&item.message, 50)),
            received = item.created_at.format("%Y-%m-%d %H:%M"),
            status = status_select(&url, item.status.as_str(), &statuses),
        );
    }
    out.push_str("</tbody></table>");
    out
}

fn customers_section(view: &AdminView) -> String {
    let mut out = search_form(Section::Customers, view.filter, "");
    out.push_str(r#"<p class="links"><a href="/api/export/customers.csv" download>Export CSV</a></p>"#);

    let items: Vec<&Customer> = filters::customers(&view.data.customers, view.filter);
    if items.is_empty() {
        out.push_str(r#"<p class="empty">No customers.</p>"#);
        return out;
    }
    out.push_str("<table><thead><tr><th>No.</th><th>Name</th><th>Email</th><th>Phone</th><th>Services</th><th>Last service</th><th></th></tr></thead><tbody>");
    for item in items {
        let _ = write!(
            out,
            r#"<tr><td>{no}</td><td>{name}</td><td>{email}</td><td>{phone}</td><td>{total}</td><td>{last}</td><td>{edit}<button type="button" class="danger" data-delete-url="/api/customers/{id}">Delete</button></td></tr>"#,
            no = record_no(item.id),
            name = escape(&item.name),
            email = escape(&item.email),
            phone = escape(&item.phone),
            total = item.total_services,
            last = item.last_service.map(|date| date.to_string()).unwrap_or_default(),
            edit = edit_form(
                &format!("/api/customers/{}", item.id),
                &[
                    field("name", "text", &item.name),
                    field("email", "email", &item.email),
                    field("phone", "tel", &item.phone),
                ],
            ),
            id = item.id,
        );
    }
    out.push_str("</tbody></table>");
    out
}

fn services_section(services: &[Service]) -> String {
    let mut out = String::from(
        r#"<form class="create" data-create-url="/api/services"><h2>Add service</h2><input name="name" placeholder="Name" required><input name="category" placeholder="Category"><input name="icon" placeholder="Icon"><input name="price" type="number" step="0.01" min="0" placeholder="Price"><textarea name="description" placeholder="Description"></textarea><button type="submit">Add</button></form>"#,
    );
    out.push_str("<table><thead><tr><th>No.</th><th></th><th>Name</th><th>Category</th><th>Price</th><th></th></tr></thead><tbody>");
    for service in services {
        let _ = write!(
            out,
            r#"<tr><td>{no}</td><td>{icon}</td><td>{name}<br><small>{description}</small></td><td>{category}</td><td>{price}</td><td>{edit}<button type="button" class="danger" data-delete-url="/api/services/{id}">Delete</button></td></tr>"#,
            no = record_no(service.id),
            icon = escape(&service.icon),
            name = escape(&service.name),
            description = escape(&service.description),
            category = escape(&service.category),
            price = money(service.price),
            edit = edit_form(
                &format!("/api/services/{}", service.id),
                &[
                    field("name", "text", &service.name),
                    field("category", "text", &service.category),
                    field("icon", "text", &service.icon),
                    field("price", "number", &service.price.to_string()),
                    field("description", "textarea", &service.description),
                ],
            ),
            id = service.id,
        );
    }
    out.push_str("</tbody></table>");
    out
}

fn products_section(view: &AdminView) -> String {
    let mut categories: Vec<&str> = view.data.products.iter().map(|p| p.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();
    categories.retain(|c| !c.is_empty());

    let mut out = search_form(
        Section::Products,
        view.filter,
        &select("category", view.filter.category.trim(), &categories, "All categories"),
    );
    out.push_str(
        r#"<form class="create" data-create-url="/api/products"><h2>Add product</h2><input name="name" placeholder="Name" required><input name="category" placeholder="Category"><input name="icon" placeholder="Icon"><input name="badge" placeholder="Badge"><input name="price" type="number" step="0.01" min="0" placeholder="Price"><textarea name="description" placeholder="Description"></textarea><input name="image" type="file" accept=".jpg,.jpeg,.png,.gif,.webp"><button type="submit">Add</button></form>"#,
    );

    let items = filters::products(&view.data.products, view.filter);
    if items.is_empty() {
        out.push_str(r#"<p class="empty">No products.</p>"#);
        return out;
    }
    out.push_str(r#"<div class="grid">"#);
    for product in items {
        out.push_str(&product_card(product, true));
    }
    out.push_str("</div>");
    out
}

fn settings_section(settings: &Settings) -> String {
    let mut out = format!(
        r#"<form class="settings" data-settings-url="/api/settings">
<label>Business name<input name="businessName" value="{name}"></label>
<label>Phone<input name="businessPhone" value="{phone}"></label>
<label>Email<input name="businessEmail" type="email" value="{email}"></label>
<label>Address<input name="businessAddress" value="{address}"></label>
<fieldset><legend>Opening hours</legend>"#,
        name = escape(&settings.business_name),
        phone = escape(&settings.business_phone),
        email = escape(&settings.business_email),
        address = escape(&settings.business_address),
    );
    for (day, hours) in &settings.business_hours {
        let _ = write!(
            out,
            r#"<label>{day}<input data-hours="{day}" value="{hours}"></label>"#,
            day = escape(day),
            hours = escape(hours),
        );
    }
    out.push_str(r#"</fieldset><button type="submit">Save settings</button></form>"#);
    out
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>{{STYLE}}</style>
</head>
<body>
{{BODY}}
<script>{{SCRIPT}}</script>
</body>
</html>
"#;

const STYLE_CSS: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; color: #222; background: #fafafa; }
header.hero, section, footer, main { max-width: 1100px; margin: 0 auto; padding: 24px; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 16px; }
.card { background: #fff; border-radius: 12px; padding: 16px; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.06); }
.card img { max-width: 100%; border-radius: 8px; }
.icon { font-size: 2rem; }
.price { font-weight: 600; }
.badge, .tag { display: inline-block; font-size: 0.75rem; padding: 2px 8px; border-radius: 999px; background: #eee; }
form { display: grid; gap: 8px; }
.forms { display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 24px; }
.filters { display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 12px; }
.filter-btn.active { background: #222; color: #fff; }
table { width: 100%; border-collapse: collapse; background: #fff; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid #eee; vertical-align: top; }
.admin-nav { display: flex; gap: 12px; align-items: center; padding: 12px 24px; background: #222; }
.admin-nav a { color: #ddd; text-decoration: none; }
.admin-nav a.active { color: #fff; font-weight: 600; }
.admin-nav span { color: #aaa; }
.spacer { flex: 1; }
.stats { display: flex; flex-wrap: wrap; gap: 12px; }
.stat { background: #fff; padding: 12px 16px; border-radius: 8px; display: grid; }
.danger { color: #b00020; }
.notice { position: fixed; right: 16px; bottom: 16px; padding: 12px 16px; border-radius: 8px; background: #222; color: #fff; }
.notice.error { background: #b00020; }
.error { color: #b00020; }
.login { max-width: 360px; }
details.edit summary { cursor: pointer; color: #0057b8; }
details.edit form { margin: 8px 0; }
"#;

const COMMON_JS: &str = r#"
const notify = (message, kind) => {
  const el = document.getElementById('notice');
  if (!el) { return; }
  el.textContent = message;
  el.className = 'notice ' + (kind || '');
  el.hidden = false;
  setTimeout(() => { el.hidden = true; }, 3000);
};

const api = async (method, url, body) => {
  const init = { method, credentials: 'same-origin', headers: {} };
  if (body !== undefined) {
    init.headers['content-type'] = 'application/json';
    init.body = JSON.stringify(body);
  }
  const res = await fetch(url, init);
  let payload = null;
  try { payload = await res.json(); } catch (_) { payload = null; }
  if (!res.ok) {
    throw new Error((payload && payload.error) || 'Request failed');
  }
  return payload;
};

const formObject = (form) => {
  const data = {};
  new FormData(form).forEach((value, key) => {
    if (typeof value === 'string') { data[key] = value.trim(); }
  });
  return data;
};
"#;

const SITE_JS: &str = r#"
document.querySelectorAll('form[data-submit-url]').forEach((form) => {
  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    try {
      await api('POST', form.dataset.submitUrl, formObject(form));
      notify(form.dataset.success, 'ok');
      form.reset();
    } catch (err) {
      console.error(err);
      notify(err.message || 'Something went wrong. Please try again.', 'error');
    }
  });
});

document.querySelectorAll('.filter-btn').forEach((button) => {
  button.addEventListener('click', () => {
    document.querySelectorAll('.filter-btn').forEach((b) => b.classList.toggle('active', b === button));
    const category = button.dataset.category;
    document.querySelectorAll('.product').forEach((card) => {
      card.hidden = !(category === 'all' || card.dataset.category === category);
    });
  });
});

document.querySelectorAll('[data-book]').forEach((button) => {
  button.addEventListener('click', () => {
    const select = document.getElementById('service');
    select.value = button.dataset.book;
    document.getElementById('appointmentForm').scrollIntoView();
    notify('Selected service: ' + button.dataset.book, 'ok');
  });
});
"#;

const LOGIN_JS: &str = r#"
const form = document.getElementById('loginForm');
const errorEl = document.getElementById('loginError');
form.addEventListener('submit', async (event) => {
  event.preventDefault();
  errorEl.hidden = true;
  const data = Object.fromEntries(new FormData(form));
  const res = await fetch('/api/auth/login', {
    method: 'POST',
    credentials: 'same-origin',
    headers: { 'content-type': 'application/json' },
    body: JSON.stringify(data)
  });
  if (res.ok) {
    window.location.href = '/admin';
    return;
  }
  const payload = await res.json().catch(() => ({}));
  errorEl.textContent = payload.error || 'Login failed';
  errorEl.hidden = false;
});
"#;

const ADMIN_JS: &str = r#"
const reload = () => window.location.reload();
const fail = (err) => { console.error(err); notify(err.message, 'error'); };

document.addEventListener('change', (event) => {
  const select = event.target.closest('[data-status-url]');
  if (!select) { return; }
  api('PUT', select.dataset.statusUrl, { status: select.value })
    .then(() => notify('Status updated', 'ok'))
    .catch(fail);
});

document.addEventListener('click', (event) => {
  const button = event.target.closest('[data-delete-url]');
  if (!button || !confirm('Delete this record?')) { return; }
  api('DELETE', button.dataset.deleteUrl).then(reload).catch(fail);
});

document.getElementById('logout').addEventListener('click', () => {
  api('POST', '/api/auth/logout').finally(() => { window.location.href = '/admin/login'; });
});

const uploadImage = async (file) => {
  const body = new FormData();
  body.append('image', file);
  const res = await fetch('/api/upload', { method: 'POST', credentials: 'same-origin', body });
  const payload = await res.json().catch(() => ({}));
  if (!res.ok) { throw new Error(payload.error || 'Upload failed'); }
  return payload.imageUrl;
};

document.querySelectorAll('form[data-create-url]').forEach((form) => {
  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    try {
      const data = formObject(form);
      if (data.price !== undefined) { data.price = Number(data.price || 0); }
      const file = form.querySelector('input[type=file]');
      if (file && file.files.length) { data.image = await uploadImage(file.files[0]); }
      const created = await api('POST', form.dataset.createUrl, data);
      if (data.status && created && created.status !== data.status) {
        await api('PUT', form.dataset.createUrl + '/' + created.id, { status: data.status });
      }
      reload();
    } catch (err) {
      fail(err);
    }
  });
});

document.querySelectorAll('form[data-edit-url]').forEach((form) => {
  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    try {
      const data = formObject(form);
      if (data.price !== undefined) { data.price = Number(data.price || 0); }
      const file = form.querySelector('input[type=file]');
      if (file && file.files.length) { data.image = await uploadImage(file.files[0]); }
      await api('PUT', form.dataset.editUrl, data);
      reload();
    } catch (err) {
      fail(err);
    }
  });
});

document.addEventListener('click', (event) => {
  const button = event.target.closest('[data-reply-url]');
  if (!button) { return; }
  const { email, name, service } = button.dataset;
  const business = document.querySelector('main.admin').dataset.business;
  const subject = 'Re: Your inquiry' + (service ? ' about ' + service : '');
  const body = 'Dear ' + name + ',\n\nThank you for your inquiry. We have received your message and will get back to you shortly.\n\nBest regards,\n' + business;
  api('PUT', button.dataset.replyUrl, { status: 'replied' })
    .then(() => {
      window.location.href = 'mailto:' + email + '?subject=' + encodeURIComponent(subject) + '&body=' + encodeURIComponent(body);
    })
    .catch(fail);
});

const settingsForm = document.querySelector('form[data-settings-url]');
if (settingsForm) {
  settingsForm.addEventListener('submit', (event) => {
    event.preventDefault();
    const data = formObject(settingsForm);
    data.businessHours = {};
    settingsForm.querySelectorAll('[data-hours]').forEach((input) => {
      data.businessHours[input.dataset.hours] = input.value.trim();
    });
    api('PUT', settingsForm.dataset.settingsUrl, data)
      .then(() => notify('Settings saved', 'ok'))
      .catch(fail);
  });
}
"#;


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;
    use crate::stats::build_stats;
    use chrono::Utc;
    use serde_json::Map;

    fn service(id: u64, name: &str) -> Service {
        Service {
            id,
            name: name.to_string(),
            description: "desc".to_string(),
            price: 1500.0,
            icon: "⚡".to_string(),
            category: "electrical".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(escape(r#"<b onclick="x">&'"#), "&lt;b onclick=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn site_lists_services_and_escapes_names() {
        let settings = Settings {
            business_name: "Joy <Home>".to_string(),
            ..Default::default()
        };
        let services = vec![service(1, "Solar & Wind")];
        let html = render_site(&SiteView {
            settings: &settings,
            services: &services,
            products: &[],
        });

        assert!(html.contains("<title>Joy &lt;Home&gt;</title>"));
        assert!(html.contains("Solar &amp; Wind"));
        assert!(html.contains("GHS 1500.00"));
        assert!(html.contains(r#"data-submit-url="/api/appointments""#));
    }

    #[test]
    fn site_script_defines_notify_once() {
        let html = render_site(&SiteView {
            settings: &Settings::default(),
            services: &[],
            products: &[],
        });
        assert_eq!(html.matches("const notify").count(), 1);
    }

    fn admin_html(section: Section, data: &Collections) -> String {
        let settings = Settings {
            business_name: "Joy Home".to_string(),
            ..Default::default()
        };
        let stats = build_stats(data);
        render_admin(&AdminView {
            username: "admin",
            section,
            filter: &ListFilter::default(),
            data,
            stats: &stats,
            settings: &settings,
        })
    }

    fn sample_data() -> Collections {
        Collections {
            appointments: vec![Appointment {
                id: 4,
                customer_name: "Ama".to_string(),
                email: "ama@example.com".to_string(),
                phone: "0241234567".to_string(),
                service: "Consultation".to_string(),
                date: "2026-11-02".to_string(),
                time: "10:00".to_string(),
                status: AppointmentStatus::Pending,
                notes: "side gate".to_string(),
                created_at: Utc::now(),
                extra: Map::new(),
            }],
            contacts: vec![Contact {
                id: 2,
                name: "Yaw".to_string(),
                email: "yaw@example.com".to_string(),
                phone: String::new(),
                service: "Solar".to_string(),
                message: "Quote please".to_string(),
                status: ContactStatus::New,
                created_at: Utc::now(),
                extra: Map::new(),
            }],
            customers: Vec::new(),
            services: vec![service(1, "Consultation")],
            products: Vec::new(),
        }
    }

    #[test]
    fn admin_appointments_offer_create_and_edit() {
        let html = admin_html(Section::Appointments, &sample_data());
        assert!(html.contains(r#"data-create-url="/api/appointments""#));
        assert!(html.contains(r#"data-edit-url="/api/appointments/4""#));
        assert!(html.contains(r#"<textarea name="notes" placeholder="notes">side gate</textarea>"#));
        assert!(html.contains("<option value=\"Consultation\">Consultation</option>"));
    }

    #[test]
    fn admin_contacts_offer_reply() {
        let html = admin_html(Section::Contacts, &sample_data());
        assert!(html.contains(r#"data-reply-url="/api/contacts/2""#));
        assert!(html.contains(r#"data-email="yaw@example.com""#));
        assert!(html.contains(r#"data-business="Joy Home""#));
    }

    #[test]
    fn admin_services_offer_edit() {
        let html = admin_html(Section::Services, &sample_data());
        assert!(html.contains(r#"data-edit-url="/api/services/1""#));
        assert!(html.contains(r#"name="price" type="number" step="0.01" min="0" value="1500""#));
    }

    #[test]
    fn section_parse_falls_back_to_dashboard() {
        assert_eq!(Section::parse("products"), Section::Products);
        assert_eq!(Section::parse(""), Section::Dashboard);
        assert_eq!(Section::parse("../etc"), Section::Dashboard);
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("héllo", 10), "héllo");
        assert_eq!(excerpt("héllo wörld", 5), "héllo…");
    }
}
