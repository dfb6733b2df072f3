use crate::auth::require_session;
use crate::handlers;
use crate::models::{
    Appointment, Contact, Customer, NewAppointment, NewContact, NewProduct, NewService, Product, Service,
};
use crate::state::AppState;
use crate::upload::UPLOAD_BODY_LIMIT;
use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/services", get(handlers::list_records::<Service>))
        .route("/api/products", get(handlers::list_records::<Product>))
        .route("/api/settings", get(handlers::get_settings))
        .route(
            "/api/appointments",
            post(handlers::create_record::<Appointment, NewAppointment>),
        )
        .route("/api/contact", post(handlers::create_record::<Contact, NewContact>));

    let admin_api = Router::new()
        .route("/api/auth/session", get(handlers::session))
        .route("/api/appointments", get(handlers::list_records::<Appointment>))
        .route(
            "/api/appointments/:id",
            put(handlers::update_record::<Appointment>).delete(handlers::delete_record::<Appointment>),
        )
        .route("/api/contacts", get(handlers::list_records::<Contact>))
        .route(
            "/api/contacts/:id",
            put(handlers::update_record::<Contact>).delete(handlers::delete_record::<Contact>),
        )
        .route(
            "/api/customers",
            get(handlers::list_records::<Customer>).post(handlers::upsert_customer),
        )
        .route(
            "/api/customers/:id",
            put(handlers::update_record::<Customer>).delete(handlers::delete_record::<Customer>),
        )
        .route("/api/services", post(handlers::create_record::<Service, NewService>))
        .route(
            "/api/services/:id",
            put(handlers::update_record::<Service>).delete(handlers::delete_record::<Service>),
        )
        .route("/api/products", post(handlers::create_record::<Product, NewProduct>))
        .route(
            "/api/products/:id",
            put(handlers::update_record::<Product>).delete(handlers::delete_record::<Product>),
        )
        .route("/api/settings", put(handlers::update_settings))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/report", get(handlers::get_report))
        .route("/api/export", get(handlers::export_data))
        .route("/api/export/contacts.csv", get(handlers::export_contacts))
        .route("/api/export/customers.csv", get(handlers::export_customers))
        .route(
            "/api/upload",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/send-email", post(handlers::send_email))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let public_files = ServeDir::new(&state.config.public_dir).not_found_service(handlers::not_found.into_service());

    Router::new()
        .route("/", get(handlers::index))
        .route("/admin", get(handlers::admin))
        .route("/admin/login", get(handlers::admin_login))
        .merge(public_api)
        .merge(admin_api)
        .nest_service("/admin/assets", ServeDir::new(&state.config.admin_dir))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback_service(public_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
