use crate::auth::{self, AuthUser};
use crate::errors::AppError;
use crate::export;
use crate::filters::ListFilter;
use crate::models::{
    Contact, Customer, DataExport, HealthResponse, LoginRequest, LoginResponse, MessageResponse, NewCustomer,
    Product, ReportResponse, Service, Settings, StatsResponse, UploadResponse, UserSummary,
};
use crate::records::{self, Draft, Record, Upsert};
use crate::state::AppState;
use crate::stats::{build_report, build_stats, Collections};
use crate::storage::Collection;
use crate::ui::{render_admin, render_login, render_site, AdminView, Section, SiteView};
use crate::upload;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Multipart, Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type IdParam = Result<Path<u64>, PathRejection>;

// Pages

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let settings: Settings = state.store.read_document(Collection::Settings).await;
    let services: Vec<Service> = records::list(&state.store).await;
    let products: Vec<Product> = records::list(&state.store).await;
    Html(render_site(&SiteView {
        settings: &settings,
        services: &services,
        products: &products,
    }))
}

pub async fn admin_login(State(state): State<AppState>) -> Html<String> {
    let settings: Settings = state.store.read_document(Collection::Settings).await;
    Html(render_login(&settings.business_name))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SectionQuery {
    pub section: String,
}

pub async fn admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(section): Query<SectionQuery>,
    Query(filter): Query<ListFilter>,
) -> Response {
    let Some(user) = auth::current_user(&state, &headers).await else {
        return Redirect::to("/admin/login").into_response();
    };

    let data = Collections::load(&state.store).await;
    let stats = build_stats(&data);
    let settings: Settings = state.store.read_document(Collection::Settings).await;
    Html(render_admin(&AdminView {
        username: &user.username,
        section: Section::parse(&section.section),
        filter: &filter,
        data: &data,
        stats: &stats,
        settings: &settings,
    }))
    .into_response()
}

// Health and auth

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

pub async fn login(State(state): State<AppState>, payload: JsonBody<LoginRequest>) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    let username = payload.username.trim();

    let Some(user) = auth::authenticate(&state.store, username, &payload.password).await else {
        warn!(username, "failed login");
        return Err(AppError::unauthorized("Invalid username or password"));
    };

    let token = state.sessions.issue(&user.username).await;
    info!(username = %user.username, "login succeeded");
    let cookie = auth::session_cookie(&token, state.sessions.ttl());
    let body = LoginResponse {
        success: true,
        user: UserSummary {
            username: user.username,
        },
        token,
        message: "Login successful".to_string(),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = auth::token_from_headers(&headers) {
        state.sessions.revoke(&token).await;
    }
    (
        [(header::SET_COOKIE, auth::cleared_session_cookie())],
        Json(MessageResponse::new("Logged out")),
    )
        .into_response()
}

pub async fn session(Extension(user): Extension<AuthUser>) -> Json<UserSummary> {
    Json(UserSummary {
        username: user.username,
    })
}

// Generic record CRUD, instantiated per entity in the router.

pub async fn list_records<R: Record>(State(state): State<AppState>) -> Json<Vec<R>> {
    Json(records::list::<R>(&state.store).await)
}

pub async fn create_record<R, D>(
    State(state): State<AppState>,
    payload: JsonBody<D>,
) -> Result<(StatusCode, Json<R>), AppError>
where
    R: Record,
    D: Draft<R> + DeserializeOwned + Send + 'static,
{
    let Json(draft) = payload?;
    let record = records::create::<R, D>(&state.store, draft, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record<R: Record>(
    State(state): State<AppState>,
    id: IdParam,
    payload: JsonBody<Map<String, Value>>,
) -> Result<Json<R>, AppError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let record = records::update::<R>(&state.store, id, patch).await?;
    Ok(Json(record))
}

pub async fn delete_record<R: Record>(State(state): State<AppState>, id: IdParam) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    records::delete::<R>(&state.store, id).await?;
    Ok(Json(MessageResponse::new(format!("{} deleted successfully", R::LABEL))))
}

pub async fn upsert_customer(
    State(state): State<AppState>,
    payload: JsonBody<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let Json(draft) = payload?;
    match records::upsert_customer(&state.store, draft, Utc::now()).await? {
        Upsert::Created(customer) => Ok((StatusCode::CREATED, Json(customer))),
        Upsert::Updated(customer) => Ok((StatusCode::OK, Json(customer))),
    }
}

// Settings

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.store.read_document(Collection::Settings).await)
}

pub async fn update_settings(
    State(state): State<AppState>,
    payload: JsonBody<Map<String, Value>>,
) -> Result<Json<Settings>, AppError> {
    let Json(patch) = payload?;
    let settings = state
        .store
        .mutate_document(Collection::Settings, move |settings: &mut Settings| {
            *settings = records::merge_fields(settings, patch, &[], "settings")?;
            Ok(settings.clone())
        })
        .await?;
    info!("settings updated");
    Ok(Json(settings))
}

// Reporting

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let data = Collections::load(&state.store).await;
    Json(build_stats(&data))
}

pub async fn get_report(State(state): State<AppState>) -> Json<ReportResponse> {
    let data = Collections::load(&state.store).await;
    Json(build_report(&data, Utc::now()))
}

pub async fn export_data(State(state): State<AppState>) -> Json<DataExport> {
    let data = Collections::load(&state.store).await;
    Json(DataExport {
        exported_at: Utc::now(),
        appointments: data.appointments,
        contacts: data.contacts,
        customers: data.customers,
        services: data.services,
    })
}

fn csv_download(name: &str, body: String) -> Response {
    let filename = format!("{name}-{}.csv", Utc::now().date_naive());
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response()
}

pub async fn export_contacts(State(state): State<AppState>) -> Response {
    let contacts: Vec<Contact> = records::list(&state.store).await;
    csv_download("contacts", export::contacts_csv(&contacts))
}

pub async fn export_customers(State(state): State<AppState>) -> Response {
    let customers: Vec<Customer> = records::list(&state.store).await;
    csv_download("customers", export::customers_csv(&customers))
}

// Upload and notifications

pub async fn upload_image(State(state): State<AppState>, multipart: Multipart) -> Result<Json<UploadResponse>, AppError> {
    let saved = upload::save_image(&state.config.upload_dir, multipart).await?;
    Ok(Json(saved))
}

/// No mail transport is wired up; the request is only logged.
pub async fn send_email(
    Extension(user): Extension<AuthUser>,
    payload: JsonBody<Map<String, Value>>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;
    let payload = Value::Object(payload);
    info!(requested_by = %user.username, payload = %payload, "email notification requested");
    Ok(Json(MessageResponse::new("Email notification logged")))
}

pub async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}
