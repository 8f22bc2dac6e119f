use axum::{
    Extension, Form, Router,
    extract::{Query, Request, State},
    http::header,
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Local;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::dataset::ExamDataset;
use crate::downloader;
use crate::error::AppError;
use crate::loader::{LoadReport, load_exams, load_exams_with_report};
use crate::login::{
    self, AdminUser, Argon2CredentialStore, CredentialStore, SESSION_COOKIE, SessionStore,
};
use crate::lookup::{ResultRecord, format_score, lookup_student};
use crate::student_id::StudentId;

pub struct AppState {
    pub config: Config,
    pub credentials: Arc<dyn CredentialStore>,
    pub sessions: SessionStore,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: Config, credentials: Arc<dyn CredentialStore>) -> Result<Self, AppError> {
        let mut templates = Handlebars::new();
        templates.register_partial("header", include_str!("./templates/header.hbs"))?;
        templates.register_partial("footer", include_str!("./templates/footer.hbs"))?;
        templates.register_template_string("index", include_str!("./templates/index.hbs"))?;
        templates.register_template_string("results", include_str!("./templates/results.hbs"))?;
        templates.register_template_string("login", include_str!("./templates/login.hbs"))?;
        templates.register_template_string("admin", include_str!("./templates/admin.hbs"))?;

        Ok(AppState {
            sessions: SessionStore::new(config.session_ttl),
            config,
            credentials,
            templates,
        })
    }

    pub(crate) fn render<T: Serialize>(
        &self,
        name: &str,
        data: &T,
    ) -> Result<Html<String>, AppError> {
        Ok(Html(self.templates.render(name, data)?))
    }

    /// Username of the session attached to this request, if any.
    pub fn session_user(&self, jar: &CookieJar) -> Option<String> {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| self.sessions.validate_session(cookie.value()))
    }

    async fn load_dataset(&self) -> Result<ExamDataset, AppError> {
        let data_dir = self.config.data_dir.clone();
        Ok(tokio::task::spawn_blocking(move || load_exams(data_dir)).await?)
    }

    async fn load_report(&self) -> Result<LoadReport, AppError> {
        let data_dir = self.config.data_dir.clone();
        Ok(tokio::task::spawn_blocking(move || load_exams_with_report(data_dir)).await?)
    }
}

/// One-shot status message carried in the query string after a redirect.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Flash {
    pub error: Option<String>,
    pub success: Option<String>,
}

pub enum FlashKind {
    Error,
    Success,
}

pub fn redirect_with(path: &str, kind: FlashKind, message: &str) -> Redirect {
    let key = match kind {
        FlashKind::Error => "error",
        FlashKind::Success => "success",
    };
    Redirect::to(&format!("{}?{}={}", path, key, urlencoding::encode(message)))
}

#[derive(Deserialize)]
struct LookupForm {
    #[serde(default)]
    student_id: String,
}

#[derive(Serialize)]
struct ResultRow<'a> {
    exam: &'a str,
    section_a: String,
    section_b: String,
    total: String,
    percentage: String,
}

impl<'a> ResultRow<'a> {
    fn new(exam: &'a str, result: &ResultRecord) -> Self {
        ResultRow {
            exam,
            section_a: format_score(result.section_a),
            section_b: format_score(result.section_b),
            total: format_score(Some(result.total)),
            percentage: display_percentage(Some(result.percentage)),
        }
    }
}

#[derive(Serialize)]
struct AdminRow<'a> {
    id: &'a str,
    name: &'a str,
    section_a: String,
    section_b: String,
    total: String,
    percentage: String,
}

#[derive(Serialize)]
struct AdminExam<'a> {
    name: &'a str,
    students: Vec<AdminRow<'a>>,
}

#[derive(Serialize)]
struct SkippedFile {
    file: String,
    reason: String,
}

fn display_percentage(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{:.2}%", s))
}

/// Build the application router around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/logout", get(login::handle_logout))
        .route("/admin", get(serve_admin))
        .route("/admin/export.csv", get(export_csv))
        .route("/admin/export.xlsx", get(export_xlsx))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login::require_auth,
        ));

    Router::new()
        .route("/", get(serve_index).post(lookup_results))
        .route(
            "/login",
            get(login::serve_login_page).post(login::handle_login),
        )
        .merge(protected)
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = Argon2CredentialStore::from_config(&config)?;
    let address = config.bind_address();
    let state = Arc::new(AppState::new(config, Arc::new(credentials))?);

    let listener = TcpListener::bind(&address).await?;
    log::info!("Listening on http://{}", address);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

async fn serve_index(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    state.render(
        "index",
        &json!({
            "title": "Exam Results",
            "flash": flash,
            "is_authenticated": state.session_user(&jar).is_some(),
        }),
    )
}

async fn lookup_results(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LookupForm>,
) -> Result<Response, AppError> {
    let student_id = match StudentId::parse(&form.student_id) {
        Ok(student_id) => student_id,
        Err(e) => return Ok(redirect_with("/", FlashKind::Error, &e.to_string()).into_response()),
    };

    let dataset = state.load_dataset().await?;
    let results = lookup_student(&dataset, student_id.as_str());
    if results.is_empty() {
        log::debug!("no completed results for {}", student_id);
        return Ok(redirect_with(
            "/",
            FlashKind::Error,
            "No results found for this Student ID.",
        )
        .into_response());
    }

    let rows: Vec<ResultRow> = results
        .iter()
        .map(|(exam, result)| ResultRow::new(exam, result))
        .collect();

    Ok(state
        .render(
            "results",
            &json!({
                "title": "Your Results",
                "student_id": student_id.as_str(),
                "results": rows,
            }),
        )?
        .into_response())
}

async fn serve_admin(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(username)): Extension<AdminUser>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    let report = state.load_report().await?;

    let exams: Vec<AdminExam> = report
        .dataset
        .exams()
        .map(|(name, records)| AdminExam {
            name,
            students: records
                .iter()
                .map(|(id, record)| AdminRow {
                    id,
                    name: &record.name,
                    section_a: format_score(record.section_a),
                    section_b: format_score(record.section_b),
                    total: format_score(record.total),
                    percentage: display_percentage(record.total),
                })
                .collect(),
        })
        .collect();

    let skipped: Vec<SkippedFile> = report
        .failures
        .iter()
        .map(|failure| SkippedFile {
            file: failure
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| failure.path.display().to_string()),
            reason: failure.error.to_string(),
        })
        .collect();

    state.render(
        "admin",
        &json!({
            "title": "All Results",
            "flash": flash,
            "username": username,
            "exams": exams,
            "skipped": skipped,
            "record_count": report.dataset.record_count(),
            "generated_at": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }),
    )
}

async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let dataset = state.load_dataset().await?;
    let body = downloader::to_csv(&dataset).into_bytes();

    Ok(attachment(body, "text/csv; charset=utf-8", "csv"))
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let dataset = state.load_dataset().await?;
    let body = downloader::to_xlsx(&dataset)?;

    Ok(attachment(
        body,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ))
}

fn attachment(body: Vec<u8>, content_type: &'static str, extension: &str) -> Response {
    let filename = format!(
        "exam-results-{}.{}",
        Local::now().format("%Y%m%d-%H%M%S"),
        extension
    );

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
