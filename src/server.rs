//! Web app: upload a PDF, listen to it, download the audio.
//!
//! One page with an upload form. A successful conversion is kept for the
//! browser session that asked for it (a `pdf2audio_session` cookie) so the
//! page can offer an inline player and a download link; any failed conversion
//! empties that session's slot. Scripts can skip the page and
//! `POST /api/convert` instead, which answers with the audio itself.
//!
//! ## Routes
//!
//! | Method | Path           | Purpose                                      |
//! |--------|----------------|----------------------------------------------|
//! | GET    | `/`            | form, plus player when audio is held         |
//! | POST   | `/convert`     | multipart form submit, re-renders the page   |
//! | GET    | `/audio`       | held audio, inline                           |
//! | GET    | `/download`    | held audio as an attachment                  |
//! | POST   | `/api/convert` | multipart in, audio out, JSON errors         |
//! | GET    | `/health`      | liveness                                     |

use crate::config::{ConversionConfig, SynthesisBackend};
use crate::convert::convert_from_bytes;
use crate::error::Pdf2AudioError;
use crate::output::{AudioFormat, AudioOutput, ConversionStats};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default upload limit: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const MISSING_FILE: &str = "Please upload a PDF file first.";
const NO_TEXT: &str = "Could not find any text in the selected PDF file.";
const SUCCESS: &str = "Audiobook generated successfully!";

/// Cookie naming the browser session a result belongs to.
pub const SESSION_COOKIE: &str = "pdf2audio_session";

/// Sessions whose audio is kept; the oldest is dropped beyond this.
const MAX_HELD_SESSIONS: usize = 32;

/// Web server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub max_upload_bytes: usize,
    /// Conversion settings used when a form leaves a field empty.
    pub defaults: ConversionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            defaults: ConversionConfig::default(),
        }
    }
}

/// A finished conversion kept for playback and download.
#[derive(Debug, Clone)]
pub struct HeldAudio {
    pub audio: Bytes,
    pub file_name: String,
    pub format: AudioFormat,
    pub stats: ConversionStats,
}

impl HeldAudio {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

impl From<AudioOutput> for HeldAudio {
    fn from(output: AudioOutput) -> Self {
        Self {
            audio: Bytes::from(output.audio),
            file_name: output.file_name,
            format: output.format,
            stats: output.stats,
        }
    }
}

/// One slot per session, oldest first.
#[derive(Default)]
struct Sessions {
    held: HashMap<String, Arc<HeldAudio>>,
    order: VecDeque<String>,
}

impl Sessions {
    fn hold(&mut self, session: &str, audio: HeldAudio) {
        self.order.retain(|s| s != session);
        self.order.push_back(session.to_string());
        self.held.insert(session.to_string(), Arc::new(audio));
        while self.order.len() > MAX_HELD_SESSIONS {
            if let Some(oldest) = self.order.pop_front() {
                debug!("Dropping audio held for session {}", oldest);
                self.held.remove(&oldest);
            }
        }
    }

    fn release(&mut self, session: &str) {
        self.order.retain(|s| s != session);
        self.held.remove(session);
    }
}

/// Shared state behind every handler.
pub struct AppState {
    defaults: ConversionConfig,
    max_upload_bytes: usize,
    sessions: RwLock<Sessions>,
}

impl AppState {
    pub fn new(defaults: ConversionConfig, max_upload_bytes: usize) -> Self {
        Self {
            defaults,
            max_upload_bytes,
            sessions: RwLock::new(Sessions::default()),
        }
    }

    /// The audio a session is currently offered for playback, if any.
    pub async fn latest(&self, session: &str) -> Option<Arc<HeldAudio>> {
        self.sessions.read().await.held.get(session).cloned()
    }

    /// Number of sessions holding audio.
    pub async fn held_sessions(&self) -> usize {
        self.sessions.read().await.held.len()
    }

    async fn hold(&self, session: &str, audio: HeldAudio) {
        self.sessions.write().await.hold(session, audio);
    }

    async fn release(&self, session: &str) {
        self.sessions.write().await.release(session);
    }
}

/// Session id from the request cookies. Values that are not UUIDs are ignored.
fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/convert", post(convert_form_handler))
        .route("/audio", get(audio_handler))
        .route("/download", get(download_handler))
        .route("/api/convert", post(api_convert_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), Pdf2AudioError> {
    let state = Arc::new(AppState::new(config.defaults, config.max_upload_bytes));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .map_err(|e| {
            Pdf2AudioError::Internal(format!("Cannot listen on {}: {e}", config.listen))
        })?;
    info!("Web app listening on http://{}/", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Pdf2AudioError::Internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ── Form handling ────────────────────────────────────────────────────────

/// Fields of an upload, as sent by the page or by `curl -F`.
#[derive(Debug, Default)]
struct ConvertForm {
    file: Option<(String, Vec<u8>)>,
    backend: Option<String>,
    language: Option<String>,
    rate: Option<String>,
    volume: Option<String>,
    slow: Option<bool>,
}

impl ConvertForm {
    async fn read(mut multipart: Multipart) -> Result<Self, String> {
        let mut form = ConvertForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| format!("Malformed upload: {e}"))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Malformed upload: {e}"))?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    let file_name = if file_name.is_empty() {
                        "upload.pdf".to_string()
                    } else {
                        file_name
                    };
                    form.file = Some((file_name, bytes.to_vec()));
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| format!("Malformed upload: {e}"))?;
            let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            match name.as_str() {
                "backend" => form.backend = value,
                "language" => form.language = value,
                "rate" => form.rate = value,
                "volume" => form.volume = value,
                // The page sends a hidden "false" ahead of the checkbox; the
                // last value wins.
                "slow" => {
                    if let Some(v) = value {
                        form.slow = Some(v != "false" && v != "0");
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// Server defaults overridden by whatever the form filled in.
    fn to_config(&self, defaults: &ConversionConfig) -> Result<ConversionConfig, Pdf2AudioError> {
        let mut builder = defaults.to_builder();
        if let Some(slow) = self.slow {
            builder = builder.slow(slow);
        }
        if let Some(ref backend) = self.backend {
            builder = builder.backend(backend.parse::<SynthesisBackend>()?);
        }
        if let Some(ref language) = self.language {
            builder = builder.language(language.clone());
        }
        if let Some(ref rate) = self.rate {
            let wpm = rate.parse::<u32>().map_err(|_| {
                Pdf2AudioError::InvalidConfig(format!("Rate '{rate}' is not a whole number"))
            })?;
            builder = builder.rate(wpm);
        }
        if let Some(ref volume) = self.volume {
            let v = volume.parse::<f32>().map_err(|_| {
                Pdf2AudioError::InvalidConfig(format!("Volume '{volume}' is not a number"))
            })?;
            builder = builder.volume(v);
        }
        builder.build()
    }
}

// ── Page handlers ────────────────────────────────────────────────────────

enum Notice {
    Success(&'static str),
    Warning(String),
    Error(String),
}

async fn index_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Html<String> {
    let latest = match session_id(&headers) {
        Some(session) => state.latest(&session).await,
        None => None,
    };
    Html(render_page(&state.defaults, latest.as_deref(), None))
}

async fn convert_form_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let (session, fresh) = match session_id(&headers) {
        Some(session) => (session, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let notice = match ConvertForm::read(multipart).await {
        Err(e) => {
            state.release(&session).await;
            Notice::Error(format!("An unexpected error occurred: {e}"))
        }
        Ok(mut form) => match form.file.take() {
            None => Notice::Warning(MISSING_FILE.to_string()),
            Some((file_name, bytes)) => {
                let result = match form.to_config(&state.defaults) {
                    Ok(config) => convert_from_bytes(bytes, &file_name, &config).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(output) => {
                        state.hold(&session, HeldAudio::from(output)).await;
                        Notice::Success(SUCCESS)
                    }
                    Err(e) if e.is_no_text() => {
                        state.release(&session).await;
                        Notice::Warning(NO_TEXT.to_string())
                    }
                    Err(e) => {
                        warn!("Conversion of '{}' failed: {}", file_name, e);
                        state.release(&session).await;
                        Notice::Error(format!("An unexpected error occurred: {e}"))
                    }
                }
            }
        },
    };

    let latest = state.latest(&session).await;
    let mut response =
        Html(render_page(&state.defaults, latest.as_deref(), Some(&notice))).into_response();
    if fresh {
        let cookie = format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

async fn audio_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    held_audio_response(&state, &headers, false).await
}

async fn download_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    held_audio_response(&state, &headers, true).await
}

async fn held_audio_response(state: &AppState, headers: &HeaderMap, attachment: bool) -> Response {
    let held = match session_id(headers) {
        Some(session) => state.latest(&session).await,
        None => None,
    };
    match held {
        Some(held) => audio_response(&held, attachment),
        None => (StatusCode::NOT_FOUND, "No audio has been generated yet").into_response(),
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.defaults.backend.as_str(),
        "sessions_holding_audio": state.held_sessions().await,
    }))
}

// ── API ──────────────────────────────────────────────────────────────────

async fn api_convert_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    let mut form = match ConvertForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, "input", &e),
    };
    let Some((file_name, bytes)) = form.file.take() else {
        return api_error(StatusCode::BAD_REQUEST, "input", MISSING_FILE);
    };

    let config = match form.to_config(&state.defaults) {
        Ok(c) => c,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, "input", &e.to_string()),
    };

    match convert_from_bytes(bytes, &file_name, &config).await {
        Ok(output) => audio_response(&HeldAudio::from(output), true),
        Err(e) => {
            let (status, kind) = api_status(&e);
            if status.is_server_error() {
                warn!("API conversion of '{}' failed: {}", file_name, e);
            }
            api_error(status, kind, &e.to_string())
        }
    }
}

/// HTTP status and short error kind for a failed conversion.
fn api_status(e: &Pdf2AudioError) -> (StatusCode, &'static str) {
    if e.is_no_text() {
        (StatusCode::UNPROCESSABLE_ENTITY, "no_text")
    } else if matches!(e, Pdf2AudioError::InvalidConfig(_)) {
        (StatusCode::BAD_REQUEST, "input")
    } else if e.is_input_error() {
        (StatusCode::UNPROCESSABLE_ENTITY, "input")
    } else if e.is_backend_error() {
        (StatusCode::BAD_GATEWAY, "backend")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
    }
}

fn api_error(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, Json(json!({ "error": message, "kind": kind }))).into_response()
}

// ── Rendering ────────────────────────────────────────────────────────────

fn audio_response(held: &HeldAudio, attachment: bool) -> Response {
    let content_type = HeaderValue::from_static(held.mime_type());
    let disposition = content_disposition(&held.file_name, attachment);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        held.audio.clone(),
    )
        .into_response()
}

/// `attachment; filename="..."` with an RFC 5987 UTF-8 variant for names
/// that are not plain ASCII.
fn content_disposition(file_name: &str, attachment: bool) -> HeaderValue {
    let kind = if attachment { "attachment" } else { "inline" };
    let ascii: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut value = format!("{kind}; filename=\"{ascii}\"");
    if ascii != file_name {
        value.push_str("; filename*=UTF-8''");
        value.push_str(&urlencoding::encode(file_name));
    }
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn notice_paragraph(class: &str, msg: &str) -> String {
    format!("<p class=\"notice {class}\">{}</p>", html_escape(msg))
}

fn render_page(
    defaults: &ConversionConfig,
    latest: Option<&HeldAudio>,
    notice: Option<&Notice>,
) -> String {
    let notice_html = match notice {
        None => String::new(),
        Some(Notice::Success(msg)) => notice_paragraph("success", msg),
        Some(Notice::Warning(msg)) => notice_paragraph("warning", msg),
        Some(Notice::Error(msg)) => notice_paragraph("error", msg),
    };

    let player_html = match latest {
        None => String::new(),
        Some(output) => format!(
            "<section>\n<h2>Your Audiobook is Ready!</h2>\n\
             <audio controls src=\"/audio\" type=\"{mime}\"></audio>\n\
             <p><a class=\"button\" href=\"/download\" download=\"{name}\">Download {ext}</a></p>\n\
             <p class=\"meta\">{pages} pages, {chars} characters, {backend}</p>\n</section>",
            mime = output.mime_type(),
            name = html_escape(&output.file_name),
            ext = output.format.extension().to_ascii_uppercase(),
            pages = output.stats.extracted_pages,
            chars = output.stats.text_chars,
            backend = html_escape(&output.stats.backend),
        ),
    };

    let selected = |b: SynthesisBackend| if defaults.backend == b { " selected" } else { "" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>PDF to Audiobook</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
fieldset {{ display: grid; gap: .5rem; }}
.notice {{ padding: .5rem 1rem; border-radius: 4px; }}
.success {{ background: #e6f4ea; }}
.warning {{ background: #fef7e0; }}
.error {{ background: #fce8e6; }}
audio {{ width: 100%; }}
.meta {{ color: #666; font-size: .9rem; }}
</style>
</head>
<body>
<h1>PDF to Audiobook Converter</h1>
<p>Upload your PDF and click "Generate Audiobook" to listen or download.</p>
<form method="post" action="/convert" enctype="multipart/form-data">
<fieldset>
<label>PDF file <input type="file" name="file" accept="application/pdf,.pdf"></label>
<label>Voice <select name="backend">
<option value="cloud"{cloud_sel}>Cloud (Google, MP3)</option>
<option value="local"{local_sel}>Local engine (WAV)</option>
</select></label>
<label>Language <input type="text" name="language" value="{language}" size="8"></label>
<input type="hidden" name="slow" value="false">
<label><input type="checkbox" name="slow" value="true"{slow_checked}> Slow (cloud)</label>
<label>Rate, words per minute (local)
<input type="number" name="rate" value="{rate}" min="80" max="450"></label>
<label>Volume (local)
<input type="number" name="volume" value="{volume}" min="0" max="1" step="0.05"></label>
<button type="submit">Generate Audiobook</button>
</fieldset>
</form>
{notice_html}
{player_html}
</body>
</html>
"#,
        cloud_sel = selected(SynthesisBackend::Cloud),
        local_sel = selected(SynthesisBackend::Local),
        language = html_escape(&defaults.language),
        slow_checked = if defaults.slow { " checked" } else { "" },
        rate = defaults.rate,
        volume = defaults.volume,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "unit-boundary";

    fn held(file_name: &str) -> HeldAudio {
        HeldAudio {
            audio: Bytes::from_static(b"ID3"),
            file_name: file_name.to_string(),
            format: AudioFormat::Mp3,
            stats: ConversionStats::default(),
        }
    }

    fn with_cookie(
        builder: axum::http::request::Builder,
        session: Option<&str>,
    ) -> axum::http::request::Builder {
        match session {
            Some(id) => {
                builder.header(header::COOKIE, format!("theme=dark; {SESSION_COOKIE}={id}"))
            }
            None => builder,
        }
    }

    fn upload(session: Option<&str>, file: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"notes.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let builder = Request::builder()
            .method("POST")
            .uri("/convert")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        with_cookie(builder, session).body(Body::from(body)).unwrap()
    }

    fn get(uri: &str, session: Option<&str>) -> Request<Body> {
        with_cookie(Request::builder().uri(uri), session)
            .body(Body::empty())
            .unwrap()
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(ConversionConfig::default(), 1024 * 1024))
    }

    #[tokio::test]
    async fn failed_upload_releases_held_audio() {
        let state = state();
        let session = Uuid::new_v4().to_string();
        state.hold(&session, held("book.mp3")).await;
        assert!(state.latest(&session).await.is_some());

        let response = router(Arc::clone(&state))
            .oneshot(upload(Some(&session), b"not a pdf"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&html).contains("An unexpected error occurred"));
        assert!(state.latest(&session).await.is_none());
    }

    #[tokio::test]
    async fn held_audio_is_private_to_its_session() {
        let state = state();
        let owner = Uuid::new_v4().to_string();
        state.hold(&owner, held("private.mp3")).await;
        let app = router(Arc::clone(&state));

        let stranger = Uuid::new_v4().to_string();
        for session in [None, Some(stranger.as_str()), Some("not-a-uuid")] {
            let response = app.clone().oneshot(get("/download", session)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{session:?}");
        }

        let response = app.oneshot(get("/download", Some(&owner))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ID3");
    }

    #[tokio::test]
    async fn oldest_sessions_are_dropped() {
        let state = state();
        let ids: Vec<String> = (0..=MAX_HELD_SESSIONS)
            .map(|_| Uuid::new_v4().to_string())
            .collect();
        for id in &ids {
            state.hold(id, held("a.mp3")).await;
        }
        assert_eq!(state.held_sessions().await, MAX_HELD_SESSIONS);
        assert!(state.latest(&ids[0]).await.is_none());
        assert!(state.latest(&ids[MAX_HELD_SESSIONS]).await.is_some());
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let id = Uuid::new_v4().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("a=1; {SESSION_COOKIE}={id}; b=2")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));

        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}=../../etc")).unwrap(),
        );
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn form_can_turn_slow_off() {
        let defaults = ConversionConfig::builder().slow(true).build().unwrap();

        let unset = ConvertForm::default();
        assert!(unset.to_config(&defaults).unwrap().slow);

        let off = ConvertForm {
            slow: Some(false),
            ..Default::default()
        };
        assert!(!off.to_config(&defaults).unwrap().slow);

        let on = ConvertForm {
            slow: Some(true),
            ..Default::default()
        };
        assert!(on.to_config(&ConversionConfig::default()).unwrap().slow);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn disposition_for_ascii_and_unicode_names() {
        assert_eq!(
            content_disposition("book.mp3", true),
            "attachment; filename=\"book.mp3\""
        );
        let v = content_disposition("résumé.mp3", true);
        let v = v.to_str().unwrap();
        assert!(v.starts_with("attachment; filename=\"r_sum_.mp3\""));
        assert!(v.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9.mp3"));
        assert!(content_disposition("a.wav", false).to_str().unwrap().starts_with("inline"));
    }

    #[test]
    fn error_statuses() {
        let no_text = Pdf2AudioError::NoExtractableText {
            source_name: "x.pdf".into(),
        };
        assert_eq!(api_status(&no_text).0, StatusCode::UNPROCESSABLE_ENTITY);
        let bad = Pdf2AudioError::InvalidConfig("nope".into());
        assert_eq!(api_status(&bad).0, StatusCode::BAD_REQUEST);
        let not_pdf = Pdf2AudioError::NotAPdf {
            source_name: "x".into(),
            magic: vec![],
        };
        assert_eq!(api_status(&not_pdf).0, StatusCode::UNPROCESSABLE_ENTITY);
        let down = Pdf2AudioError::BackendUnavailable {
            backend: "google-tts".into(),
            detail: "dns".into(),
        };
        assert_eq!(api_status(&down).0, StatusCode::BAD_GATEWAY);
        let internal = Pdf2AudioError::Internal("x".into());
        assert_eq!(api_status(&internal).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn form_overrides_defaults() {
        let form = ConvertForm {
            backend: Some("local".into()),
            language: Some("fr".into()),
            rate: Some("500".into()),
            volume: Some("0.5".into()),
            ..Default::default()
        };
        let config = form.to_config(&ConversionConfig::default()).unwrap();
        assert_eq!(config.backend, SynthesisBackend::Local);
        assert_eq!(config.language, "fr");
        // Clamped by the builder.
        assert_eq!(config.rate, crate::config::RATE_RANGE_WPM.1);
        assert_eq!(config.volume, 0.5);
    }

    #[test]
    fn unparsable_form_values_are_config_errors() {
        let form = ConvertForm {
            rate: Some("fast".into()),
            ..Default::default()
        };
        assert!(matches!(
            form.to_config(&ConversionConfig::default()),
            Err(Pdf2AudioError::InvalidConfig(_))
        ));
    }

    #[test]
    fn page_shows_player_only_with_audio() {
        let defaults = ConversionConfig::default();
        let empty = render_page(&defaults, None, None);
        assert!(!empty.contains("<audio"));

        let page = render_page(&defaults, Some(&held("book.mp3")), Some(&Notice::Success(SUCCESS)));
        assert!(page.contains("<audio controls src=\"/audio\""));
        assert!(page.contains("download=\"book.mp3\""));
        assert!(page.contains(SUCCESS));
    }
}
