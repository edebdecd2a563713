//! In-process mock of the transcription backend.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use meetvocal::api::HttpBackend;

pub const PASSWORD: &str = "motdepasse";

type ApiError = (StatusCode, Json<Value>);

#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub title: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
pub struct MockState {
    /// email -> (id, name, password)
    pub users: Mutex<HashMap<String, (i64, String, String)>>,
    pub valid_tokens: Mutex<HashSet<String>>,
    pub jobs: Mutex<Vec<Value>>,
    pub reports: Mutex<HashMap<i64, Value>>,
    pub pdfs: Mutex<HashMap<i64, Vec<u8>>>,
    pub uploads: Mutex<Vec<ReceivedUpload>>,
    /// Authorization header of every protected request, in arrival order.
    pub auth_headers: Mutex<Vec<Option<String>>>,
    pub request_paths: Mutex<Vec<String>>,
}

impl MockState {
    pub fn add_user(&self, email: &str, name: &str) {
        let mut users = self.users.lock().unwrap();
        let id = users.len() as i64 + 1;
        users.insert(
            email.to_string(),
            (id, name.to_string(), PASSWORD.to_string()),
        );
    }

    pub fn add_job(&self, id: i64, title: &str, status: &str) {
        self.jobs.lock().unwrap().push(json!({
            "id_audio": id,
            "title": title,
            "status": status,
            "date_upload": "2024-05-02T09:30:00",
            "duration": 754.2,
            "num_speakers": 3,
        }));
    }

    /// Make every issued token invalid.
    pub fn revoke_tokens(&self) {
        self.valid_tokens.lock().unwrap().clear();
    }

    pub fn protected_requests(&self) -> usize {
        self.auth_headers.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.request_paths.lock().unwrap().clone()
    }

    fn log(&self, path: String) {
        self.request_paths.lock().unwrap().push(path);
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().unwrap().push(value.clone());

        let token = value
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();
        if self.valid_tokens.lock().unwrap().contains(token) {
            Ok(())
        } else {
            Err(detail(StatusCode::UNAUTHORIZED, "Token invalide ou expiré"))
        }
    }
}

pub struct MockServer {
    pub state: Arc<MockState>,
    pub base_url: String,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/fichiers", get(list_jobs))
            .route("/upload", post(upload))
            .route("/fichiers/:id/compte-rendu", get(get_report))
            .route("/fichiers/:id/pdf", get(get_pdf))
            .route("/health", get(health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn backend(&self) -> HttpBackend {
        HttpBackend::new(&self.base_url, Duration::from_secs(5)).unwrap()
    }
}

fn detail(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "detail": message })))
}

async fn register(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.log("/register".to_string());
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    let mut users = state.users.lock().unwrap();
    if users.contains_key(&email) {
        return Err(detail(StatusCode::BAD_REQUEST, "Email déjà utilisé"));
    }
    let id = users.len() as i64 + 1;
    users.insert(email.clone(), (id, name.clone(), password));
    Ok(Json(json!({
        "id_user": id,
        "name": name,
        "email": email,
        "message": "Utilisateur créé avec succès",
    })))
}

async fn login(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.log("/login".to_string());
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let users = state.users.lock().unwrap();
    match users.get(email) {
        Some((id, name, expected)) if expected == password => {
            let mut tokens = state.valid_tokens.lock().unwrap();
            let token = format!("token-{}-{}", id, tokens.len() + 1);
            tokens.insert(token.clone());
            Ok(Json(json!({
                "access_token": token,
                "token_type": "bearer",
                "user": { "id_user": id, "name": name, "email": email },
            })))
        }
        _ => Err(detail(
            StatusCode::UNAUTHORIZED,
            "Email ou mot de passe incorrect",
        )),
    }
}

async fn list_jobs(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    state.log("/fichiers".to_string());
    state.authorize(&headers)?;
    Ok(Json(Value::Array(state.jobs.lock().unwrap().clone())))
}

async fn upload(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    state.log("/upload".to_string());
    state.authorize(&headers)?;

    let mut title = None;
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| detail(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                title = Some(field.text().await.unwrap_or_default());
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| detail(StatusCode::BAD_REQUEST, &e.to_string()))?;
                file = Some((file_name, content_type, data.len()));
            }
            _ => {}
        }
    }

    let (file_name, content_type, size) =
        file.ok_or_else(|| detail(StatusCode::BAD_REQUEST, "Fichier manquant"))?;
    let title = title.unwrap_or_else(|| file_name.clone());
    state.uploads.lock().unwrap().push(ReceivedUpload {
        title: title.clone(),
        file_name,
        content_type,
        size,
    });

    let mut jobs = state.jobs.lock().unwrap();
    let id = jobs
        .iter()
        .filter_map(|j| j["id_audio"].as_i64())
        .max()
        .unwrap_or(0)
        + 1;
    let job = json!({
        "id_audio": id,
        "title": title,
        "status": "processing",
        "date_upload": "2024-05-03T14:00:00",
    });
    jobs.insert(0, job.clone());
    Ok(Json(job))
}

async fn get_report(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.log(format!("/fichiers/{}/compte-rendu", id));
    state.authorize(&headers)?;
    state
        .reports
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Compte-rendu non trouvé"))
}

async fn get_pdf(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.log(format!("/fichiers/{}/pdf", id));
    state.authorize(&headers)?;
    let bytes = state
        .pdfs
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "PDF non trouvé"))?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}

async fn health(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.log("/health".to_string());
    Json(json!({ "status": "healthy", "database": "connected" }))
}
