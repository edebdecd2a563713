//! End-to-end client flows over HTTP against the in-process mock server.

mod common;

use common::{MockServer, PASSWORD};
use meetvocal::api::{ClientError, Credentials};
use meetvocal::client::MeetvocalClient;
use meetvocal::config::Config;
use meetvocal::download::DirectorySink;
use meetvocal::jobs::JobStatus;
use meetvocal::session::{RegistrationProfile, SessionEvent};
use meetvocal::upload::UploadEvent;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn client_for(server: &MockServer) -> MeetvocalClient {
    let mut config = Config::default();
    config.api.base_url = server.base_url.clone();
    config.upload.refresh_delay_ms = 50;
    MeetvocalClient::new(config, Arc::new(server.backend()))
}

async fn signed_in_client(server: &MockServer) -> MeetvocalClient {
    server.state.add_user("ada@example.com", "Ada");
    let client = client_for(server).await;
    client
        .session()
        .authenticate(Credentials {
            email: "ada@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_upload_reports_progress_and_refresh_shows_processing_job() {
    let server = MockServer::start().await;
    let client = signed_in_client(&server).await;
    server.state.add_job(1, "Older meeting", "completed");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meeting.mp3");
    std::fs::write(&path, vec![0u8; 256 * 1024]).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = client
        .upload_file(&path, "Weekly sync", &tx, &CancellationToken::new())
        .await
        .unwrap();
    drop(tx);

    let mut percents = Vec::new();
    let mut succeeded = false;
    while let Some(event) = rx.recv().await {
        match event {
            UploadEvent::Progress { percent, .. } => percents.push(percent),
            UploadEvent::Succeeded(job) => {
                assert_eq!(job.id, outcome.job.id);
                succeeded = true;
            }
            UploadEvent::Failed { message, .. } => panic!("upload failed: {}", message),
        }
    }
    assert!(succeeded);
    assert_eq!(percents.first(), Some(&0));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));

    let jobs = outcome.refresh.join().await.unwrap().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, outcome.job.id);
    assert_eq!(jobs[0].title, "Weekly sync");
    assert_eq!(jobs[0].status().unwrap(), JobStatus::Processing);

    let uploads = server.state.uploads.lock().unwrap().clone();
    assert_eq!(uploads[0].file_name, "meeting.mp3");
    assert_eq!(uploads[0].size, 256 * 1024);
}

#[tokio::test]
async fn test_unsupported_file_is_rejected_without_network() {
    let server = MockServer::start().await;
    let client = signed_in_client(&server).await;
    let before = server.state.paths().len();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not audio").unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = client
        .upload_file(&path, "Notes", &tx, &CancellationToken::new())
        .await
        .err()
        .unwrap();
    match err {
        ClientError::Validation(message) => assert!(message.contains("mp3")),
        other => panic!("expected Validation, got {:?}", other),
    }
    assert_eq!(server.state.paths().len(), before);
}

#[tokio::test]
async fn test_rejected_token_clears_session_once() {
    let server = MockServer::start().await;
    let client = signed_in_client(&server).await;
    let mut events = client.session().subscribe();
    server.state.revoke_tokens();

    let err = client
        .jobs()
        .refresh(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());
    assert!(client.session().current_session().await.is_none());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);

    let requests = server.state.protected_requests();
    let err = client
        .reports()
        .open(1, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
    assert_eq!(server.state.protected_requests(), requests);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_report_renders_only_present_sections() {
    let server = MockServer::start().await;
    let client = signed_in_client(&server).await;
    server.state.reports.lock().unwrap().insert(
        3,
        json!({
            "titre": "Comité de direction",
            "date": "2024-05-02 09:30:00",
            "duree_minutes": 42.0,
            "nombre_participants": 4,
            "resume_general": "Voici le compte-rendu.\n# RÉSUMÉ EXÉCUTIF\nLe budget est validé.\n\n# DÉCISIONS PRISES\n- Recruter deux personnes\n",
            "transcription_complete": [],
        }),
    );

    let view = client
        .reports()
        .open(3, &CancellationToken::new())
        .await
        .unwrap();
    let blocks = view.blocks();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].heading, "Résumé Exécutif");
    assert_eq!(blocks[0].body, "Le budget est validé.");
    assert_eq!(blocks[1].heading, "Décisions Prises");
    assert_eq!(blocks[1].body, "- Recruter deux personnes");

    let text = view.render();
    assert!(!text.contains("Contexte et Objectif"));
    assert!(!text.contains("Voici le compte-rendu"));
}

#[tokio::test]
async fn test_report_with_null_summary_opens_without_sections() {
    let server = MockServer::start().await;
    let client = signed_in_client(&server).await;
    server.state.reports.lock().unwrap().insert(
        9,
        json!({
            "titre": "Point rapide",
            "date": "2024-05-02T09:30:00",
            "duree_minutes": null,
            "nombre_participants": null,
            "resume_general": null,
            "resumes_par_participant": null,
            "transcription_complete": [
                { "temps": "00:01", "participant": "SPEAKER_00", "texte": null }
            ],
        }),
    );

    let view = client
        .reports()
        .open(9, &CancellationToken::new())
        .await
        .unwrap();
    assert!(view.sections.is_empty());
    assert!(view.blocks().is_empty());
    assert!(view.render().starts_with("Point rapide\n"));
}

#[tokio::test]
async fn test_completed_job_pdf_saved_under_title() {
    let server = MockServer::start().await;
    let client = signed_in_client(&server).await;
    server.state.add_job(7, "Board meeting", "completed");
    let payload = b"%PDF-1.7\n\xe2\xe3binary".to_vec();
    server.state.pdfs.lock().unwrap().insert(7, payload.clone());

    let cancel = CancellationToken::new();
    client.jobs().refresh(&cancel).await.unwrap();
    let job = client.jobs().get(7).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());
    let path = client
        .downloads()
        .export(&job, &sink, &cancel)
        .await
        .unwrap();

    assert_eq!(path.file_name().unwrap(), "Board meeting.pdf");
    assert_eq!(std::fs::read(&path).unwrap(), payload);
}

#[tokio::test]
async fn test_register_then_signed_in() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let session = client
        .session()
        .register(RegistrationProfile {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            password: PASSWORD.to_string(),
            confirm_password: PASSWORD.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.user.email, "grace@example.com");
    assert_eq!(server.state.paths(), vec!["/register", "/login"]);

    client.jobs().refresh(&CancellationToken::new()).await.unwrap();
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;
    let health = client.health(&CancellationToken::new()).await.unwrap();
    assert_eq!(health.status, "healthy");
}
