//! Command line front end.
//!
//! Each invocation restores the stored session, runs one command and then
//! mirrors session changes back to disk.

pub mod args;
pub mod auth;
pub mod jobs;
pub mod upload;

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ClientError, ClientResult, Session};
use crate::client::MeetvocalClient;
use crate::config::Config;
use crate::global;
use crate::notice::{NoticeBoard, NoticeLevel};
use crate::session::{store, SessionEvent};

pub use args::{
    Cli, CliCommand, DownloadCliArgs, LoginCliArgs, RegisterCliArgs, ReportCliArgs,
    UploadCliArgs,
};
pub use auth::{
    handle_login_command, handle_logout_command, handle_register_command, handle_whoami_command,
};
pub use jobs::{handle_download_command, handle_jobs_command, handle_report_command};
pub use upload::handle_upload_command;

pub struct CliContext {
    client: MeetvocalClient,
    session_path: PathBuf,
    events: broadcast::Receiver<SessionEvent>,
    notices: NoticeBoard,
    cancel: CancellationToken,
}

impl CliContext {
    pub async fn open(api_url: Option<String>) -> Result<Self> {
        let config = Config::load()?.with_api_url(api_url);
        let client = MeetvocalClient::from_config(config)?;
        let session_path = global::session_file()?;

        if let Some(session) = store::load(&session_path)? {
            client.session().restore(session).await;
        }

        let events = client.session().subscribe();
        let notices = client.notice_board();

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted, cancelling");
                on_interrupt.cancel();
            }
        });

        Ok(Self {
            client,
            session_path,
            events,
            notices,
            cancel,
        })
    }

    pub fn client(&self) -> &MeetvocalClient {
        &self.client
    }

    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn notices(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    pub async fn require_session(&self) -> Result<Session> {
        match self.client.session().current_session().await {
            Some(session) => Ok(session),
            None => bail!("Not signed in. Run `meetvocal login` first."),
        }
    }

    /// Convert a client result for display.
    pub fn check<T>(&self, result: ClientResult<T>) -> Result<T> {
        result.map_err(to_anyhow)
    }

    /// Mirror session changes to disk and print pending notices. Runs after
    /// every command, including failed ones.
    pub async fn finish(mut self) -> Result<()> {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::SignedIn(user)) => {
                    debug!("Persisting session for {}", user.email);
                    if let Some(session) = self.client.session().current_session().await {
                        store::save(&self.session_path, &session)?;
                    }
                }
                Ok(SessionEvent::SignedOut) => store::clear(&self.session_path)?,
                Ok(SessionEvent::Expired) => {
                    store::clear(&self.session_path)?;
                    self.notices
                        .info("Your session has ended. Run `meetvocal login` to sign in again.");
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Missed {} session event(s)", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        for notice in self.notices.active() {
            match notice.level {
                NoticeLevel::Error => eprintln!("✗ {}", notice.text),
                NoticeLevel::Success => eprintln!("✓ {}", notice.text),
                NoticeLevel::Info => eprintln!("{}", notice.text),
            }
        }
        Ok(())
    }
}

pub async fn handle_health_command(api_url: Option<String>) -> Result<()> {
    let config = Config::load()?.with_api_url(api_url);
    let client = MeetvocalClient::from_config(config)?;
    let health = client
        .health(&CancellationToken::new())
        .await
        .map_err(to_anyhow)?;

    println!("Backend: {}", client.config().api.base_url);
    println!("Status: {}", health.status);
    if let Some(database) = health.database {
        println!("Database: {}", database);
    }
    Ok(())
}

fn to_anyhow(err: ClientError) -> anyhow::Error {
    let message = err.user_message();
    if message == err.to_string() {
        anyhow!(err)
    } else {
        anyhow!(err).context(message)
    }
}
