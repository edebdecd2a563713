//! Authenticated session lifecycle.
//!
//! [`SessionManager`] is the single writer of the session. Protected calls go
//! through [`SessionManager::protected`], which attaches the current token and
//! reacts to authentication failures by invalidating the session once.
//!
//! Every session change bumps an epoch counter. A protected call remembers the
//! epoch it started under; if the session changed before its response arrives,
//! the result is discarded so invalidation always wins over late successes.

pub mod store;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::api::{
    AuthToken, Backend, ClientError, ClientResult, Credentials, RegisterRequest, Session, User,
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Lifecycle notifications for the host (CLI or UI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
    /// The backend rejected the session; the host must return to sign-in.
    Expired,
}

/// Input of the registration form.
#[derive(Debug, Clone)]
pub struct RegistrationProfile {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationProfile {
    /// Local checks performed before any network call.
    pub fn validate(&self) -> ClientResult<()> {
        if self.name.trim().is_empty() {
            return Err(ClientError::Validation("Name is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(ClientError::Validation("Email is required".to_string()));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::Validation(
                "Passwords do not match".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct SessionState {
    session: Option<Session>,
    epoch: u64,
}

pub struct SessionManager {
    backend: Arc<dyn Backend>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            backend,
            state: Mutex::new(SessionState::default()),
            events,
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn authenticate(&self, credentials: Credentials) -> ClientResult<Session> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ClientError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let epoch = self.epoch().await;
        let session: Session = self.backend.login(&credentials).await?.into();
        self.install(session.clone(), Some(epoch)).await?;
        info!("Signed in as {}", session.user.email);
        Ok(session)
    }

    /// Create an account and sign in with it.
    pub async fn register(&self, profile: RegistrationProfile) -> ClientResult<Session> {
        profile.validate()?;

        let epoch = self.epoch().await;
        let request = RegisterRequest {
            name: profile.name.trim().to_string(),
            email: profile.email.trim().to_string(),
            password: profile.password,
        };
        let created = self.backend.register(&request).await?;
        info!("Account {} created", created.email);

        let session = match created.access_token {
            Some(token) => Session {
                token: AuthToken::new(token),
                user: User {
                    id: created.id_user,
                    name: created.name,
                    email: created.email,
                },
            },
            None => self
                .backend
                .login(&Credentials {
                    email: request.email,
                    password: request.password,
                })
                .await?
                .into(),
        };

        self.install(session.clone(), Some(epoch)).await?;
        Ok(session)
    }

    /// Adopt a session obtained earlier, e.g. restored from disk.
    pub async fn restore(&self, session: Session) {
        debug!("Restoring session for {}", session.user.email);
        let _ = self.install(session, None).await;
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.state.lock().await.session.clone()
    }

    /// Counter bumped on every session change. Data fetched under one epoch
    /// belongs to that session only.
    pub async fn epoch(&self) -> u64 {
        self.state.lock().await.epoch
    }

    /// Clear the session. Returns false when there was nothing to clear.
    ///
    /// Sign-ins still in flight are discarded either way.
    pub async fn invalidate(&self) -> bool {
        let mut state = self.state.lock().await;
        if self.clear(&mut state, SessionEvent::SignedOut) {
            return true;
        }
        state.epoch += 1;
        false
    }

    /// Run a protected call with the current token.
    ///
    /// Fails with `NotAuthenticated` without calling `op` when no session
    /// exists. An `Auth` failure invalidates the session if it is still the
    /// one the call started with.
    pub async fn protected<T, F, Fut>(&self, op: F) -> ClientResult<T>
    where
        F: FnOnce(AuthToken) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let (token, epoch) = {
            let state = self.state.lock().await;
            match &state.session {
                Some(session) => (session.token.clone(), state.epoch),
                None => return Err(ClientError::NotAuthenticated),
            }
        };

        let result = op(token).await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("Discarding response from a superseded session");
            return Err(ClientError::SessionInvalidated);
        }

        if let Err(err) = &result {
            if err.is_auth_failure() {
                warn!("Session rejected by server: {}", err);
                self.clear(&mut state, SessionEvent::Expired);
            }
        }
        result
    }

    /// Install `session`. With `since`, the install is refused if the session
    /// changed after that epoch was read.
    async fn install(&self, session: Session, since: Option<u64>) -> ClientResult<()> {
        let user = session.user.clone();
        {
            let mut state = self.state.lock().await;
            if matches!(since, Some(epoch) if epoch != state.epoch) {
                debug!("Discarding sign-in for {}: session changed", user.email);
                return Err(ClientError::SessionInvalidated);
            }
            state.session = Some(session);
            state.epoch += 1;
        }
        let _ = self.events.send(SessionEvent::SignedIn(user));
        Ok(())
    }

    fn clear(&self, state: &mut SessionState, event: SessionEvent) -> bool {
        if state.session.take().is_none() {
            return false;
        }
        state.epoch += 1;
        info!("Session cleared ({:?})", event);
        let _ = self.events.send(event);
        true
    }
}
