// src/client/session.rs

//! Signed-in user state shared by every view.
//!
//! `SessionState` only changes through [`SessionState::apply`], so all
//! transitions are listed in [`SessionAction`].

use super::{ApiClient, ClientError};
use crate::models::user::{CreateUserRequest, LoginRequest, OAuthRequest, UpdateUserRequest, User};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    current_user: Option<User>,
    error: Option<String>,
    loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// A session request is in flight.
    Started,
    /// Registration succeeded; signing in is a separate step.
    SignedUp,
    SignedIn(User),
    ProfileUpdated(User),
    /// Sign-out or account deletion completed.
    SignedOut,
    Failed(String),
}

impl SessionState {
    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::Started => {
                self.loading = true;
            }
            SessionAction::SignedUp => {
                self.error = None;
                self.loading = false;
            }
            SessionAction::SignedIn(user) | SessionAction::ProfileUpdated(user) => {
                self.current_user = Some(user);
                self.error = None;
                self.loading = false;
            }
            SessionAction::SignedOut => {
                self.current_user = None;
                self.error = None;
                self.loading = false;
            }
            SessionAction::Failed(message) => {
                self.error = Some(message);
                self.loading = false;
            }
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

/// Drives the session endpoints and records each outcome in `SessionState`.
pub struct SessionController {
    api: ApiClient,
    state: SessionState,
}

impl SessionController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Registers an account. The user still has to sign in afterwards.
    pub async fn sign_up(&mut self, req: &CreateUserRequest) -> Result<User, ClientError> {
        self.state.apply(SessionAction::Started);
        match self.api.signup(req).await {
            Ok(user) => {
                self.state.apply(SessionAction::SignedUp);
                Ok(user)
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn sign_in(&mut self, req: &LoginRequest) -> Result<(), ClientError> {
        self.state.apply(SessionAction::Started);
        match self.api.signin(req).await {
            Ok(user) => {
                self.state.apply(SessionAction::SignedIn(user));
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn oauth_sign_in(&mut self, req: &OAuthRequest) -> Result<(), ClientError> {
        self.state.apply(SessionAction::Started);
        match self.api.oauth_signin(req).await {
            Ok(user) => {
                self.state.apply(SessionAction::SignedIn(user));
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Sends only the fields present in `req`. An empty request is not sent.
    pub async fn update_profile(&mut self, req: &UpdateUserRequest) -> Result<(), ClientError> {
        let id = self.signed_in_id()?;
        if req.is_empty() {
            return Ok(());
        }
        self.state.apply(SessionAction::Started);
        match self.api.update_user(id, req).await {
            Ok(user) => {
                self.state.apply(SessionAction::ProfileUpdated(user));
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn delete_account(&mut self) -> Result<(), ClientError> {
        let id = self.signed_in_id()?;
        self.state.apply(SessionAction::Started);
        match self.api.delete_user(id).await {
            Ok(_) => {
                self.state.apply(SessionAction::SignedOut);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.state.apply(SessionAction::Started);
        match self.api.signout().await {
            Ok(_) => {
                self.state.apply(SessionAction::SignedOut);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    fn signed_in_id(&self) -> Result<i64, ClientError> {
        self.state
            .current_user()
            .map(|u| u.id)
            .ok_or_else(|| ClientError::Validation("You are not signed in".to_string()))
    }

    fn fail<T>(&mut self, err: ClientError) -> Result<T, ClientError> {
        self.state.apply(SessionAction::Failed(err.message()));
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: String::new(),
            avatar: String::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn sign_in_clears_previous_error() {
        let mut state = SessionState::default();
        state.apply(SessionAction::Started);
        assert!(state.is_loading());
        state.apply(SessionAction::Failed("Wrong credentials".into()));
        assert_eq!(state.error(), Some("Wrong credentials"));
        assert!(!state.is_loading());

        state.apply(SessionAction::Started);
        state.apply(SessionAction::SignedIn(user()));
        assert!(state.is_signed_in());
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn failure_keeps_current_user() {
        let mut state = SessionState::default();
        state.apply(SessionAction::SignedIn(user()));
        state.apply(SessionAction::Failed("Username taken".into()));
        assert!(state.is_signed_in());
    }

    #[test]
    fn sign_out_drops_user() {
        let mut state = SessionState::default();
        state.apply(SessionAction::SignedIn(user()));
        state.apply(SessionAction::SignedOut);
        assert_eq!(state, SessionState::default());
    }

    #[tokio::test]
    async fn empty_profile_update_sends_nothing() {
        // Nothing listens on this port, so any request would fail.
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut session = SessionController::new(api);
        let signed_in = user();
        session.state.apply(SessionAction::SignedIn(signed_in.clone()));

        session
            .update_profile(&UpdateUserRequest::default())
            .await
            .unwrap();
        assert_eq!(session.state().current_user(), Some(&signed_in));
        assert!(session.state().error().is_none());

        let err = session
            .update_profile(&UpdateUserRequest {
                avatar: Some("https://photos.example.com/a.png".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(session.state().error().is_some());
    }
}
