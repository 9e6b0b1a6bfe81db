// src/client/mod.rs

//! Typed client for the listing API.
//!
//! Mirrors what the browser application does: session state, search with
//! query-string state, the listing form and concurrent image uploads. It
//! shares models and validation rules with the server.

pub mod api;
pub mod form;
pub mod search;
pub mod session;
pub mod upload;

use std::fmt;

pub use api::ApiClient;
pub use form::ListingForm;
pub use search::SearchController;
pub use session::{SessionAction, SessionController, SessionState};
pub use upload::{HttpObjectStore, ImageFile, ObjectStore, UploadProgress, Uploader};

#[derive(Debug)]
pub enum ClientError {
    /// The server answered with its error envelope.
    Api { status: u16, message: String },
    Transport(reqwest::Error),
    Validation(String),
    Upload(String),
}

impl ClientError {
    /// Text suitable for showing to the user.
    pub fn message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Transport(e) => e.to_string(),
            ClientError::Validation(msg) | ClientError::Upload(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Api { status, message } => write!(f, "api error {}: {}", status, message),
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
            ClientError::Validation(msg) => write!(f, "validation error: {}", msg),
            ClientError::Upload(msg) => write!(f, "upload failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(err.to_string())
    }
}
