// src/client/api.rs

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::ClientError;
use crate::models::{
    listing::{Listing, ListingInput},
    search::SearchParams,
    user::{CreateUserRequest, LoginRequest, OAuthRequest, UpdateUserRequest, User},
};

/// Failure body sent by the server.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: String,
}

/// Acknowledgement returned by sign-out and delete endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

/// HTTP client for the listing API. Keeps the session cookie between calls.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .map(|e| e.message)
            .unwrap_or_else(|_| fallback_message(status));
        tracing::debug!(%status, %message, "api call failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn signup(&self, req: &CreateUserRequest) -> Result<User, ClientError> {
        let resp = self.http.post(self.url("/auth/signup")).json(req).send().await?;
        Self::decode(resp).await
    }

    pub async fn signin(&self, req: &LoginRequest) -> Result<User, ClientError> {
        let resp = self.http.post(self.url("/auth/signin")).json(req).send().await?;
        Self::decode(resp).await
    }

    pub async fn oauth_signin(&self, req: &OAuthRequest) -> Result<User, ClientError> {
        let resp = self.http.post(self.url("/auth/google")).json(req).send().await?;
        Self::decode(resp).await
    }

    pub async fn signout(&self) -> Result<Ack, ClientError> {
        let resp = self.http.get(self.url("/auth/signout")).send().await?;
        Self::decode(resp).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ClientError> {
        let resp = self.http.get(self.url(&format!("/user/{id}"))).send().await?;
        Self::decode(resp).await
    }

    pub async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<User, ClientError> {
        let resp = self
            .http
            .post(self.url(&format!("/user/update/{id}")))
            .json(req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<Ack, ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/user/delete/{id}")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn user_listings(&self, id: i64) -> Result<Vec<Listing>, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/user/listings/{id}")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn create_listing(&self, input: &ListingInput) -> Result<Listing, ClientError> {
        let resp = self
            .http
            .post(self.url("/listing/create"))
            .json(input)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn update_listing(&self, id: i64, input: &ListingInput) -> Result<Listing, ClientError> {
        let resp = self
            .http
            .post(self.url(&format!("/listing/update/{id}")))
            .json(input)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn delete_listing(&self, id: i64) -> Result<Ack, ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/listing/delete/{id}")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn get_listing(&self, id: i64) -> Result<Listing, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/listing/get/{id}")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>, ClientError> {
        let url = format!("{}?{}", self.url("/listing/get"), params.to_query_string());
        let resp = self.http.get(url).send().await?;
        Self::decode(resp).await
    }
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}
