use crate::config::Settings;
use crate::error::ProfileError;
use crate::remote::http;
use crate::session::Credential;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    username: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: AuthUser,
    pub auth: AuthToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl HttpAuthClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build auth http client")?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(settings.require_auth_api_base_url()?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ProfileError> {
        let url = http::join_url(&self.base_url, "/auth/login");
        http::post_json(
            &self.http,
            &url,
            &Credential::anonymous(),
            &LoginRequest { email, password },
        )
        .await
    }

    /// Creates the account only; the caller still has to log in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<RegisterResponse, ProfileError> {
        let url = http::join_url(&self.base_url, "/auth/register");
        http::post_json(
            &self.http,
            &url,
            &Credential::anonymous(),
            &RegisterRequest {
                email,
                password,
                username,
            },
        )
        .await
    }
}
