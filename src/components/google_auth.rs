use crate::error::{auth_error, BotResult};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const CALENDAR_EVENTS_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime accepted by Google, in seconds
const ASSERTION_LIFETIME: i64 = 3600;

/// Refresh this many seconds before the access token expires
const EXPIRY_MARGIN: i64 = 60;

/// The fields of a service account key file we need
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Hands out service account access tokens, caching them until shortly
/// before they expire
#[derive(Clone)]
pub struct TokenManager {
    key: Arc<ServiceAccountKey>,
    scopes: String,
    client: Client,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenManager {
    /// Create a token manager from the raw credentials JSON
    pub fn from_credentials(credentials: &str, scopes: &[&str]) -> BotResult<Self> {
        let key: ServiceAccountKey = serde_json::from_str(credentials)
            .map_err(|e| auth_error(&format!("Failed to parse service account credentials: {}", e)))?;

        Ok(Self {
            key: Arc::new(key),
            scopes: scopes.join(" "),
            client: Client::new(),
            cached: Arc::new(Mutex::new(None)),
        })
    }

    /// Service account the tokens are issued for
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Get an access token, requesting a new one when the cached one is stale
    pub async fn get_token(&self) -> BotResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_MARGIN > Utc::now().timestamp() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Sign the assertion that is exchanged for an access token
    fn sign_assertion(&self, now: i64) -> BotResult<String> {
        let aud = self.token_uri();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scopes,
            aud,
            iat: now,
            exp: now + ASSERTION_LIFETIME,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| auth_error(&format!("Invalid service account private key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| auth_error(&format!("Failed to sign token request: {}", e)))
    }

    async fn request_token(&self) -> BotResult<CachedToken> {
        let now = Utc::now().timestamp();
        let assertion = self.sign_assertion(now)?;

        debug!("Requesting access token for {}", self.key.client_email);

        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .client
            .post(self.token_uri())
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to request token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to request token: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        let access_token = body
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| auth_error("Token response missing 'access_token' field"))?
            .to_string();
        let expires_in = body.get("expires_in").and_then(|v| v.as_i64()).unwrap_or(3600);

        Ok(CachedToken {
            access_token,
            expires_at: now + expires_in,
        })
    }

    fn token_uri(&self) -> &str {
        self.key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}
