//! Service-account authentication for Earth Engine.
//!
//! The key arrives base64-encoded in `SERVICE_ACCOUNT`. It is written to a
//! temporary file for the duration of the token exchange; the file is removed
//! when it goes out of scope, on success and on every error path.

use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{DynamicWorldError, Result};

/// Environment variable holding the base64-encoded service-account JSON.
pub const SERVICE_ACCOUNT_ENV: &str = "SERVICE_ACCOUNT";

/// OAuth scope granting Earth Engine access.
pub const EARTH_ENGINE_SCOPE: &str = "https://www.googleapis.com/auth/earthengine";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn credentials_error(message: impl Into<String>) -> DynamicWorldError {
    DynamicWorldError::Credentials(message.into())
}

/// The fields of a Google service-account key file that authentication needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let key: Self = serde_json::from_slice(bytes)
            .map_err(|e| credentials_error(format!("malformed service account JSON: {}", e)))?;

        if let Some(kind) = key.account_type.as_deref() {
            if kind != "service_account" {
                return Err(credentials_error(format!(
                    "expected a service_account key, got {}",
                    kind
                )));
            }
        }
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(credentials_error("client_email and private_key must not be empty"));
        }
        Ok(key)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }
}

/// Decode the base64 payload of `SERVICE_ACCOUNT` into raw key JSON.
pub fn decode_service_account(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.split_whitespace().collect();
    if compact.is_empty() {
        return Err(credentials_error(format!("{} is empty", SERVICE_ACCOUNT_ENV)));
    }
    STANDARD
        .decode(compact)
        .map_err(|e| credentials_error(format!("{} is not valid base64: {}", SERVICE_ACCOUNT_ENV, e)))
}

/// Write decoded key JSON to a temporary file and load the key back from it.
pub fn materialize_key(decoded: &[u8]) -> Result<(NamedTempFile, ServiceAccountKey)> {
    // Validate before anything touches the disk.
    ServiceAccountKey::from_json(decoded)?;

    let mut file = tempfile::Builder::new()
        .prefix("service_account_")
        .suffix(".json")
        .tempfile()?;
    file.write_all(decoded)?;
    file.flush()?;

    let key = ServiceAccountKey::from_file(file.path())?;
    debug!(path = %file.path().display(), "Materialized service account key");
    Ok((file, key))
}

/// An OAuth access token.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Everything a client needs after authentication.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: AccessToken,
    pub project_id: String,
    pub client_email: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Sign the RS256 assertion for `key`.
pub fn signed_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        iss: &key.client_email,
        scope: EARTH_ENGINE_SCOPE,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| credentials_error(format!("invalid private key: {}", e)))?;

    encode(&header, &claims, &signing_key)
        .map_err(|e| credentials_error(format!("failed to sign assertion: {}", e)))
}

/// Exchange a signed assertion for an access token at the key's `token_uri`.
pub async fn request_access_token(http: &Client, key: &ServiceAccountKey) -> Result<AccessToken> {
    let now = Utc::now();
    let assertion = signed_assertion(key, now)?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DynamicWorldError::Service {
            status: status.as_u16(),
            message: crate::client::error_message(&body),
        });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| DynamicWorldError::UnexpectedResponse(format!("token response: {}", e)))?;

    Ok(AccessToken {
        value: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS)),
    })
}

/// Authenticate with a base64-encoded service-account key.
pub async fn authenticate(http: &Client, encoded: &str) -> Result<Credentials> {
    let decoded = decode_service_account(encoded)?;
    let (key_file, key) = materialize_key(&decoded)?;

    let token = request_access_token(http, &key).await;
    drop(key_file);
    let token = token?;

    info!(
        client_email = %key.client_email,
        project = %key.project_id,
        expires_at = %token.expires_at,
        "Authenticated service account"
    );

    Ok(Credentials {
        token,
        project_id: key.project_id,
        client_email: key.client_email,
    })
}

/// [`authenticate`] with the key from the `SERVICE_ACCOUNT` environment variable.
pub async fn authenticate_from_env(http: &Client) -> Result<Credentials> {
    let encoded = std::env::var(SERVICE_ACCOUNT_ENV)
        .map_err(|_| credentials_error(format!("{} is not set", SERVICE_ACCOUNT_ENV)))?;
    authenticate(http, &encoded).await
}
