//! Hosted identity provider client
//!
//! Email/password sign-in is delegated to the hosted provider; this
//! module only carries the credentials over and maps the answer onto
//! the common error type. Role and display name are looked up in the
//! roster afterwards, not here.

use futures::future::BoxFuture;
use prayas_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Sign-in seam. Tests substitute a fake.
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials, returning the provider's user id
    fn sign_in(&self, email: String, password: String) -> BoxFuture<'static, Result<String>>;
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    uid: String,
}

/// Client for the hosted provider (POST `{base}/signin`)
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Identity(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn sign_in(&self, email: String, password: String) -> BoxFuture<'static, Result<String>> {
        let client = self.client.clone();
        let url = format!("{}/signin", self.base_url);

        Box::pin(async move {
            let response = client
                .post(&url)
                .json(&serde_json::json!({ "email": email, "password": password }))
                .send()
                .await
                .map_err(|e| Error::Identity(format!("Provider unreachable: {e}")))?;

            if response.status() == reqwest::StatusCode::UNAUTHORIZED {
                return Err(Error::Identity("Invalid email or password".to_string()));
            }
            if !response.status().is_success() {
                return Err(Error::Identity(format!(
                    "Provider answered with status {}",
                    response.status()
                )));
            }

            let body: SignInResponse = response
                .json()
                .await
                .map_err(|e| Error::Identity(format!("Malformed provider response: {e}")))?;
            Ok(body.uid)
        })
    }
}
