//! Thin typed client for the hosted gateway: table-style query, insert,
//! update, and delete over HTTPS, plus the auth sub-API (sign-up, password
//! sign-in, sign-out, current user, password update).

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::{
    config::Settings,
    model::{Identity, SessionTokens},
};

/// Errors produced at the gateway boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credentials were missing from the environment; no request was made.
    #[error("gateway credentials are not configured")]
    NotConfigured,
    /// The gateway URL could not be combined with the endpoint path.
    #[error("invalid gateway url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The request never produced a response (DNS, connect, timeout, body).
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The gateway answered with a non-success status.
    #[error("gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// A write that should return the stored row returned nothing.
    #[error("gateway returned no row for the write")]
    MissingRow,
}

/// Filter and ordering parameters for a table select.
#[derive(Debug, Default, Clone)]
pub struct TableQuery {
    filters: Vec<(String, String)>,
    order: Option<String>,
}

impl TableQuery {
    /// Add an equality filter on `column`.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Order results by `column`, newest/highest first.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.desc"));
        self
    }

    /// Order results by `column`, ascending.
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.asc"));
        self
    }

    fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", "*");
        for (column, value) in &self.filters {
            pairs.append_pair(column, value);
        }
        if let Some(order) = &self.order {
            pairs.append_pair("order", order);
        }
    }
}

/// Client for the remote gateway. Cheap to clone; all calls are async and
/// never retried.
#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    base: String,
    anon_key: String,
}

impl Gateway {
    /// Build a client from settings. Missing credentials are tolerated here;
    /// each call then fails with [`GatewayError::NotConfigured`].
    pub fn new(settings: &Settings) -> Self {
        Gateway {
            http: reqwest::Client::new(),
            base: settings.gateway_url.trim_end_matches('/').to_string(),
            anon_key: settings.gateway_key.clone(),
        }
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.base.is_empty() || self.anon_key.is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        Ok(())
    }

    fn table_url(&self, table: &str) -> Result<Url, GatewayError> {
        Ok(Url::parse(&format!("{}/rest/v1/{}", self.base, table))?)
    }

    fn auth_url(&self, endpoint: &str) -> Result<Url, GatewayError> {
        Ok(Url::parse(&format!("{}/auth/v1/{}", self.base, endpoint))?)
    }

    /// Attach the anon key plus a bearer token (the user's when signed in,
    /// the anon key otherwise), as the gateway expects on every request.
    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Select rows from `table` with the given filters and ordering.
    pub async fn select<T: DeserializeOwned>(
        &self,
        token: Option<&str>,
        table: &str,
        query: &TableQuery,
    ) -> Result<Vec<T>, GatewayError> {
        self.ensure_configured()?;
        let mut url = self.table_url(table)?;
        query.apply(&mut url);
        let resp = self.request(Method::GET, url, token).send().await?;
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Insert a row into `table`, returning the stored representation.
    pub async fn insert<P: Serialize, R: DeserializeOwned>(
        &self,
        token: Option<&str>,
        table: &str,
        payload: &P,
    ) -> Result<R, GatewayError> {
        self.ensure_configured()?;
        let url = self.table_url(table)?;
        let resp = self
            .request(Method::POST, url, token)
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;
        let resp = check(resp).await?;
        let mut rows: Vec<R> = resp.json().await?;
        if rows.is_empty() {
            return Err(GatewayError::MissingRow);
        }
        Ok(rows.remove(0))
    }

    /// Overwrite the row with `id` in `table`. Full-record update, no
    /// partial patch semantics at this layer.
    pub async fn update<P: Serialize>(
        &self,
        token: Option<&str>,
        table: &str,
        id: &str,
        payload: &P,
    ) -> Result<(), GatewayError> {
        self.ensure_configured()?;
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let resp = self
            .request(Method::PATCH, url, token)
            .json(payload)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Delete the row with `id` from `table`.
    pub async fn delete(
        &self,
        token: Option<&str>,
        table: &str,
        id: &str,
    ) -> Result<(), GatewayError> {
        self.ensure_configured()?;
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let resp = self.request(Method::DELETE, url, token).send().await?;
        check(resp).await?;
        Ok(())
    }

    /// Register a new account. Depending on gateway policy the account may
    /// still need email confirmation before it can sign in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), GatewayError> {
        self.ensure_configured()?;
        let url = self.auth_url("signup")?;
        let body = serde_json::json!({ "email": email, "password": password });
        let resp = self.request(Method::POST, url, None).json(&body).send().await?;
        check(resp).await?;
        Ok(())
    }

    /// Exchange email/password credentials for session tokens.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionTokens, Identity), GatewayError> {
        self.ensure_configured()?;
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let body = serde_json::json!({ "email": email, "password": password });
        let resp = self.request(Method::POST, url, None).json(&body).send().await?;
        let resp = check(resp).await?;
        let body: Value = resp.json().await?;
        let tokens = SessionTokens {
            access_token: str_field(&body, "access_token"),
            refresh_token: str_field(&body, "refresh_token"),
        };
        if tokens.access_token.is_empty() {
            return Err(GatewayError::Rejected {
                status: 200,
                message: "sign-in response carried no access token".into(),
            });
        }
        let user = body.get("user").cloned().unwrap_or(Value::Null);
        let identity = Identity {
            id: str_field(&user, "id"),
            email: str_field(&user, "email"),
        };
        Ok((tokens, identity))
    }

    /// Revoke the session behind `token`.
    pub async fn sign_out(&self, token: &str) -> Result<(), GatewayError> {
        self.ensure_configured()?;
        let url = self.auth_url("logout")?;
        let resp = self.request(Method::POST, url, Some(token)).send().await?;
        check(resp).await?;
        Ok(())
    }

    /// Look up the user a bearer token belongs to.
    pub async fn current_user(&self, token: &str) -> Result<Identity, GatewayError> {
        self.ensure_configured()?;
        let url = self.auth_url("user")?;
        let resp = self.request(Method::GET, url, Some(token)).send().await?;
        let resp = check(resp).await?;
        let body: Value = resp.json().await?;
        Ok(Identity {
            id: str_field(&body, "id"),
            email: str_field(&body, "email"),
        })
    }

    /// Change the signed-in user's password.
    pub async fn update_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), GatewayError> {
        self.ensure_configured()?;
        let url = self.auth_url("user")?;
        let body = serde_json::json!({ "password": new_password });
        let resp = self
            .request(Method::PUT, url, Some(token))
            .json(&body)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

/// Turn a non-success response into [`GatewayError::Rejected`], pulling a
/// human-readable message out of the JSON error body when one exists.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<Value>().await {
        Ok(body) => error_message(&body, status),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Gateways spell the error field differently across sub-APIs.
fn error_message(body: &Value, status: StatusCode) -> String {
    for key in ["message", "msg", "error_description", "error"] {
        if let Some(msg) = body.get(key).and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    status.canonical_reason().unwrap_or("unknown error").to_string()
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
