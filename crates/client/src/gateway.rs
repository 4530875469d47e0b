//! Request Gateway: the single entry point for every upstream HTTP call.
//!
//! Injects the session token, serializes query and body, unwraps the response
//! envelope and turns every failure into exactly one user notification before
//! handing the typed error back to the caller.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::envelope::decode_response;
use crate::navigation::Navigator;
use crate::notify::{Notification, Notifier};
use crate::token::TokenStore;
use crate::transport::{HttpRequest, MultipartForm, RequestBody, Transport, TransportError};

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Failure of a gateway call.
///
/// `Display` is the text shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// HTTP 401: the session is no longer valid.
    #[error("Unauthorized")]
    Unauthorized,

    /// Non-success HTTP status other than 401.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// HTTP success but the envelope code is not the success code.
    #[error("{message}")]
    Application { code: i64, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid request payload: {0}")]
    Encode(String),
}

impl RequestError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RequestError::Unauthorized)
    }
}

#[derive(Debug, Clone)]
enum Payload {
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// Per-call options: method, body, query parameters and extra headers.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    body: Option<Payload>,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    encode_error: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            params: Vec::new(),
            headers: Vec::new(),
            encode_error: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// JSON body. Serialization errors surface when the request is sent.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(Payload::Json(value)),
            Err(e) => self.encode_error = Some(e.to_string()),
        }
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(Payload::Multipart(form));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Adds the parameter only when a value is present.
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Flatten a serializable struct into query parameters, dropping null fields.
    ///
    /// Sequences are comma-joined (`ids=1,2`); nested objects are sent as JSON text.
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Self {
        match serde_json::to_value(query) {
            Ok(serde_json::Value::Object(fields)) => {
                for (key, value) in fields {
                    let value = match value {
                        serde_json::Value::Null => continue,
                        serde_json::Value::Array(items) => items
                            .into_iter()
                            .map(query_scalar)
                            .collect::<Vec<_>>()
                            .join(","),
                        other => query_scalar(other),
                    };
                    self.params.push((key, value));
                }
            }
            Ok(serde_json::Value::Null) => {}
            Ok(other) => {
                self.encode_error = Some(format!("query must be an object, got {other}"));
            }
            Err(e) => self.encode_error = Some(e.to_string()),
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

fn query_scalar(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Append `params` to `path`, joining with `?` or `&` as appropriate.
pub fn append_query(path: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{query}")
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

pub struct RequestGateway {
    base_url: String,
    login_route: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl RequestGateway {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login_route: "/login".to_string(),
            transport,
            tokens,
            notifier,
            navigator,
        }
    }

    /// Route the 401 handler bounces to.
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Build the outbound request without sending it.
    pub fn build_request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpRequest, RequestError> {
        if let Some(err) = options.encode_error {
            return Err(RequestError::Encode(err));
        }

        let mut headers = options.headers;

        if let Some(token) = self.tokens.load() {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(AUTHORIZATION));
            headers.push((AUTHORIZATION.to_string(), token.as_str().to_string()));
        }

        let body = match options.body {
            Some(Payload::Json(value)) => {
                let text =
                    serde_json::to_string(&value).map_err(|e| RequestError::Encode(e.to_string()))?;
                Some(RequestBody::Json(text))
            }
            Some(Payload::Multipart(form)) => Some(RequestBody::Multipart(form)),
            None => None,
        };

        let is_multipart = matches!(body, Some(RequestBody::Multipart(_)));
        if !is_multipart && !has_header(&headers, CONTENT_TYPE) {
            headers.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
        }

        Ok(HttpRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, append_query(path, &options.params)),
            headers,
            body,
        })
    }

    /// Send a request and unwrap the envelope payload.
    ///
    /// Every failure has already been reported to the notifier when this
    /// returns `Err`; callers must not notify again.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, RequestError> {
        let request_id = Uuid::now_v7();
        let span = tracing::debug_span!(
            "request",
            %request_id,
            method = %options.method,
            path
        );

        async {
            let result = self.dispatch(path, options).await;
            if let Err(err) = &result {
                self.report(err);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, RequestError> {
        let request = self.build_request(path, options)?;
        let response = self.transport.send(request).await?;
        tracing::debug!(status = response.status, "response received");

        if response.status == 401 {
            self.expire_session();
            return Err(RequestError::Unauthorized);
        }

        decode_response(&response)
    }

    fn expire_session(&self) {
        if let Err(err) = self.tokens.clear() {
            tracing::warn!(error = %err, "failed to delete session token");
        }
        self.navigator.force_navigate(&self.login_route);
    }

    fn report(&self, err: &RequestError) {
        tracing::error!(error = %err, "API error");
        self.notifier.notify(Notification::error(err.to_string()));
    }
}

impl core::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url)
            .field("login_route", &self.login_route)
            .finish_non_exhaustive()
    }
}
