//! Blocking HTTP implementation of [`Transport`].

use crate::config::{Config, Credential, Endpoints};
use crate::error::{Result, TransportError};
use crate::routes;
use crate::transport::{Body, Query, Service, SessionToken, Transport};
use reqwest::blocking::{multipart, Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const TENANT_HEADER: &str = "__tenant";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

pub struct HttpTransport {
    client: Client,
    endpoints: Endpoints,
}

impl HttpTransport {
    pub fn new(
        endpoints: Endpoints,
        accept_invalid_certs: bool,
        timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(accept_invalid_certs);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoints,
        })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(
            config.endpoints.clone(),
            config.accept_invalid_certs,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    fn url(&self, service: Service, path: &str) -> String {
        let base = match service {
            Service::Api => &self.endpoints.api_base,
            Service::Reporting => &self.endpoints.pop_base,
        };
        join(base, path)
    }

    fn authorized(&self, req: RequestBuilder, token: &SessionToken) -> RequestBuilder {
        req.bearer_auth(&token.access_token)
            .header(TENANT_HEADER, &token.tenant)
    }
}

impl Transport for HttpTransport {
    fn authenticate(&self, credential: &Credential) -> Result<SessionToken> {
        let scope = credential.scope();
        let form = [
            ("grant_type", "password"),
            ("username", credential.username.as_str()),
            ("password", credential.password.as_str()),
            ("client_id", credential.client_id.as_str()),
            ("scope", scope.as_str()),
        ];
        let req = self
            .client
            .post(join(&self.endpoints.auth_base, routes::TOKEN))
            .header(TENANT_HEADER, &credential.tenant)
            .form(&form);
        let text = send(routes::TOKEN, req)?;

        let parsed: TokenResponse =
            serde_json::from_str(&text).map_err(|e| TransportError::Decode {
                path: routes::TOKEN.to_string(),
                reason: e.to_string(),
            })?;
        match parsed.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(SessionToken {
                access_token,
                tenant: credential.tenant.clone(),
            }),
            _ => Err(TransportError::Decode {
                path: routes::TOKEN.to_string(),
                reason: "response has no access_token".to_string(),
            }),
        }
    }

    fn get(
        &self,
        token: &SessionToken,
        service: Service,
        path: &str,
        query: Query<'_>,
    ) -> Result<Value> {
        let req = self
            .authorized(self.client.get(self.url(service, path)), token)
            .query(query);
        send(path, req).map(|text| decode(&text))
    }

    fn post(
        &self,
        token: &SessionToken,
        path: &str,
        query: Query<'_>,
        body: Body,
    ) -> Result<Value> {
        let req = self
            .authorized(self.client.post(self.url(Service::Api, path)), token)
            .query(query);
        let req = match body {
            Body::Empty => req,
            Body::Json(value) => req.json(&value),
            Body::Multipart(part) => {
                let file = multipart::Part::bytes(part.bytes)
                    .file_name(part.file_name)
                    .mime_str(&part.content_type)
                    .map_err(|e| request_error(path, e))?;
                req.multipart(multipart::Form::new().part(part.field, file))
            }
        };
        send(path, req).map(|text| decode(&text))
    }

    fn put(&self, token: &SessionToken, path: &str, body: &Value) -> Result<()> {
        let req = self
            .authorized(self.client.put(self.url(Service::Api, path)), token)
            .json(body);
        send(path, req).map(|_| ())
    }

    fn delete(&self, token: &SessionToken, path: &str, body: Option<&Value>) -> Result<()> {
        let mut req = self.authorized(self.client.delete(self.url(Service::Api, path)), token);
        if let Some(body) = body {
            req = req.json(body);
        }
        send(path, req).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn request_error(path: &str, e: reqwest::Error) -> TransportError {
    TransportError::Request {
        path: path.to_string(),
        message: e.to_string(),
    }
}

/// Send once and return the body text of a success response.
fn send(path: &str, req: RequestBuilder) -> Result<String> {
    let resp = req.send().map_err(|e| request_error(path, e))?;
    let status = resp.status();
    let text = resp.text().map_err(|e| request_error(path, e))?;
    if !status.is_success() {
        return Err(TransportError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}

/// Empty bodies decode to null; bodies that are not JSON are kept verbatim.
fn decode(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
