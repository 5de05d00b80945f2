use std::sync::Arc;
use std::time::SystemTime;

use reqwest::header::{ACCEPT, AUTHORIZATION, DATE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Body, Method, Response, Url};
use serde::Deserialize;
use tracing::debug;

use crate::authentication::Signer;
use crate::directories::DirectoryClient;
use crate::error::{Error, Result};
use crate::objects::ObjectsClient;

const ACCEPT_VALUE: &str = "application/json, */*";
const USER_AGENT_VALUE: &str = concat!("triton-storage/", env!("CARGO_PKG_VERSION"));

pub struct ClientConfig {
    pub manta_url: String,
    pub account_name: String,
    pub username: Option<String>,
    pub signers: Vec<Arc<dyn Signer>>,
}

/// Handle to a Manta storage endpoint.
///
/// Requests are signed with the first configured signer.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    account_name: String,
    username: Option<String>,
    signer: Arc<dyn Signer>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.account_name.is_empty() {
            return Err(Error::MissingAccountName);
        }
        let signer = config.signers.into_iter().next().ok_or(Error::NoSigners)?;

        let base_url = Url::parse(config.manta_url.trim())
            .map_err(|_| Error::InvalidUrl(config.manta_url.clone()))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(config.manta_url));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()?;

        Ok(Self {
            http,
            base_url,
            account_name: config.account_name,
            username: config.username,
            signer,
        })
    }

    pub fn objects(&self) -> ObjectsClient<'_> {
        ObjectsClient::new(self)
    }

    pub fn dir(&self) -> DirectoryClient<'_> {
        DirectoryClient::new(self)
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Absolute service path for a path relative to the account, e.g.
    /// `/stor/a` becomes `/<account>/stor/a`.
    pub fn account_path(&self, path: &str) -> String {
        let path = clean_path(path);
        if path == "/" {
            format!("/{}", self.account_name)
        } else {
            format!("/{}{}", self.account_name, path)
        }
    }

    /// Service URL for `path`, with each segment percent-encoded.
    pub(crate) fn request_url(&self, path: &str) -> Result<Url> {
        let account_path = self.account_path(path);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.to_string()))?
            .clear()
            .extend(account_path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    pub(crate) async fn execute(&self, input: RequestInput) -> Result<Response> {
        let url = self.request_url(&input.path)?;

        let date = httpdate::fmt_http_date(SystemTime::now());
        let signer = Arc::clone(&self.signer);
        let authorization = {
            let date = date.clone();
            tokio::task::spawn_blocking(move || signer.sign(&date, true))
                .await
                .map_err(|e| Error::Signing(e.to_string()))??
        };

        let mut headers = input.headers;
        headers.insert(DATE, header_value(&date)?);
        headers.insert(AUTHORIZATION, header_value(&authorization)?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        debug!(method = %input.method, %url, "sending storage request");
        let mut request = self.http.request(input.method, url).headers(headers);
        if let Some(body) = input.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "storage response");
        if status.is_success() {
            Ok(response)
        } else {
            Err(decode_error(response).await)
        }
    }
}

pub(crate) struct RequestInput {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl RequestInput {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Signing(format!("invalid header value: {e}")))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

async fn decode_error(response: Response) -> Error {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => return Error::Http(err),
    };

    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => Error::Api {
            status,
            code: parsed.code,
            message: parsed.message,
        },
        Err(_) => Error::Api {
            status,
            code: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .replace(' ', ""),
            message: body,
        },
    }
}

/// Normalise a slash separated path: leading `/`, no empty or `.` segments,
/// `..` resolved, no trailing `/`.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Parent of a cleaned path; the root is its own parent.
pub(crate) fn parent_path(path: &str) -> String {
    let path = clean_path(path);
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}
