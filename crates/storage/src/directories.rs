use reqwest::{Body, Method};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;

use crate::client::{Client, RequestInput};
use crate::error::{Error, Result};

const DIRECTORY_CONTENT_TYPE: &str = "application/json; type=directory";
const RESULT_SET_SIZE: &str = "result-set-size";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// `"object"` or `"directory"`.
    #[serde(rename = "type")]
    pub entry_type: String,
    pub mtime: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub etag: Option<String>,
}

impl DirectoryEntry {
    pub fn is_directory(&self) -> bool {
        self.entry_type == "directory"
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListDirectoryOutput {
    pub entries: Vec<DirectoryEntry>,
    pub result_set_size: Option<u64>,
}

pub struct DirectoryClient<'a> {
    client: &'a Client,
}

impl<'a> DirectoryClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a directory. The parent must already exist; existing
    /// directories are left untouched.
    pub async fn put(&self, directory_name: &str) -> Result<()> {
        let mut request = RequestInput::new(Method::PUT, directory_name);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(DIRECTORY_CONTENT_TYPE));
        request.body = Some(Body::from(""));
        self.client.execute(request).await?;
        Ok(())
    }

    pub async fn list(&self, directory_name: &str) -> Result<ListDirectoryOutput> {
        let response = self
            .client
            .execute(RequestInput::new(Method::GET, directory_name))
            .await?;
        let result_set_size = response
            .headers()
            .get(RESULT_SET_SIZE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        let body = response.text().await?;
        Ok(ListDirectoryOutput {
            entries: parse_listing(&body)?,
            result_set_size,
        })
    }

    pub async fn delete(&self, directory_name: &str) -> Result<()> {
        self.client
            .execute(RequestInput::new(Method::DELETE, directory_name))
            .await?;
        Ok(())
    }

    pub(crate) async fn exists(&self, directory_name: &str) -> Result<bool> {
        match self
            .client
            .execute(RequestInput::new(Method::HEAD, directory_name))
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Listings are newline-delimited JSON, one entry per line.
fn parse_listing(body: &str) -> Result<Vec<DirectoryEntry>> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| Error::InvalidResponse(format!("directory entry {line}: {e}")))
        })
        .collect()
}
