use std::collections::BTreeMap;
use std::time::SystemTime;

use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderMap, LAST_MODIFIED};
use reqwest::{Body, Method};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::client::{Client, RequestInput, clean_path, header_value, parent_path};
use crate::error::Result;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const CONTENT_MD5: &str = "content-md5";
const DURABILITY_LEVEL: &str = "durability-level";
const METADATA_PREFIX: &str = "m-";

pub struct PutObjectInput<R> {
    pub object_path: String,
    pub object_reader: R,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub content_md5: Option<String>,
    pub durability_level: Option<u64>,
    pub headers: HeaderMap,
    /// Create missing parent directories before writing the object.
    pub force_insert: bool,
}

impl<R> PutObjectInput<R> {
    pub fn new(object_path: impl Into<String>, object_reader: R) -> Self {
        Self {
            object_path: object_path.into(),
            object_reader,
            content_length: None,
            content_type: None,
            content_md5: None,
            durability_level: None,
            headers: HeaderMap::new(),
            force_insert: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub content_md5: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<SystemTime>,
    pub durability_level: Option<u64>,
    /// User metadata (`m-*` headers), keyed by lower-case header name.
    pub metadata: BTreeMap<String, String>,
}

impl ObjectInfo {
    fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let metadata = headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with(METADATA_PREFIX))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        Self {
            content_length: text(CONTENT_LENGTH.as_str()).and_then(|v| v.parse().ok()),
            content_type: text(CONTENT_TYPE.as_str()),
            content_md5: text(CONTENT_MD5),
            etag: text(ETAG.as_str()),
            last_modified: text(LAST_MODIFIED.as_str())
                .and_then(|v| httpdate::parse_http_date(&v).ok()),
            durability_level: text(DURABILITY_LEVEL).and_then(|v| v.parse().ok()),
            metadata,
        }
    }
}

#[derive(Debug)]
pub struct GetObjectOutput {
    pub info: ObjectInfo,
    pub body: Bytes,
}

pub struct ObjectsClient<'a> {
    client: &'a Client,
}

impl<'a> ObjectsClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Upload an object, streaming its body from `object_reader`.
    pub async fn put<R>(&self, input: PutObjectInput<R>) -> Result<()>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let object_path = clean_path(&input.object_path);

        if input.force_insert {
            self.ensure_parents(&object_path).await?;
        }

        let mut request = RequestInput::new(Method::PUT, &object_path);
        request.headers = input.headers;
        let content_type = input.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
        request.headers.insert(CONTENT_TYPE, header_value(content_type)?);
        if let Some(length) = input.content_length {
            request.headers.insert(CONTENT_LENGTH, length.into());
        }
        if let Some(md5) = &input.content_md5 {
            request.headers.insert(CONTENT_MD5, header_value(md5)?);
        }
        if let Some(level) = input.durability_level {
            request.headers.insert(DURABILITY_LEVEL, level.into());
        }
        request.body = Some(Body::wrap_stream(ReaderStream::new(input.object_reader)));

        self.client.execute(request).await?;
        debug!(path = %object_path, "object stored");
        Ok(())
    }

    /// Create every missing directory above `object_path`.
    ///
    /// Top-level directories such as `/stor` always exist and are never created.
    async fn ensure_parents(&self, object_path: &str) -> Result<()> {
        let parent = parent_path(object_path);
        let dir = self.client.dir();
        if dir.exists(&parent).await? {
            return Ok(());
        }

        let segments: Vec<&str> = parent.split('/').filter(|s| !s.is_empty()).collect();
        for depth in 2..=segments.len() {
            let path = format!("/{}", segments[..depth].join("/"));
            dir.put(&path).await?;
            info!(%path, "created directory");
        }
        Ok(())
    }

    pub async fn get_info(&self, object_path: &str) -> Result<ObjectInfo> {
        let response = self
            .client
            .execute(RequestInput::new(Method::HEAD, object_path))
            .await?;
        Ok(ObjectInfo::from_headers(response.headers()))
    }

    pub async fn get(&self, object_path: &str) -> Result<GetObjectOutput> {
        let response = self
            .client
            .execute(RequestInput::new(Method::GET, object_path))
            .await?;
        let info = ObjectInfo::from_headers(response.headers());
        let body = response.bytes().await?;
        Ok(GetObjectOutput { info, body })
    }

    pub async fn delete(&self, object_path: &str) -> Result<()> {
        self.client
            .execute(RequestInput::new(Method::DELETE, object_path))
            .await?;
        Ok(())
    }
}
