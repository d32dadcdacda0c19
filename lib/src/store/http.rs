use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tokio_util::io::ReaderStream;
use url::Url;

use crate::config::{Backend, Storage};
use crate::{ErrorKind, Result};

use super::{content_type, object_url, ObjectStore};

/// Object store reached over http using path-style addressing,
/// `PUT|DELETE|HEAD <endpoint>/<bucket>/<key>`.
#[derive(Clone, Debug)]
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(config: &Storage) -> Result<Self> {
        // fail early on a malformed endpoint
        Url::parse(&config.endpoint)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let token = Some(config.token.clone()).filter(|t| !t.is_empty());

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    #[tracing::instrument(skip(self, source))]
    async fn put(&self, bucket: &str, key: &str, source: &Path) -> Result<()> {
        let url = object_url(&self.endpoint, bucket, key)?;
        let file = tokio::fs::File::open(source).await?;
        let len = file.metadata().await?.len();

        let response = self
            .request(reqwest::Method::PUT, url.clone())
            .header(CONTENT_TYPE, content_type(key).to_string())
            .header(CONTENT_LENGTH, len)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorKind::ObjectStore(format!("PUT {url} returned {status}: {body}")).into());
        }

        tracing::debug!(%url, size = len, "object stored");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str, bucket: &str) -> Result<()> {
        let url = object_url(&self.endpoint, bucket, key)?;
        let response = self
            .request(reqwest::Method::DELETE, url.clone())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::debug!(%url, "object already gone");
                Ok(())
            }
            status => Err(ErrorKind::ObjectStore(format!("DELETE {url} returned {status}")).into()),
        }
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let url = object_url(&self.endpoint, bucket, key)?;
        let response = self.request(reqwest::Method::HEAD, url.clone()).send().await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ErrorKind::ObjectStore(format!("HEAD {url} returned {status}")).into()),
        }
    }

    fn backend(&self) -> Backend {
        Backend::Http
    }
}
