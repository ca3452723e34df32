//! Signed HEAD/PUT requests against the object store.
//!
//! The client holds nothing but its configuration, credentials and a pooled
//! `reqwest::Client`, so one instance is shared by all in-flight requests.
//! Nothing here retries: transport errors go back to the caller.

use std::time::{Duration, SystemTime};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE};
use reqwest::{redirect, Body, Client, Request, Response, StatusCode};
use url::Url;

use crate::config::StoreConfig;
use crate::store::signing;
use crate::store::types::{Credentials, ObjectLocation, StoreError, StoreResult};

/// Characters escaped when a cache key becomes an object path. `/` stays as
/// a separator; `%` is escaped so keys containing escapes survive intact.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Client for the S3-compatible object store.
#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    http: Client,
    bucket: String,
    endpoint: String,
    path_style: bool,
    credentials: Credentials,
}

impl ObjectStoreClient {
    /// Build a client with its own connection pool.
    pub fn new(config: &StoreConfig, connect_timeout: Duration) -> StoreResult<Self> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(config, http))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_client(config: &StoreConfig, http: Client) -> Self {
        Self {
            http,
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            path_style: config.path_style,
            credentials: Credentials::new(&config.access_key, &config.secret_key),
        }
    }

    /// Resolve the store URL and signing resource for a cache key.
    pub fn locate(&self, key: &str) -> StoreResult<ObjectLocation> {
        let encoded: String = utf8_percent_encode(key, KEY_ENCODE_SET).collect();
        let raw = if self.path_style {
            format!("http://{}/{}/{}", self.endpoint, self.bucket, encoded)
        } else {
            format!("http://{}.{}/{}", self.bucket, self.endpoint, encoded)
        };

        let url = Url::parse(&raw).map_err(|source| StoreError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        let resource = if self.path_style {
            url.path().to_string()
        } else {
            format!("/{}{}", self.bucket, url.path())
        };

        Ok(ObjectLocation { url, resource })
    }

    /// Signed existence probe. Only the status matters.
    pub async fn probe(&self, location: &ObjectLocation) -> StoreResult<StatusCode> {
        let request = self.http.head(location.url.clone()).build()?;
        let response = self.execute_signed(request, location).await?;
        Ok(response.status())
    }

    /// Signed upload of exactly `length` bytes.
    ///
    /// The store rejects uploads without a declared length, so the length is
    /// always sent explicitly and the body is never chunk-encoded.
    pub async fn put(
        &self,
        location: &ObjectLocation,
        body: Body,
        length: u64,
        content_type: Option<&HeaderValue>,
    ) -> StoreResult<Response> {
        let mut builder = self
            .http
            .put(location.url.clone())
            .header(CONTENT_LENGTH, length)
            .body(body);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type.clone());
        }

        let request = builder.build()?;
        self.execute_signed(request, location).await
    }

    async fn execute_signed(
        &self,
        mut request: Request,
        location: &ObjectLocation,
    ) -> StoreResult<Response> {
        self.sign(&mut request, location)?;
        Ok(self.http.execute(request).await?)
    }

    /// Stamp `Date` with the current time and add the `Authorization` header.
    fn sign(&self, request: &mut Request, location: &ObjectLocation) -> StoreResult<()> {
        let date = httpdate::fmt_http_date(SystemTime::now());
        let date = HeaderValue::from_str(&date).map_err(|_| StoreError::InvalidHeader("date"))?;
        request.headers_mut().insert(DATE, date);

        let auth = signing::authorization(
            &self.credentials,
            request.method(),
            request.headers(),
            &location.resource,
        );
        let auth = HeaderValue::from_str(&auth)
            .map_err(|_| StoreError::InvalidHeader("authorization"))?;
        request.headers_mut().insert(AUTHORIZATION, auth);
        Ok(())
    }
}
