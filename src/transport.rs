use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use tracing::debug;

use crate::{config::HttpConfig, error::ClientError, images::ImageFile};

/// Raw reply: status plus whatever body the server sent.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Bytes,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("cannot read upload file: {0}")]
    File(String),
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Request(msg) => ClientError::NetworkError(msg),
            TransportError::File(msg) => ClientError::AcquisitionFailed(msg),
        }
    }
}

/// One multipart upload: the image goes under `file_field`, the rest as text.
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    pub file_field: &'static str,
    pub file: ImageFile,
    pub fields: Vec<(&'static str, String)>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, TransportError>;
    async fn post_multipart(
        &self,
        path: &str,
        upload: MultipartUpload,
    ) -> Result<HttpReply, TransportError>;
    async fn get(&self, path: &str) -> Result<HttpReply, TransportError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(cfg: &HttpConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_reply(resp: reqwest::Response) -> Result<HttpReply, TransportError> {
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        debug!(status, len = body.len(), "http reply");
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, TransportError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::read_reply(resp).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        upload: MultipartUpload,
    ) -> Result<HttpReply, TransportError> {
        let data = tokio::fs::read(&upload.file.path)
            .await
            .map_err(|e| TransportError::File(format!("{}: {e}", upload.file.path.display())))?;

        let part = Part::bytes(data)
            .file_name(upload.file.file_name())
            .mime_str(&upload.file.content_type)
            .map_err(|e| TransportError::File(e.to_string()))?;
        let form = upload
            .fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part(upload.file_field, part);

        let resp = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::read_reply(resp).await
    }

    async fn get(&self, path: &str) -> Result<HttpReply, TransportError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::read_reply(resp).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_success_range() {
        assert!(HttpReply::new(200, "").is_success());
        assert!(HttpReply::new(204, "").is_success());
        assert!(!HttpReply::new(301, "").is_success());
        assert!(!HttpReply::new(500, "").is_success());
    }

    #[test]
    fn reply_json_maps_parse_errors() {
        let reply = HttpReply::new(200, "not json");
        let err = reply.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[test]
    fn transport_errors_map_to_client_errors() {
        assert_eq!(
            ClientError::from(TransportError::Request("refused".into())),
            ClientError::NetworkError("refused".into())
        );
        assert_eq!(
            ClientError::from(TransportError::File("gone".into())),
            ClientError::AcquisitionFailed("gone".into())
        );
    }

    #[test]
    fn http_transport_joins_base_and_path() {
        let t = HttpTransport::new(&HttpConfig {
            api_url: "http://example.test/".into(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(t.url("/api/analyze"), "http://example.test/api/analyze");
    }
}
