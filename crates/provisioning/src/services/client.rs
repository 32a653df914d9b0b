//! HTTP client shared by the downstream service implementations.

use std::time::Duration;

use common::ResourceId;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

/// Thin JSON client bound to one downstream service's base URL.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service: &'static str,
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ServiceClient {
    /// Builds a client for `service` rooted at `base_url`.
    ///
    /// Relative request paths are resolved against `base_url`, so it is
    /// normalized to end with a slash.
    pub fn new(
        service: &'static str,
        base_url: Url,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ServiceError::Transport {
                service,
                reason: format!("build http client: {err}"),
            })?;
        Ok(Self {
            service,
            client,
            base_url: with_trailing_slash(base_url),
            token,
        })
    }

    /// POSTs `body` to `path` and decodes the created resource's id.
    pub async fn create<B>(&self, path: &str, body: &B) -> Result<ResourceId, ServiceError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(service = self.service, %url, "POST");
        let resp = self
            .authorize(self.client.post(url).json(body))
            .send()
            .await
            .map_err(|err| self.transport(err))?;
        self.decode_response(resp).await
    }

    /// DELETEs the resource at `path`.
    pub async fn delete(&self, path: &str) -> Result<(), ServiceError> {
        let url = self.url(path)?;
        tracing::debug!(service = self.service, %url, "DELETE");
        let resp = self
            .authorize(self.client.delete(url))
            .send()
            .await
            .map_err(|err| self.transport(err))?;
        self.check_status(resp).await.map(|_| ())
    }

    fn url(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::InvalidUrl {
                service: self.service,
                reason: err.to_string(),
            })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn transport(&self, err: reqwest::Error) -> ServiceError {
        ServiceError::Transport {
            service: self.service,
            reason: err.to_string(),
        }
    }

    async fn decode_response<T>(&self, resp: Response) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
    {
        let resp = self.check_status(resp).await?;
        resp.json::<T>().await.map_err(|err| ServiceError::Decode {
            service: self.service,
            reason: err.to_string(),
        })
    }

    async fn check_status(&self, resp: Response) -> Result<Response, ServiceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp
            .text()
            .await
            .unwrap_or_else(|err| format!("response body error: {err}"));
        Err(ServiceError::Rejected {
            service: self.service,
            status: status.as_u16(),
            body,
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
