//! HTTP client for the grindd API

use crate::errors::ClientError;
use grind_common::{ClientGrindRequest, ConfigPatch, ConfigRecord, ErrorBody};
use reqwest::{Client, Response, Url};
use std::time::Duration;

pub const DEFAULT_SERVER: &str = "http://localhost:5005";

pub struct GrindClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl GrindClient {
    pub fn new(server: &str, token: Option<String>) -> Result<Self, ClientError> {
        let mut base = Url::parse(server)
            .map_err(|e| ClientError::InvalidServer(format!("{} ({})", server, e)))?;
        // Keep any path prefix when joining endpoints
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::InvalidServer(e.to_string()))?;

        Ok(Self { http, base, token })
    }

    pub fn endpoint(&self, path: &str) -> Url {
        // `path` is a fixed relative endpoint name, joining cannot fail
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    pub async fn get_config(&self) -> Result<ConfigRecord, ClientError> {
        let url = self.endpoint("config");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| unreachable(&url, e))?;
        decode(response).await
    }

    pub async fn client_grind(&self, hours: Option<i64>) -> Result<ConfigRecord, ClientError> {
        let url = self.endpoint("client-grind");
        let response = self
            .http
            .post(url.clone())
            .json(&ClientGrindRequest::new(hours))
            .send()
            .await
            .map_err(|e| unreachable(&url, e))?;
        decode(response).await
    }

    pub async fn admin_update(&self, patch: &ConfigPatch) -> Result<ConfigRecord, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        let url = self.endpoint("config");
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(token)
            .json(patch)
            .send()
            .await
            .map_err(|e| unreachable(&url, e))?;
        decode(response).await
    }
}

fn unreachable(url: &Url, source: reqwest::Error) -> ClientError {
    ClientError::Unreachable {
        url: url.to_string(),
        source,
    }
}

async fn decode(response: Response) -> Result<ConfigRecord, ClientError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

    if status.is_success() {
        return ConfigRecord::from_slice(&bytes)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()));
    }

    Err(match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => ClientError::Rejected {
            code: body.code,
            message: body.error,
        },
        Err(_) => ClientError::Rejected {
            code: status.as_u16(),
            message: String::from_utf8_lossy(&bytes).chars().take(100).collect(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let client = GrindClient::new("http://localhost:5005", None).unwrap();
        assert_eq!(client.endpoint("config").as_str(), "http://localhost:5005/config");

        let client = GrindClient::new("https://focus.example.com/api", None).unwrap();
        assert_eq!(
            client.endpoint("client-grind").as_str(),
            "https://focus.example.com/api/client-grind"
        );
    }

    #[test]
    fn test_bad_server_url() {
        assert!(matches!(
            GrindClient::new("not a url", None),
            Err(ClientError::InvalidServer(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_needs_token() {
        let client = GrindClient::new("http://127.0.0.1:9", None).unwrap();
        let err = client.admin_update(&ConfigPatch::chill()).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
    }
}
