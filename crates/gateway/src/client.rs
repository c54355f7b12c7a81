use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use kodi_voice_core::config::KodiConfig;
use kodi_voice_core::errors::GatewayError;
use kodi_voice_core::gateway::MediaGateway;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use crate::rpc::{decode_response, RpcRequest};

/// JSON-RPC over HTTP POST to `/jsonrpc`, one request at a time.
///
/// No request timeout is configured, so a hung media center blocks the caller.
#[derive(Debug)]
pub struct KodiRpcClient {
    http: Client,
    endpoint: String,
    credentials: Option<(String, SecretString)>,
    next_id: AtomicU64,
}

impl KodiRpcClient {
    pub fn new(config: &KodiConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .user_agent(concat!("kodi-voice/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        let credentials = config
            .username
            .as_ref()
            .filter(|username| !username.trim().is_empty())
            .map(|username| {
                let password =
                    config.password.clone().unwrap_or_else(|| SecretString::from(String::new()));
                (username.clone(), password)
            });

        Ok(Self { http, endpoint: config.endpoint(), credentials, next_id: AtomicU64::new(1) })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, method: &str, params: Option<&Value>) -> Result<Value, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut request =
            self.http.post(&self.endpoint).json(&RpcRequest::new(method, id, params));
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password.expose_secret()));
        }

        let response =
            request.send().await.map_err(|error| GatewayError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus { status: status.as_u16() });
        }

        let body =
            response.text().await.map_err(|error| GatewayError::Transport(error.to_string()))?;
        decode_response(method, &body)
    }
}

#[async_trait]
impl MediaGateway for KodiRpcClient {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, GatewayError> {
        match self.send(method, params.as_ref()).await {
            Ok(result) => {
                debug!(event_name = "gateway.call_completed", method, "kodi rpc call completed");
                Ok(result)
            }
            Err(error) => {
                warn!(
                    event_name = "gateway.call_failed",
                    method,
                    endpoint = %self.endpoint,
                    error_class = error.error_class(),
                    error = %error,
                    "kodi rpc call failed"
                );
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kodi_voice_core::config::AppConfig;
    use kodi_voice_core::gateway::MediaGateway;

    use super::KodiRpcClient;

    #[test]
    fn endpoint_follows_host_port_and_tls() {
        let mut config = AppConfig::default().kodi;
        config.host = "192.168.1.20".to_owned();
        config.port = 8443;
        config.tls = true;

        let client = KodiRpcClient::new(&config).expect("client builds");

        assert_eq!(client.endpoint(), "https://192.168.1.20:8443/jsonrpc");
    }

    #[test]
    fn credentials_only_apply_with_a_username() {
        let mut config = AppConfig::default().kodi;
        config.password = Some("ignored".to_owned().into());
        assert!(KodiRpcClient::new(&config).expect("client builds").credentials.is_none());

        config.username = Some("kodi".to_owned());
        let client = KodiRpcClient::new(&config).expect("client builds");
        assert_eq!(client.credentials.as_ref().map(|(user, _)| user.as_str()), Some("kodi"));
        assert!(!format!("{client:?}").contains("ignored"));
    }

    #[tokio::test]
    async fn unreachable_media_center_is_a_transport_error() {
        let mut config = AppConfig::default().kodi;
        config.host = "127.0.0.1".to_owned();
        config.port = 1;

        let client = KodiRpcClient::new(&config).expect("client builds");
        let error = client.ping().await.expect_err("nothing listens on port 1");

        assert_eq!(error.error_class(), "transport");
    }
}
