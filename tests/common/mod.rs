//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use sendmsg::channel::{Channel, SmsClient};
use sendmsg::config::{ListenerConfig, ServiceConfig, SmsConfig};
use sendmsg::lifecycle::{Lifecycle, LifecycleError, Shutdown, ShutdownReport};
use sendmsg::net::Listener;
use sendmsg::HttpServer;
use tokio::task::JoinHandle;

/// Gateway body for an accepted message.
#[allow(dead_code)]
pub const GATEWAY_OK: &str =
    r#"{"Message":"OK","RequestId":"F655A8D5","BizId":"900619746936498440^0","Code":"OK"}"#;

/// A receive-server running on an ephemeral port.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub lifecycle: Lifecycle,
    pub handle: JoinHandle<Result<ShutdownReport, LifecycleError>>,
}

#[allow(dead_code)]
impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Config pointing the SMS channel at `gateway_url`, listening on 127.0.0.1:0.
pub fn test_config(gateway_url: &str) -> ServiceConfig {
    ServiceConfig {
        listener: ListenerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 64,
        },
        sms: SmsConfig {
            access_key_id: "testId".into(),
            access_secret: SecretString::new("testSecret".into()),
            gateway_url: gateway_url.into(),
            sign_name: "Acme".into(),
            region_id: "cn-hangzhou".into(),
        },
        ..ServiceConfig::default()
    }
}

/// Bind and serve `config` in a background task.
pub async fn spawn_server(config: ServiceConfig) -> RunningServer {
    let channel: Arc<dyn Channel> =
        Arc::new(SmsClient::new(config.sms.clone(), config.timeouts.call()).unwrap());
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let lifecycle = Lifecycle::new();
    let server = HttpServer::new(&config, channel, lifecycle.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    tokio::time::timeout(
        Duration::from_secs(5),
        lifecycle.reached(sendmsg::lifecycle::ServerState::Listening),
    )
    .await
    .unwrap();

    RunningServer {
        addr,
        shutdown,
        lifecycle,
        handle,
    }
}

/// The canonical valid send payload.
#[allow(dead_code)]
pub fn valid_payload() -> serde_json::Value {
    serde_json::json!({
        "recipient": "13423234442",
        "template_code": "test",
        "params": {"a": "te"},
    })
}
