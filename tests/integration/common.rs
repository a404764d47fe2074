use echo_function::{config::AppConfig, RequestSnapshot};
use reqwest::{Client, Response};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// An echo function instance bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(AppConfig::default()).await
    }

    pub async fn start_with(mut config: AppConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local address");
        config.host = addr.ip().to_string();
        config.port = addr.port();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let shutdown = async move {
                rx.await.ok();
            };
            echo_function::serve(listener, Arc::new(config), shutdown)
                .await
                .expect("Echo function server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            client: Client::new(),
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Signals graceful shutdown and waits for the server task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        if let Some(handle) = self.handle.take() {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("Server did not shut down in time")
                .expect("Server task panicked");
        }
    }
}

/// Asserts the response is a successful echo and decodes it.
pub async fn expect_snapshot(response: Response) -> RequestSnapshot {
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let text = response.text().await.expect("Failed to read response body");
    let mut deserializer = serde_json::Deserializer::from_str(&text);
    deserializer.disable_recursion_limit();
    serde::Deserialize::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .expect("Echo response is not a request snapshot")
}
