// Server bootstrapping and a small WebSocket client shared by integration tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Shared server for tests that do not care about the arena contents.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // A dedicated OS thread keeps the server alive across `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{addr}"));
                arena_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

/// Boots a private server on the current runtime so the test owns the whole arena.
pub async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        let _ = arena_server::run(listener).await;
    });
    format!("http://{addr}")
}

pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub id: String,
}

impl TestClient {
    /// Opens a socket and consumes the identity frame.
    pub async fn connect(base_url: &str) -> Self {
        let url = format!("{}/ws", base_url.replacen("http://", "ws://", 1));
        let (ws, _response) = connect_async(url).await.expect("websocket should connect");
        let mut client = Self {
            ws,
            id: String::new(),
        };

        let identity = client.recv().await;
        assert_eq!(identity["type"], "identity");
        client.id = identity["data"]["player_id"]
            .as_str()
            .expect("identity should carry a string id")
            .to_string();
        client
    }

    /// Names the player and returns the snapshot the server answers with.
    pub async fn join(base_url: &str, name: &str) -> Self {
        let mut client = Self::connect(base_url).await;
        client
            .send(serde_json::json!({"type": "setUsername", "data": name}))
            .await;
        let snapshot = client.recv_type("gameState").await;
        assert!(snapshot["data"]["players"][&client.id].is_object());
        client
    }

    pub async fn send(&mut self, msg: Value) {
        self.ws
            .send(Message::text(msg.to_string()))
            .await
            .expect("send should succeed");
    }

    pub async fn send_raw(&mut self, msg: Message) {
        self.ws.send(msg).await.expect("send should succeed");
    }

    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed unexpectedly")
                .expect("websocket error");
            if let Message::Text(_) = frame {
                let text = frame.to_text().expect("text frame");
                return serde_json::from_str(text).expect("server frames are json");
            }
        }
    }

    /// Skips frames until one of the given type arrives.
    pub async fn recv_type(&mut self, ty: &str) -> Value {
        loop {
            let msg = self.recv().await;
            if msg["type"] == ty {
                return msg;
            }
        }
    }

    /// Asserts that nothing of the given type shows up within a short window.
    pub async fn expect_none(&mut self, ty: &str, window: Duration) {
        let deadline = tokio::time::Instant::now() + window;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return;
            }
            match tokio::time::timeout(remaining, self.ws.next()).await {
                Err(_) => return,
                Ok(Some(Ok(frame @ Message::Text(_)))) => {
                    let msg: Value =
                        serde_json::from_str(frame.to_text().expect("text frame")).expect("json");
                    assert_ne!(msg["type"], ty, "unexpected {ty}: {msg}");
                }
                Ok(Some(Ok(_))) => {}
                Ok(_) => return,
            }
        }
    }

    /// Waits for the server to close the socket and returns the close code.
    pub async fn recv_close_code(&mut self) -> Option<u16> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for close");
            match frame {
                Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
