//! Shared helpers for backend integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gcd_core::{ClassroomClient, Config, MemoryStore, Navigator, SessionCookie, SessionStore};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const COOKIE_VALUE: &str = "MTcwMDAwMDAwMHxzZXNzaW9u";

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// A store already holding a live session cookie.
pub fn signed_in_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_cookie(SessionCookie::new(
        "gcd_session",
        COOKIE_VALUE,
        "/",
    )))
}

pub fn client(server_url: &str, store: Arc<dyn SessionStore>) -> ClassroomClient {
    let config = Config {
        server_url: server_url.to_string(),
        ..Config::default()
    };
    ClassroomClient::new(config, store).expect("build client")
}

/// URL of a local port nothing is listening on.
pub fn closed_server_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Serves one connection: answers with `head` and `first_chunk`, then keeps
/// the connection open without finishing the body. Returns the base URL.
pub async fn stalling_server(head: &'static str, first_chunk: &'static [u8]) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(first_chunk).await;
        let _ = socket.flush().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
    });
    format!("http://{addr}")
}

pub fn three_courses() -> Value {
    json!([
        {"id": "a", "name": "Math"},
        {"id": "b", "name": "Art"},
        {"id": "c", "name": "CS"}
    ])
}

/// Navigator that records targets instead of opening them.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn open_external(&self, url: &str) -> anyhow::Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
