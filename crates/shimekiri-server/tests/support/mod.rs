// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use chrono::NaiveDate;
use shimekiri_model::ExternalIdentity;
use shimekiri_server::{build_router, AppState, FakeIdentityProvider, FixedClock};
use shimekiri_store::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Evaluation date every test app is pinned to.
pub const TODAY: &str = "2025-06-15";
pub const TOMORROW: &str = "2025-06-16";

pub struct TestApp {
    pub addr: SocketAddr,
    pub provider: Arc<FakeIdentityProvider>,
}

pub async fn spawn_app() -> TestApp {
    let store = Store::open_in_memory().expect("open store");
    let provider = Arc::new(FakeIdentityProvider::default());
    let today = NaiveDate::parse_from_str(TODAY, "%Y-%m-%d").expect("test date");
    let state = AppState::new(
        store,
        provider.clone(),
        Arc::new(FixedClock::new(today)),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    TestApp { addr, provider }
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    cookie: Option<&str>,
    body: Option<&str>,
) -> (u16, String, Vec<u8>) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\n");
    if let Some(cookie) = cookie {
        req.push_str(&format!("Cookie: {cookie}\r\n"));
    }
    if let Some(body) = body {
        req.push_str("Content-Type: application/x-www-form-urlencoded\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("Connection: close\r\n\r\n");
    if let Some(body) = body {
        req.push_str(body);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let separator = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("http response separator");
    let head = String::from_utf8_lossy(&response[..separator]).to_string();
    let body = response[separator + 4..].to_vec();
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head, body)
}

pub async fn get(
    addr: SocketAddr,
    path: &str,
    cookie: Option<&str>,
) -> (u16, String, String) {
    let (status, head, body) = send_raw(addr, "GET", path, cookie, None).await;
    (status, head, String::from_utf8_lossy(&body).to_string())
}

pub async fn get_bytes(
    addr: SocketAddr,
    path: &str,
    cookie: Option<&str>,
) -> (u16, String, Vec<u8>) {
    send_raw(addr, "GET", path, cookie, None).await
}

pub async fn post_form(
    addr: SocketAddr,
    path: &str,
    cookie: Option<&str>,
    body: &str,
) -> (u16, String, String) {
    let (status, head, body) = send_raw(addr, "POST", path, cookie, Some(body)).await;
    (status, head, String::from_utf8_lossy(&body).to_string())
}

pub fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (header, value) = line.split_once(':')?;
        if header.eq_ignore_ascii_case(name) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// Runs the login flow and hands back the session cookie pair.
pub async fn login(app: &TestApp) -> String {
    let (status, head, _) = get(app.addr, "/auth/callback", None).await;
    assert_eq!(status, 302, "login must redirect");
    assert_eq!(header_value(&head, "location").as_deref(), Some("/"));
    let set_cookie = header_value(&head, "set-cookie").expect("session cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

/// Points the provider double at another identity, then logs in as it.
pub async fn login_as(app: &TestApp, provider_id: &str, nickname: &str) -> String {
    app.provider
        .set_identity(ExternalIdentity {
            provider_id: provider_id.to_string(),
            nickname: nickname.to_string(),
            name: format!("{nickname}user"),
            avatar_url: format!("https://avatars.example/285/{nickname}.png"),
        })
        .await;
    login(app).await
}
