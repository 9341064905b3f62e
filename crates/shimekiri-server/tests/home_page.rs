// SPDX-License-Identifier: Apache-2.0

//! Home page and session lifecycle, as a browser would see them.

mod support;

use support::{get, header_value, login, spawn_app};

#[tokio::test]
async fn the_home_page_shows_the_app_heading() {
    let app = spawn_app().await;
    let (status, _, body) = get(app.addr, "/", None).await;
    assert_eq!(status, 200);
    assert!(body.contains("Todo!!"));
}

#[tokio::test]
async fn anonymous_visitors_see_the_login_link() {
    let app = spawn_app().await;
    let (status, _, body) = get(app.addr, "/", None).await;
    assert_eq!(status, 200);
    assert!(body.contains(">Login</a>"));
    assert!(!body.contains("マイページ"));
}

#[tokio::test]
async fn logged_in_visitors_see_home_and_mypage_links() {
    let app = spawn_app().await;
    let cookie = login(&app).await;
    let (status, _, body) = get(app.addr, "/", Some(&cookie)).await;
    assert_eq!(status, 200);
    assert!(body.contains(">Home</a>"));
    assert!(body.contains("マイページ"));
    assert!(!body.contains(">Login</a>"));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = spawn_app().await;
    let cookie = login(&app).await;

    let (status, head, _) = get(app.addr, "/auth/logout", Some(&cookie)).await;
    assert_eq!(status, 302);
    assert_eq!(header_value(&head, "location").as_deref(), Some("/"));

    // The old token no longer resolves; the page is anonymous again.
    let (_, _, body) = get(app.addr, "/", Some(&cookie)).await;
    assert!(body.contains(">Login</a>"));
}

#[tokio::test]
async fn unknown_profiles_are_not_found() {
    let app = spawn_app().await;
    let (status, _, _) = get(app.addr, "/users/nobody", None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let app = spawn_app().await;
    let (status, _, body) = get(app.addr, "/healthz", None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn version_reports_the_crate() {
    let app = spawn_app().await;
    let (status, _, body) = get(app.addr, "/version", None).await;
    assert_eq!(status, 200);
    let version: serde_json::Value = serde_json::from_str(&body).expect("version json");
    assert_eq!(version["name"], "shimekiri-server");
}
