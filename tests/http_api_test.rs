mod common;

use std::sync::Arc;

use atrium::{
    api,
    auth::AuthService,
    config::Settings,
    domain::{AnnouncementType, UserRole},
    repository::{
        CreditRepository, SqliteAnnouncementRepository, SqliteCreditRepository,
        SqliteDocumentRepository, SqliteReadReceiptRepository, SqliteUserRepository,
    },
    service::ServiceContext,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{create_announcement, create_user, test_pool};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt;

async fn test_app() -> anyhow::Result<(Router, SqlitePool)> {
    let pool = test_pool().await?;
    let settings = Settings::default();

    let auth_service = Arc::new(AuthService::new(pool.clone()));
    let service_context = Arc::new(ServiceContext::new(
        Arc::new(SqliteUserRepository::new(pool.clone())),
        Arc::new(SqliteAnnouncementRepository::new(pool.clone())),
        Arc::new(SqliteReadReceiptRepository::new(pool.clone())),
        Arc::new(SqliteCreditRepository::new(pool.clone())),
        Arc::new(SqliteDocumentRepository::new(pool.clone())),
        auth_service,
        &settings,
    ));

    let app = api::create_app(service_context, Arc::new(settings));

    Ok((app, pool))
}

async fn login(app: &Router, email: &str) -> anyhow::Result<String> {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({ "email": email, "password": "password123" }))?,
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets a session cookie")
        .to_str()?
        .split(';')
        .next()
        .unwrap()
        .to_string();

    Ok(cookie)
}

async fn body_json(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_is_public() -> anyhow::Result<()> {
    let (app, _pool) = test_app().await?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_summary_requires_session() -> anyhow::Result<()> {
    let (app, _pool) = test_app().await?;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/announcements/summary")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_read_receipt_flow_over_http() -> anyhow::Result<()> {
    let (app, pool) = test_app().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    create_user(&pool, "reader", UserRole::Member).await?;
    let announcement =
        create_announcement(&pool, admin.id, "Maintenance", AnnouncementType::Important).await?;

    let cookie = login(&app, "reader@example.com").await?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/announcements/summary")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await?;
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["unread"], 1);
    assert_eq!(summary["important"], 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/announcements/{}/read", announcement.id))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let marked = body_json(response).await?;
    assert_eq!(marked["ok"], true);
    assert!(marked["read_at"].is_string());

    // The cached summary must not survive the receipt write.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/announcements/unread-count")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    let count = body_json(response).await?;
    assert_eq!(count["unread_count"], 0);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/announcements/summary")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    let summary = body_json(response).await?;
    assert_eq!(summary["unread"], 0);

    // Marking a missing announcement is a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/announcements/{}/read", uuid::Uuid::new_v4()))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_credit_consume_over_http() -> anyhow::Result<()> {
    let (app, pool) = test_app().await?;
    let member = create_user(&pool, "spender", UserRole::Member).await?;

    let credit_repo = SqliteCreditRepository::new(pool.clone());
    credit_repo.grant(member.id, 40, "Registration credits").await?;

    let cookie = login(&app, "spender@example.com").await?;

    // Overdraw: payment-required with the error shape, nothing written.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/credits/consume")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(
                    &json!({ "amount": 100, "description": "Lead export" }),
                )?))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await?;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/credits/consume")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(
                    &json!({ "amount": 25, "description": "Lead export" }),
                )?))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["credits"], 15);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/credits")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    let body = body_json(response).await?;
    assert_eq!(body["credits"], 15);

    Ok(())
}

#[tokio::test]
async fn test_admin_routes_are_forbidden_for_members() -> anyhow::Result<()> {
    let (app, pool) = test_app().await?;
    create_user(&pool, "plain", UserRole::Member).await?;

    let cookie = login(&app, "plain@example.com").await?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/credits/distribute")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/stats")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_user_stats_for_admin() -> anyhow::Result<()> {
    let (app, pool) = test_app().await?;
    create_user(&pool, "admin", UserRole::Admin).await?;
    create_user(&pool, "member", UserRole::Member).await?;

    let cookie = login(&app, "admin@example.com").await?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/stats")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await?;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["active"], 2);
    assert_eq!(stats["disabled"], 0);
    assert_eq!(stats["admin_count"], 1);

    Ok(())
}
