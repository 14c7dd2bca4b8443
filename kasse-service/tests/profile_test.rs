//! Profile policy and balance-correction integration tests.

mod common;

use axum::http::{Method, StatusCode};
use common::{spawn_app, unique};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn owner_may_edit_bio_but_not_protected_fields() {
    let app = spawn_app().await;
    let (id, token) = app.register(&unique("owner"), false).await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/profiles/{}", id),
            Some(&token),
            Some(json!({ "bio": "decaf only" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "decaf only");

    // Protected fields are rejected by key, even with unchanged values.
    for payload in [
        json!({ "balance": "0.00" }),
        json!({ "is_freeloader": false }),
        json!({ "bio": "sneaky", "balance": "100.00" }),
    ] {
        let (status, _) = app
            .request(
                Method::PATCH,
                &format!("/profiles/{}", id),
                Some(&token),
                Some(payload),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // The denied requests changed nothing.
    assert_eq!(
        app.balance(&token, id).await,
        Decimal::from_str("0.00").unwrap()
    );
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn staff_may_set_any_profile_field() {
    let app = spawn_app().await;
    let (id, _) = app.register(&unique("member"), false).await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/profiles/{}", id),
            Some(&staff_token),
            Some(json!({ "is_freeloader": true, "balance": "12.34", "bio": "on the house" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_freeloader"], true);
    assert_eq!(body["balance"], "12.34");
    assert_eq!(body["bio"], "on the house");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn cross_owner_profile_update_is_forbidden() {
    let app = spawn_app().await;
    let (alice_id, _) = app.register(&unique("alice"), false).await;
    let (_, bob_token) = app.register(&unique("bob"), false).await;

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/profiles/{}", alice_id),
            Some(&bob_token),
            Some(json!({ "bio": "graffiti" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn add_balance_is_additive_and_staff_only() {
    let app = spawn_app().await;
    let (id, token) = app.register(&unique("member"), false).await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;

    app.set_balance(id, "10.00").await;

    // Non-staff denied, including the owner.
    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/profiles/{}/add-balance", id),
            Some(&token),
            Some(json!({ "balance": "5.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/profiles/{}/add-balance", id),
            Some(&staff_token),
            Some(json!({ "balance": "5.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "15.00");

    // Negative amounts are corrections.
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/profiles/{}/add-balance", id),
            Some(&staff_token),
            Some(json!({ "balance": "-2.50" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "12.50");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn profile_listing_filters_leniently() {
    let app = spawn_app().await;
    let marker = unique("biomark");
    let (a_id, token) = app.register(&unique("member_a"), false).await;
    let (b_id, _) = app.register(&unique("member_b"), false).await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;

    for (id, bio) in [(a_id, format!("{} tea", marker)), (b_id, format!("{} mate", marker))] {
        let (status, _) = app
            .request(
                Method::PATCH,
                &format!("/profiles/{}", id),
                Some(&staff_token),
                Some(json!({ "bio": bio })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    app.set_freeloader(b_id).await;

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/profiles?bio={}", marker),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app
        .request(
            Method::GET,
            &format!("/profiles?bio={}&is_freeloader=1", marker),
            Some(&token),
            None,
        )
        .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"].as_i64(), Some(b_id));

    // Malformed flag is dropped, not an error.
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/profiles?bio={}&is_freeloader=yes", marker),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn profiles_have_no_create_or_delete_route() {
    let app = spawn_app().await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/profiles",
            Some(&staff_token),
            Some(json!({ "bio": "orphan" })),
        )
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app
        .request(Method::DELETE, "/profiles/1", Some(&staff_token), None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
