//! Beverage catalog integration tests.

mod common;

use axum::http::{Method, StatusCode};
use common::{spawn_app, unique};
use serde_json::json;

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn catalog_writes_are_staff_only() {
    let app = spawn_app().await;
    let (_, member_token) = app.register(&unique("member"), false).await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/beverage-types",
            Some(&member_token),
            Some(json!({ "name": "Smuggled Soda", "price": "1.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::POST,
            "/beverage-types",
            Some(&staff_token),
            Some(json!({ "name": "Espresso", "price": "1.80" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["price"], "1.80");
    let id = body["id"].as_i64().unwrap();

    // Members can read.
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/beverage-types/{}", id),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Espresso");

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/beverage-types/{}", id),
            Some(&member_token),
            Some(json!({ "price": "0.01" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/beverage-types/{}", id),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn negative_price_is_a_validation_error() {
    let app = spawn_app().await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/beverage-types",
            Some(&staff_token),
            Some(json!({ "name": "Refund Juice", "price": "-1.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn name_filter_matches_case_insensitive_substrings() {
    let app = spawn_app().await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;
    let marker = unique("brew");
    app.create_beverage(&staff_token, &format!("{} Cold Brew", marker), "2.50")
        .await;
    app.create_beverage(&staff_token, &format!("{} Hot Chocolate", marker), "2.00")
        .await;

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/beverage-types?name={}", marker.to_uppercase()),
            Some(&staff_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app
        .request(
            Method::GET,
            &format!("/beverage-types?name={}%20cold", marker),
            Some(&staff_token),
            None,
        )
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn deleting_a_type_cascades_to_its_purchases() {
    let app = spawn_app().await;
    let (buyer_id, token) = app.register(&unique("buyer"), false).await;
    let (_, staff_token) = app.register(&unique("staff"), true).await;
    let doomed = app.create_beverage(&staff_token, "Discontinued", "1.00").await;
    let kept = app.create_beverage(&staff_token, "Evergreen", "1.00").await;

    for beverage in [doomed, kept] {
        let (status, _) = app
            .request(
                Method::POST,
                "/purchases",
                Some(&token),
                Some(json!({ "user": buyer_id, "beverage_type": beverage })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/beverage-types/{}", doomed),
            Some(&staff_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Only the purchase of the surviving type remains; the balance is
    // untouched by the cascade.
    let (_, body) = app
        .request(
            Method::GET,
            &format!("/purchases?user={}", buyer_id),
            Some(&token),
            None,
        )
        .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["beverage_type"], format!("/beverage-types/{}", kept));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn missing_type_is_404() {
    let app = spawn_app().await;
    let (_, token) = app.register(&unique("member"), false).await;

    let (status, _) = app
        .request(Method::GET, "/beverage-types/99999999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
