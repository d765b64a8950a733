//! End-to-end tests for amount and quantity ceilings, and concurrent cart adds.
//!
//! Run with: cargo test -p shopvely-integration-tests -- --ignored

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::json;
use tokio::task::JoinSet;

use shopvely_integration_tests::Session;

const TOTAL_TOO_LARGE: &str = "total cannot exceed ₹99999999.99";

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_oversized_cart_is_rejected_and_left_unchanged() {
    let staff = Session::staff().await;
    let product = staff.create_product("100.00").await;
    let customer = Session::customer().await;

    let (status, body) = customer
        .call(
            Method::POST,
            "/cart/",
            Some(json!({ "product_id": product, "quantity": 1_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], format!("cart {TOTAL_TOO_LARGE}"));

    let (status, cart) = customer.call(Method::GET, "/cart/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    assert_eq!(cart["total"], "0.00");

    // Raising an existing line past the limit rolls back too
    let (_, cart) = customer
        .call(Method::POST, "/cart/", Some(json!({ "product_id": product })))
        .await;
    let item_id = cart["items"][0]["id"].as_i64().unwrap();
    let (status, _) = customer
        .call(
            Method::PATCH,
            "/cart/",
            Some(json!({ "item_id": item_id, "quantity": 1_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cart) = customer.call(Method::GET, "/cart/", None).await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_line_quantity_overflow_is_rejected() {
    let staff = Session::staff().await;
    let freebie = staff.create_product("0.00").await;
    let customer = Session::customer().await;

    let (status, _) = customer
        .call(
            Method::POST,
            "/cart/",
            Some(json!({ "product_id": freebie, "quantity": i32::MAX })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = customer
        .call(Method::POST, "/cart/", Some(json!({ "product_id": freebie })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "quantity is too large");

    let (_, cart) = customer.call(Method::GET, "/cart/", None).await;
    assert_eq!(cart["items"][0]["quantity"], i32::MAX);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_concurrent_adds_keep_every_unit() {
    let staff = Session::staff().await;
    let product = staff.create_product("1.00").await;
    let customer = Arc::new(Session::customer().await);

    let mut adds = JoinSet::new();
    for _ in 0..10 {
        let customer = Arc::clone(&customer);
        adds.spawn(async move {
            customer
                .call(
                    Method::POST,
                    "/cart/",
                    Some(json!({ "product_id": product, "quantity": 2 })),
                )
                .await
                .0
        });
    }
    while let Some(status) = adds.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let (_, cart) = customer.call(Method::GET, "/cart/", None).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 20);
    assert_eq!(cart["total"], "20.00");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_oversized_orders_are_rejected() {
    let staff = Session::staff().await;
    let product = staff.create_product("100.00").await;
    let customer = Session::customer().await;
    let address = customer.create_address("1 Limit Rd", true).await;

    let (status, body) = customer
        .call(
            Method::POST,
            "/orders/",
            Some(json!({
                "address_id": address,
                "items": [{ "product_id": product, "quantity": 1_000_000 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], format!("order {TOTAL_TOO_LARGE}"));

    let (_, orders) = customer.call(Method::GET, "/orders/", None).await;
    assert_eq!(orders.as_array().unwrap().len(), 0);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_item_mutation_past_limit_keeps_order() {
    let staff = Session::staff().await;
    let product = staff.create_product("60000000.00").await;
    let customer = Session::customer().await;
    let address = customer.create_address("2 Limit Rd", true).await;

    let (status, order) = customer
        .call(
            Method::POST,
            "/orders/",
            Some(json!({
                "address_id": address,
                "items": [{ "product_id": product, "quantity": 1 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    let order_id = order["id"].as_i64().unwrap();
    let item_id = order["items"][0]["id"].as_i64().unwrap();

    let (status, body) = staff
        .call(
            Method::PATCH,
            &format!("/orders/{order_id}/items/{item_id}/"),
            Some(json!({ "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], format!("order {TOTAL_TOO_LARGE}"));

    let (_, order) = customer
        .call(Method::GET, &format!("/orders/{order_id}/"), None)
        .await;
    assert_eq!(order["total_amount"], "60000000.00");
    assert_eq!(order["items"][0]["quantity"], 1);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_oversized_product_price_is_rejected() {
    let staff = Session::staff().await;

    let (status, body) = staff
        .call(
            Method::POST,
            "/products/",
            Some(json!({ "title": "Gold Kettle", "price": "100000000.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["detail"]
            .as_str()
            .unwrap()
            .contains("amount cannot exceed ₹99999999.99"),
        "{body}"
    );
}
