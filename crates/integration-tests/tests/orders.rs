//! End-to-end tests for order administration and invoices.
//!
//! Run with: cargo test -p shopvely-integration-tests -- --ignored

use reqwest::{Method, StatusCode};
use serde_json::json;

use shopvely_core::OrderStatus;
use shopvely_integration_tests::Session;

/// Place a direct order for `quantity` units of a fresh 100.00 product.
async fn place_order(staff: &Session, customer: &Session) -> i64 {
    let product = staff.create_product("100.00").await;
    let address = customer.create_address("123 Main St", true).await;

    let (status, order) = customer
        .call(
            Method::POST,
            "/orders/",
            Some(json!({
                "address_id": address,
                "items": [{ "product_id": product, "quantity": 2 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["total_amount"], "200.00");
    order["id"].as_i64().unwrap()
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_status_changes_follow_lifecycle() {
    let staff = Session::staff().await;
    let customer = Session::customer().await;
    let order = place_order(&staff, &customer).await;
    let path = format!("/orders/{order}/status/");

    // Customers cannot change status
    let (status, _) = customer
        .call(Method::PATCH, &path, Some(json!({ "status": "processing" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unchanged status adds no history
    let (status, body) = staff
        .call(Method::PATCH, &path, Some(json!({ "status": "pending" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_history"].as_array().unwrap().len(), 1);

    // Skipping a step is rejected
    let (status, body) = staff
        .call(Method::PATCH, &path, Some(json!({ "status": "delivered" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "cannot change order status from pending to delivered"
    );

    let mut current = OrderStatus::Pending;
    for next in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        assert!(current.can_transition_to(next));
        let (status, body) = staff
            .call(Method::PATCH, &path, Some(json!({ "status": next })))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], next.as_str());
        assert_eq!(body["status_history"][0]["old_status"], current.as_str());
        assert_eq!(body["status_history"][0]["new_status"], next.as_str());
        current = next;
    }

    // Delivered is terminal
    let (status, _) = staff
        .call(Method::PATCH, &path, Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, detail) = customer
        .call(Method::GET, &format!("/orders/{order}/"), None)
        .await;
    assert_eq!(detail["status_history"].as_array().unwrap().len(), 4);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_item_mutation_recomputes_total() {
    let staff = Session::staff().await;
    let customer = Session::customer().await;
    let order = place_order(&staff, &customer).await;

    let (_, detail) = customer
        .call(Method::GET, &format!("/orders/{order}/"), None)
        .await;
    let item = detail["items"][0]["id"].as_i64().unwrap();
    let path = format!("/orders/{order}/items/{item}/");

    let (status, body) = staff
        .call(Method::PATCH, &path, Some(json!({ "quantity": 5 })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total_amount"], "500.00");

    let (status, body) = staff
        .call(Method::PATCH, &path, Some(json!({ "quantity": 0 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], "0.00");
    assert_eq!(body["items"].as_array().unwrap().len(), 0);

    let (status, _) = staff
        .call(Method::PATCH, &path, Some(json!({ "quantity": 1 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_orders_and_invoices_are_private() {
    let staff = Session::staff().await;
    let customer = Session::customer().await;
    let order = place_order(&staff, &customer).await;

    let stranger = Session::customer().await;
    let (status, body) = stranger
        .call(Method::GET, &format!("/orders/{order}/"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Order not found.");

    let invoice = format!("/orders/{order}/invoice/");
    let resp = stranger.request(Method::GET, &invoice).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    for session in [&customer, &staff] {
        let resp = session.request(Method::GET, &invoice).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = resp.text().await.unwrap();
        assert!(html.contains(&format!("Invoice #{order}")));
        assert!(html.contains("₹200.00"));
    }
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_direct_order_validation() {
    let customer = Session::customer().await;
    let address = customer.create_address("4 Valid Rd", false).await;

    let (status, body) = customer
        .call(
            Method::POST,
            "/orders/",
            Some(json!({ "address_id": address, "items": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "items may not be empty");

    let (status, body) = customer
        .call(
            Method::POST,
            "/orders/",
            Some(json!({
                "address_id": address,
                "items": [{ "product_id": i32::MAX, "quantity": 1 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Product not found");
}
