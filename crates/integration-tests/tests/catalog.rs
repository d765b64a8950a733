//! End-to-end tests for the catalog, wishlist and cart.
//!
//! Run with: cargo test -p shopvely-integration-tests -- --ignored

use reqwest::{Client, Method, StatusCode};
use serde_json::json;

use shopvely_integration_tests::{Session, api_base_url, decode, unique};

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_only_staff_edit_the_catalog() {
    let customer = Session::customer().await;
    let (status, body) = customer
        .call(
            Method::POST,
            "/products/",
            Some(json!({ "title": "Nope", "price": "1.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["detail"],
        "You do not have permission to perform this action."
    );

    let staff = Session::staff().await;
    let (status, body) = staff
        .call(
            Method::POST,
            "/products/",
            Some(json!({ "title": "Bad rating", "price": "1.00", "rating": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "rating must be between 0 and 5");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_catalog_search_and_wishlist_flag() {
    let staff = Session::staff().await;
    let title = unique("Searchable");
    let (status, product) = staff
        .call(
            Method::POST,
            "/products/",
            Some(json!({ "title": title, "price": "42.00", "rating": 4.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_i64().unwrap();

    // Anonymous search. The title is alphanumeric, so it needs no escaping.
    let resp = Client::new()
        .get(format!(
            "{}/api/products/?q={}&min_price=40",
            api_base_url(),
            title.to_lowercase()
        ))
        .send()
        .await
        .unwrap();
    let (status, list) = decode(resp).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["is_in_wishlist"], false);

    let customer = Session::customer().await;
    let (status, _) = customer
        .call(
            Method::POST,
            "/products/wishlist/",
            Some(json!({ "product_id": product_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = customer
        .call(Method::GET, &format!("/products/{product_id}/"), None)
        .await;
    assert_eq!(detail["is_in_wishlist"], true);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_wishlist_duplicates_and_missing_entries() {
    let staff = Session::staff().await;
    let product = staff.create_product("5.00").await;
    let customer = Session::customer().await;
    let body = json!({ "product_id": product });

    let (status, _) = customer
        .call(Method::POST, "/products/wishlist/", Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = customer
        .call(Method::POST, "/products/wishlist/", Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "Product already in wishlist");

    let (_, wishlist) = customer.call(Method::GET, "/products/wishlist/", None).await;
    assert_eq!(wishlist["products"].as_array().unwrap().len(), 1);

    let (status, _) = customer
        .call(Method::DELETE, "/products/wishlist/", Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = customer
        .call(Method::DELETE, "/products/wishlist/", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "Product not in wishlist");

    let (status, err) = customer
        .call(Method::POST, "/products/wishlist/", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "product_id is required");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_cart_add_update_remove() {
    let staff = Session::staff().await;
    let product = staff.create_product("12.50").await;
    let customer = Session::customer().await;

    customer
        .call(Method::POST, "/cart/", Some(json!({ "product_id": product })))
        .await;
    let (_, cart) = customer
        .call(
            Method::POST,
            "/cart/",
            Some(json!({ "product_id": product, "quantity": 2 })),
        )
        .await;
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["total"], "37.50");
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let (status, err) = customer
        .call(
            Method::POST,
            "/cart/",
            Some(json!({ "product_id": product, "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "quantity must be positive");

    let (_, cart) = customer
        .call(
            Method::PATCH,
            "/cart/",
            Some(json!({ "item_id": item_id, "quantity": 5 })),
        )
        .await;
    assert_eq!(cart["items"][0]["quantity"], 5);

    let (_, cart) = customer
        .call(
            Method::PATCH,
            "/cart/",
            Some(json!({ "item_id": item_id, "quantity": 0 })),
        )
        .await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let (status, err) = customer
        .call(Method::DELETE, "/cart/", Some(json!({ "item_id": item_id })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["detail"], "Cart item not found");
}
