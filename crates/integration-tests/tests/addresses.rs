//! End-to-end tests for the address book.
//!
//! Run with: cargo test -p shopvely-integration-tests -- --ignored

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use shopvely_integration_tests::Session;

fn defaults(addresses: &Value) -> Vec<i64> {
    addresses
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["is_default"] == true)
        .map(|a| a["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_at_most_one_default_address() {
    let customer = Session::customer().await;
    let first = customer.create_address("1 First St", true).await;
    let second = customer.create_address("2 Second St", false).await;
    let third = customer.create_address("3 Third St", true).await;

    let (_, list) = customer.call(Method::GET, "/addresses/", None).await;
    assert_eq!(defaults(&list), vec![third]);

    let (status, body) = customer
        .call(Method::POST, &format!("/addresses/{second}/set-default/"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_default"], true);

    let (_, list) = customer.call(Method::GET, "/addresses/", None).await;
    assert_eq!(defaults(&list), vec![second]);
    assert_eq!(list.as_array().unwrap().len(), 3);

    // Setting the same default again changes nothing
    customer
        .call(Method::POST, &format!("/addresses/{second}/set-default/"), None)
        .await;
    let (_, list) = customer.call(Method::GET, "/addresses/", None).await;
    assert_eq!(defaults(&list), vec![second]);

    // A PATCH to default moves the flag too
    customer
        .call(
            Method::PATCH,
            &format!("/addresses/{first}/"),
            Some(json!({ "is_default": true })),
        )
        .await;
    let (_, list) = customer.call(Method::GET, "/addresses/", None).await;
    assert_eq!(defaults(&list), vec![first]);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_addresses_are_private() {
    let owner = Session::customer().await;
    let address = owner.create_address("5 Private Rd", false).await;

    let other = Session::customer().await;
    for method in [Method::GET, Method::DELETE] {
        let (status, body) = other
            .call(method, &format!("/addresses/{address}/"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Address not found");
    }

    let (status, _) = other
        .call(Method::POST, &format!("/addresses/{address}/set-default/"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_blank_required_field_is_rejected() {
    let customer = Session::customer().await;
    let (status, body) = customer
        .call(
            Method::POST,
            "/addresses/",
            Some(json!({
                "full_name": "Asha Rao",
                "phone": "9999900000",
                "line1": "   ",
                "city": "Pune",
                "state": "MH",
                "pincode": "411001",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "line1 may not be blank");
}
