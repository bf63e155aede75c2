//! Account and contact endpoints.

mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use common::{ADMIN, OWNER_X, PASSWORD, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_sign_up_awaiting_confirmation() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "new@example.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "new@example.com");
    assert!(body["session"].is_null());
    assert!(body["message"].as_str().unwrap().contains("confirm"));
}

#[tokio::test]
async fn test_sign_up_rejections() {
    let app = TestApp::new();

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "not-an-email", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "taken@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already registered");
}

#[tokio::test]
async fn test_sign_in_hides_failure_cause() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "x@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Email or password is incorrect.");

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "x@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], OWNER_X);
    assert_eq!(body["user"]["is_admin"], false);
}

#[tokio::test]
async fn test_me_and_sign_out() {
    let app = TestApp::new();

    let (status, body) = app.call("GET", "/api/auth/me", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], true);

    let (status, _) = app.call("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("POST", "/api/auth/signout", Some(OWNER_X), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(*app.identity.signed_out.lock().unwrap(), vec![OWNER_X.to_string()]);
}

#[tokio::test]
async fn test_password_reset() {
    let app = TestApp::new();
    let body = json!({ "email": "x@example.com" });

    let (status, _) = app
        .call("POST", "/api/auth/password-reset", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    app.identity.reset_fails.store(true, Ordering::SeqCst);
    let (status, response) = app
        .call("POST", "/api/auth/password-reset", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        response["error"],
        "Could not send the reset email. Check the address and try again."
    );
}

#[tokio::test]
async fn test_contact_form() {
    let app = TestApp::new();
    let inquiry = json!({
        "name": "Kim",
        "email": "kim@example.com",
        "subject": "League",
        "message": "Do you run leagues?"
    });

    let (status, _) = app
        .call("POST", "/api/contact", None, Some(inquiry.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    {
        let submitted = app.contact.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].subject, "League");
    }

    let mut invalid = inquiry.clone();
    invalid["email"] = json!("nope");
    let (status, _) = app.call("POST", "/api/contact", None, Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.contact.failing.store(true, Ordering::SeqCst);
    let (status, body) = app.call("POST", "/api/contact", None, Some(inquiry)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Could not send your message. Please try again later.");
}

#[tokio::test]
async fn test_email_whitespace_is_trimmed_before_validation() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": " new@example.com ", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["email"], "new@example.com");

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "\tx@example.com ", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["email"], "x@example.com");

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/password-reset",
            None,
            Some(json!({ "email": " x@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_contact_fields_are_trimmed_before_validation() {
    let app = TestApp::new();
    let inquiry = json!({
        "name": " Kim ",
        "email": " kim@example.com ",
        "subject": "League",
        "message": "Do you run leagues?"
    });

    let (status, _) = app.call("POST", "/api/contact", None, Some(inquiry.clone())).await;
    assert_eq!(status, StatusCode::OK);
    {
        let submitted = app.contact.submitted.lock().unwrap();
        assert_eq!(submitted[0].name, "Kim");
        assert_eq!(submitted[0].email, "kim@example.com");
    }

    let mut blank_name = inquiry;
    blank_name["name"] = json!("   ");
    let (status, _) = app.call("POST", "/api/contact", None, Some(blank_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
