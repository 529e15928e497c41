use admin_console::models::{NewUser, RecipientInput};
use admin_console::auth_api::AuthApi;
use admin_console::recipient_api::RecipientsApi;
use admin_console::{ApiError, FormErrors, Role};
use httpmock::prelude::*;
use serde_json::json;

mod support;
use support::TestContext;

#[tokio::test]
async fn duplicate_email_is_left_to_the_form() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    ctx.sign_in("tenant_admin", "opaque", "refresh-1");

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/users/");
            then.status(400)
                .json_body(json!({ "email": ["already exists"] }));
        })
        .await;

    let err = AuthApi::new(ctx.client.clone())
        .create_user(&NewUser {
            username: "dup".into(),
            email: "dup@example.com".into(),
            password: "pw".into(),
            role: Role::Staff,
            first_name: None,
            last_name: None,
        })
        .await
        .expect_err("validation");

    assert!(matches!(err, ApiError::Validation { .. }));
    assert!(ctx.notifier.toasts().is_empty());
    assert_eq!(ctx.client.history().len(), 1);

    let form = FormErrors::from_api_error(&err, &["username", "email", "password"]);
    assert_eq!(form.first("email"), Some("already exists"));
    assert!(form.summary().is_none());
}

#[tokio::test]
async fn request_level_validation_message_is_toasted() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    ctx.sign_in("staff", "opaque", "refresh-1");

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/tenant-staff/recipients/bulk/");
            then.status(400)
                .json_body(json!({ "detail": "Recipient limit reached for this tenant" }));
        })
        .await;

    let err = RecipientsApi::new(ctx.client.clone())
        .bulk_create(&[RecipientInput {
            email: "a@b.test".into(),
            ..RecipientInput::default()
        }])
        .await
        .expect_err("limit");

    assert!(err.field_errors().is_none());
    assert_eq!(
        ctx.notifier.toasts(),
        vec!["Recipient limit reached for this tenant".to_string()]
    );
    let form = FormErrors::from_api_error(&err, &["email"]);
    assert_eq!(form.summary(), Some("Recipient limit reached for this tenant"));
}
