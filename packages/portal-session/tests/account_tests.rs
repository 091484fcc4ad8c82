mod common;

use crate::common::TestPortal;
use portal_session::account::CHANGE_PASSWORD_PATH;
use portal_session::testing::MockTransport;
use portal_session::{ChangePasswordForm, Role, SessionError};
use serde_json::json;

fn form(new: &str, confirm: &str) -> ChangePasswordForm {
    ChangePasswordForm {
        old_password: "old-pw".to_string(),
        new_password: new.to_string(),
        confirm_password: confirm.to_string(),
    }
}

#[tokio::test]
async fn change_password_sends_authorized_put() {
    let transport = MockTransport::new().with_success(CHANGE_PASSWORD_PATH, json!(null));
    let t = TestPortal::signed_in(Role::Student, Role::Student, transport);

    assert!(t
        .portal
        .account()
        .change_password(&form("new-pw", "new-pw"))
        .await
        .unwrap());

    let calls = t.transport.calls_to(CHANGE_PASSWORD_PATH);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, reqwest::Method::PUT);
    assert_eq!(calls[0].header("Authorization"), Some("Bearer t1"));
    assert_eq!(
        calls[0].body,
        Some(json!({
            "oldPassword": "old-pw",
            "newPassword": "new-pw",
            "confirmPassword": "new-pw",
        }))
    );
}

#[tokio::test]
async fn refused_change_returns_false() {
    let transport = MockTransport::new().with_response(
        CHANGE_PASSWORD_PATH,
        200,
        json!({ "code": 400, "message": "Old password is wrong" }),
    );
    let t = TestPortal::signed_in(Role::Teacher, Role::Teacher, transport);

    assert!(!t
        .portal
        .account()
        .change_password(&form("new-pw", "new-pw"))
        .await
        .unwrap());
    assert!(t.portal.session().is_authenticated());
}

#[tokio::test]
async fn change_password_requires_a_session() {
    let transport = MockTransport::new().with_success(CHANGE_PASSWORD_PATH, json!(null));
    let t = TestPortal::new(Role::Admin, transport);

    let result = t.portal.account().change_password(&form("a", "a")).await;
    assert!(matches!(result, Err(SessionError::AuthenticationRequired)));
    assert!(t.transport.calls().is_empty());
}

#[tokio::test]
async fn mismatched_confirmation_sends_nothing() {
    let t = TestPortal::signed_in(Role::Admin, Role::Admin, MockTransport::new());

    let result = t
        .portal
        .account()
        .change_password(&form("new-pw", "new-pwx"))
        .await;
    assert!(matches!(result, Err(SessionError::InvalidInput(_))));
    assert!(t.transport.calls().is_empty());
}
