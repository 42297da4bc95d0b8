/*!
 * Authentication Integration Tests
 *
 * Covers registration and login against a real temporary database:
 * - Registration (public view, duplicate detection, case-sensitivity policy)
 * - Input rules (weak passwords, bad usernames)
 * - Login (success, identical failure for unknown user and wrong password)
 * - Tokens issued by the service verify back to the same identity
 */

mod common;

use cashflow_server::auth::AuthError;
use cashflow_server::password::verify_password;
use common::*;

#[tokio::test]
async fn register_returns_public_user_and_token() {
    let env = setup_test_environment().await;

    let session = env
        .auth()
        .register("  alice  ", TEST_PASSWORD, Some("Alice A."))
        .await
        .expect("registration should succeed");

    assert_eq!(session.user.username, "alice");
    assert_eq!(session.user.name.as_deref(), Some("Alice A."));
    assert!(!session.user.id.is_empty());

    let identity = env.tokens.verify(&session.token).expect("token should verify");
    assert_eq!(identity.user_id, session.user.id);
    assert_eq!(identity.username, "alice");

    let json = serde_json::to_value(&session.user).unwrap();
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn password_is_stored_hashed() {
    let env = setup_test_environment().await;
    env.create_user("alice").await;

    let user = env
        .users()
        .find_by_username("alice")
        .await
        .unwrap()
        .expect("user should exist");

    assert_ne!(user.password_hash, TEST_PASSWORD);
    assert!(verify_password(TEST_PASSWORD, &user.password_hash).unwrap());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let env = setup_test_environment().await;
    env.create_user("alice").await;

    let err = env
        .auth()
        .register("alice", "another-password", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::DuplicateUser));
}

#[tokio::test]
async fn usernames_are_case_sensitive() {
    let env = setup_test_environment().await;
    let lower = env.create_user("alice").await;
    let upper = env.create_user("Alice").await;

    assert_ne!(lower, upper);

    // Login must match the exact case used at registration.
    let session = env.auth().login("Alice", TEST_PASSWORD).await.unwrap();
    assert_eq!(session.user.id, upper);
    assert!(matches!(
        env.auth().login("ALICE", TEST_PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn concurrent_duplicate_registrations_do_not_both_succeed() {
    let env = setup_test_environment().await;

    let (a, b) = tokio::join!(
        env.auth().register("racer", TEST_PASSWORD, None),
        env.auth().register("racer", TEST_PASSWORD, None),
    );

    let successes = [a.is_ok(), b.is_ok()].into_iter().filter(|ok| *ok).count();
    assert_eq!(successes, 1);
    let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(failure, AuthError::DuplicateUser));
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let env = setup_test_environment().await;

    let err = env.auth().register("alice", "12345", None).await.unwrap_err();

    assert!(matches!(err, AuthError::WeakPassword));
    assert!(env.users().find_by_username("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_usernames_are_rejected() {
    let env = setup_test_environment().await;

    for bad in ["ab", "   ", "white space", "semi;colon"] {
        let err = env.auth().register(bad, TEST_PASSWORD, None).await.unwrap_err();
        assert!(
            matches!(err, AuthError::InvalidUsername(_)),
            "expected InvalidUsername for {:?}, got {:?}",
            bad,
            err
        );
    }
}

#[tokio::test]
async fn login_succeeds_with_correct_password() {
    let env = setup_test_environment().await;
    let id = env.create_user("alice").await;

    let session = env.auth().login("alice", TEST_PASSWORD).await.unwrap();

    assert_eq!(session.user.id, id);
    assert_eq!(env.tokens.verify(&session.token).unwrap().user_id, id);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let env = setup_test_environment().await;
    env.create_user("alice").await;

    let wrong_password = env.auth().login("alice", "wrong-password").await.unwrap_err();
    let unknown_user = env.auth().login("nobody", TEST_PASSWORD).await.unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn deleting_user_cascades_to_entries() {
    let env = setup_test_environment().await;
    let id = env.create_user("alice").await;
    env.entries().seed_demo(&id).await.unwrap();

    let removed = env.users().delete(&id).await.unwrap();

    assert_eq!(removed, Some(6));
    assert!(env.users().find_by_id(&id).await.unwrap().is_none());
    assert!(matches!(
        env.auth().login("alice", TEST_PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert_eq!(env.users().delete(&id).await.unwrap(), None);
}
