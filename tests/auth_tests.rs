//! Integration tests for registration, credential verification, and the
//! token lifecycle against the in-memory repository.

use transit_catalog::auth::{self, AuthConfig, AuthError, TokenService};
use transit_catalog::db::repositories::LocalRepository;
use transit_catalog::db::repository::{RepositoryError, UserRepository};
use transit_catalog::models::UserChanges;

fn tokens() -> TokenService {
    TokenService::new(&AuthConfig::new("integration-test-secret"))
}

#[tokio::test]
async fn test_register_then_verify() {
    let repo = LocalRepository::new();

    let user = auth::register(&repo, "ada", "ada@example.com", "s3cret")
        .await
        .unwrap();
    assert_eq!(user.username, "ada");
    // The stored value is a digest, never the plaintext.
    assert_ne!(user.hashed_password, "s3cret");

    let verified = auth::verify(&repo, "ada", "s3cret").await.unwrap();
    assert_eq!(verified.id, user.id);
}

#[tokio::test]
async fn test_verify_wrong_password_and_unknown_user_look_alike() {
    let repo = LocalRepository::new();
    auth::register(&repo, "ada", "ada@example.com", "s3cret")
        .await
        .unwrap();

    let wrong = auth::verify(&repo, "ada", "nope").await.unwrap_err();
    let unknown = auth::verify(&repo, "ghost", "nope").await.unwrap_err();
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert!(matches!(unknown, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let repo = LocalRepository::new();
    auth::register(&repo, "one", "same@example.com", "pw1")
        .await
        .unwrap();

    let err = auth::register(&repo, "two", "same@example.com", "pw2")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[tokio::test]
async fn test_password_change_invalidates_old_password() {
    let repo = LocalRepository::new();
    let user = auth::register(&repo, "ada", "ada@example.com", "old-password")
        .await
        .unwrap();

    repo.update_user(
        user.id,
        UserChanges {
            hashed_password: Some(auth::hash_password("new-password")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        auth::verify(&repo, "ada", "old-password").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(auth::verify(&repo, "ada", "new-password").await.is_ok());
}

#[tokio::test]
async fn test_login_flow_token_names_the_user() {
    let repo = LocalRepository::new();
    auth::register(&repo, "ada", "ada@example.com", "s3cret")
        .await
        .unwrap();

    let user = auth::verify(&repo, "ada", "s3cret").await.unwrap();
    let service = tokens();
    let token = service.issue(&user.username).unwrap();

    let subject = service.validate(&token).unwrap();
    assert_eq!(subject, "ada");

    let reloaded = repo.find_user_by_username(&subject).await.unwrap();
    assert!(reloaded.is_some());
}

#[tokio::test]
async fn test_token_from_other_service_is_rejected() {
    let token = tokens().issue("ada").unwrap();
    let other = TokenService::new(&AuthConfig::new("different-secret"));
    assert!(matches!(
        other.validate(&token),
        Err(AuthError::InvalidToken)
    ));
}

#[test]
fn test_auth_config_ttl_override() {
    let config = AuthConfig::new("secret").with_token_ttl(std::time::Duration::from_secs(60));
    assert_eq!(config.token_ttl, std::time::Duration::from_secs(60));
}
