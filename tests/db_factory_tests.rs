//! Tests for repository type selection and factory construction.

mod support;

use std::str::FromStr;

use support::with_scoped_env;
use transit_catalog::db::repository::UserRepository;
use transit_catalog::db::{RepositoryConfig, RepositoryFactory, RepositoryType};

#[test]
fn test_repository_type_parsing() {
    assert_eq!(
        RepositoryType::from_str("local").unwrap(),
        RepositoryType::Local
    );
    assert_eq!(
        RepositoryType::from_str("LOCAL").unwrap(),
        RepositoryType::Local
    );
    assert_eq!(
        RepositoryType::from_str("postgres").unwrap(),
        RepositoryType::Postgres
    );
    assert_eq!(
        RepositoryType::from_str("pg").unwrap(),
        RepositoryType::Postgres
    );
    assert!(RepositoryType::from_str("sqlite").is_err());
}

#[test]
fn test_repository_type_from_env_defaults_to_local() {
    let repo_type = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        RepositoryType::from_env,
    );
    assert_eq!(repo_type, RepositoryType::Local);
}

#[test]
fn test_repository_type_from_env_prefers_explicit_setting() {
    let repo_type = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://ignored")),
        ],
        RepositoryType::from_env,
    );
    assert_eq!(repo_type, RepositoryType::Local);
}

#[test]
fn test_repository_type_from_env_infers_postgres_from_url() {
    let repo_type = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/catalog")),
        ],
        RepositoryType::from_env,
    );
    assert_eq!(repo_type, RepositoryType::Postgres);
}

#[tokio::test]
async fn test_factory_creates_local_repository() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_factory_from_env_builds_local_when_unconfigured() {
    // Resolve the type under the scoped env; building a local repository has
    // no further env dependencies.
    let repo_type = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        RepositoryType::from_env,
    );
    assert_eq!(repo_type, RepositoryType::Local);

    let repo = RepositoryFactory::create(repo_type, None).await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[test]
fn test_config_file_local_roundtrip() {
    let toml = r#"
[repository]
type = "local"
"#;
    let config: RepositoryConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
    assert!(config.to_postgres_config().unwrap().is_none());
}

#[test]
fn test_config_file_rejects_unknown_type() {
    let toml = r#"
[repository]
type = "cloud"
"#;
    let config: RepositoryConfig = toml::from_str(toml).unwrap();
    assert!(config.repository_type().is_err());
}
