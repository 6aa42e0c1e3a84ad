use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use student_roster::auth::{
    AuthEngine, DigestParams, PasswordDigester, Principal, Registration, Role, RoleSet, Session,
    SessionTokenManager,
};
use student_roster::error::{Result, RosterError};
use student_roster::storage::{CredentialStore, Identity, MemoryCredentialStore, NewIdentity};

const SESSION_KEY: &str = "k3y-for-signing-sessions-a9f0c7e2b4d6";

fn engine_with_store(store: Arc<dyn CredentialStore>) -> AuthEngine {
    let digester = PasswordDigester::new(DigestParams::minimal()).unwrap();
    let tokens = SessionTokenManager::new(SESSION_KEY, Duration::from_secs(3600));
    AuthEngine::new(store, digester, tokens).unwrap()
}

fn engine() -> (AuthEngine, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    (engine_with_store(store.clone()), store)
}

fn registration(username: &str, password: &str, role: &str) -> Registration {
    Registration {
        username: username.to_string(),
        password: password.to_string(),
        role: role.to_string(),
        name: format!("{} Name", username),
        email: None,
    }
}

#[tokio::test]
async fn test_register_then_login() {
    let (engine, _) = engine();

    let issued = engine
        .register(Registration {
            username: "alice".to_string(),
            password: "pw1".to_string(),
            role: "Teacher".to_string(),
            name: "Alice A".to_string(),
            email: Some("a@x.com".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(issued.principal.username(), "alice");
    assert!(!issued.token.is_empty());

    let session = engine.login("alice", "pw1").await.unwrap();
    assert_eq!(
        session.principal.roles(),
        &BTreeSet::from([Role::Teacher])
    );

    let wrong = engine.login("alice", "wrong").await;
    assert_eq!(wrong.unwrap_err(), RosterError::InvalidCredentials);

    assert!(!engine.username_available("alice").await.unwrap());
    assert!(engine.username_available("bob").await.unwrap());
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let (engine, _) = engine();
    engine.register(registration("s001", "right", "Student")).await.unwrap();

    let unknown = engine.login("nobody", "right").await.unwrap_err();
    let wrong = engine.login("s001", "nope").await.unwrap_err();

    assert_eq!(unknown, RosterError::InvalidCredentials);
    assert_eq!(unknown, wrong);
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_login_rejects_blank_fields() {
    let (engine, _) = engine();

    assert_eq!(engine.login("", "pw").await.unwrap_err(), RosterError::EmptyCredentials);
    assert_eq!(engine.login("   ", "pw").await.unwrap_err(), RosterError::EmptyCredentials);
    assert_eq!(engine.login("alice", "").await.unwrap_err(), RosterError::EmptyCredentials);
}

#[tokio::test]
async fn test_usernames_are_case_sensitive() {
    let (engine, _) = engine();
    engine.register(registration("Carol", "pw", "Student")).await.unwrap();

    assert_eq!(
        engine.login("carol", "pw").await.unwrap_err(),
        RosterError::InvalidCredentials
    );
    assert!(engine.username_available("carol").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_registration_leaves_store_untouched() {
    let (engine, store) = engine();
    engine.register(registration("dave", "first", "Student")).await.unwrap();

    let err = engine
        .register(registration("dave", "second", "Admin"))
        .await
        .unwrap_err();
    assert_eq!(err, RosterError::DuplicateUsername("dave".to_string()));
    assert_eq!(store.identity_count().await.unwrap(), 1);

    // The first account keeps its password and role
    let session = engine.login("dave", "first").await.unwrap();
    assert!(session.principal.has_role(Role::Student));
    assert!(!session.principal.has_role(Role::Admin));
    assert!(engine.login("dave", "second").await.is_err());
}

#[tokio::test]
async fn test_registration_field_checks() {
    let (engine, store) = engine();

    let mut missing_name = registration("erin", "pw", "Teacher");
    missing_name.name = "  ".to_string();
    assert_eq!(
        engine.register(missing_name).await.unwrap_err(),
        RosterError::MissingRequiredField("name")
    );

    assert_eq!(
        engine.register(registration("", "pw", "Teacher")).await.unwrap_err(),
        RosterError::MissingRequiredField("username")
    );
    assert_eq!(
        engine.register(registration("erin", "", "Teacher")).await.unwrap_err(),
        RosterError::MissingRequiredField("password")
    );
    assert_eq!(
        engine.register(registration("erin", "pw", "")).await.unwrap_err(),
        RosterError::MissingRequiredField("role")
    );
    assert_eq!(
        engine.register(registration("erin", "pw", "Janitor")).await.unwrap_err(),
        RosterError::InvalidRole("Janitor".to_string())
    );

    assert_eq!(store.identity_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_role_names_ignore_case() {
    let (engine, _) = engine();
    let issued = engine.register(registration("fay", "pw", "admin")).await.unwrap();
    assert!(issued.principal.has_role(Role::Admin));
}

#[tokio::test]
async fn test_concurrent_registration_has_one_winner() {
    let (engine, store) = engine();
    let engine = Arc::new(engine);

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.register(registration("bob", "pw-a", "Student")).await })
    };
    let second = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.register(registration("bob", "pw-b", "Teacher")).await })
    };

    let (first, second) = tokio::join!(first, second);
    let results = [first.unwrap(), second.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(RosterError::DuplicateUsername(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(store.identity_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let (engine, _) = engine();
    let issued = engine.register(registration("gus", "pw", "Student")).await.unwrap();

    let session = Session::from(issued.principal);
    let once = engine.logout(session).await;
    assert_eq!(once, Session::Anonymous);

    let twice = engine.logout(once).await;
    assert_eq!(twice, Session::Anonymous);
}

#[tokio::test]
async fn test_authorize_edges() {
    let (engine, _) = engine();
    let admin = Session::from(Principal::new("root", RoleSet::from([Role::Admin])));

    assert!(!engine.authorize(&Session::Anonymous, &RoleSet::from([Role::Admin])));
    assert!(!engine.authorize(&Session::Anonymous, &RoleSet::new()));
    assert!(engine.authorize(&admin, &RoleSet::new()));
    assert!(engine.authorize(&admin, &RoleSet::from([Role::Teacher, Role::Admin])));
    assert!(!engine.authorize(&admin, &RoleSet::from([Role::Student])));
}

#[tokio::test]
async fn test_resolve_round_trips_issued_token() {
    let (engine, _) = engine();
    let issued = engine.register(registration("hal", "pw", "Teacher")).await.unwrap();

    let session = engine.resolve(Some(&issued.token)).await;
    assert_eq!(session, Session::Authenticated(issued.principal));
}

#[tokio::test]
async fn test_resolve_rejects_bad_tokens() {
    let (engine, _) = engine();
    let issued = engine.register(registration("ida", "pw", "Teacher")).await.unwrap();

    let mut tampered = issued.token.clone();
    tampered.push('x');

    assert_eq!(engine.resolve(None).await, Session::Anonymous);
    assert_eq!(engine.resolve(Some("")).await, Session::Anonymous);
    assert_eq!(engine.resolve(Some("not.a.token")).await, Session::Anonymous);
    assert_eq!(engine.resolve(Some(&tampered)).await, Session::Anonymous);

    let other = SessionTokenManager::new("another-k3y-for-other-deployments-77c1", Duration::from_secs(60));
    let foreign = other.issue(&issued.principal).unwrap();
    assert_eq!(engine.resolve(Some(&foreign)).await, Session::Anonymous);
}

#[tokio::test]
async fn test_blank_username_is_never_available() {
    let (engine, _) = engine();
    assert!(!engine.username_available("").await.unwrap());
    assert!(!engine.username_available("   ").await.unwrap());
}

/// Store whose backend is always down
struct UnavailableStore;

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<Identity>> {
        Err(RosterError::StoreUnavailable("connection refused".to_string()))
    }

    async fn roles_of(&self, _identity_id: u64) -> Result<RoleSet> {
        Err(RosterError::StoreUnavailable("connection refused".to_string()))
    }

    async fn create(&self, _identity: NewIdentity, _role: Role) -> Result<Identity> {
        Err(RosterError::StoreUnavailable("connection refused".to_string()))
    }

    async fn username_exists(&self, _username: &str) -> Result<bool> {
        Err(RosterError::StoreUnavailable("connection refused".to_string()))
    }

    async fn identity_count(&self) -> Result<usize> {
        Err(RosterError::StoreUnavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_store_outage_is_not_reported_as_bad_credentials() {
    let engine = engine_with_store(Arc::new(UnavailableStore));

    assert!(matches!(
        engine.login("alice", "pw").await,
        Err(RosterError::StoreUnavailable(_))
    ));
    assert!(matches!(
        engine.register(registration("alice", "pw", "Student")).await,
        Err(RosterError::StoreUnavailable(_))
    ));
    assert!(matches!(
        engine.username_available("alice").await,
        Err(RosterError::StoreUnavailable(_))
    ));
}
