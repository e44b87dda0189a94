//! User repository against a live PostgreSQL
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p userdb-core -- --ignored
//!
//! Tests share `t_users`, so pool-backed tests only assert on rows they
//! created. Tests that need an exact table snapshot work inside a
//! transaction that is rolled back afterwards.

use std::collections::HashSet;

use userdb_core::{DbError, PgDataSource, User, UserRepo, UserStore};
use uuid::Uuid;

async fn setup() -> (PgDataSource, UserRepo) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let source = PgDataSource::from_url(url).expect("valid config");
    let repo = UserRepo::new(source.pool().expect("pool").clone());
    repo.migrate().await.expect("migration failed");
    (source, repo)
}

#[tokio::test]
#[ignore = "requires database"]
async fn migrate_is_idempotent() {
    let (_source, repo) = setup().await;

    repo.migrate().await.expect("second migration");
    repo.migrate().await.expect("third migration");
}

#[tokio::test]
#[ignore = "requires database"]
async fn save_generates_id_when_unset() {
    let (_source, repo) = setup().await;

    let mut user = User::with_id(Uuid::nil(), "Alice");
    let id = repo.save(&mut user).await.expect("save");

    assert!(!id.is_nil());
    assert_eq!(user.id, id);

    let found = repo.find_by_id(id).await.expect("find").expect("row exists");
    assert_eq!(found, User::with_id(id, "Alice"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn save_keeps_supplied_id() {
    let (_source, repo) = setup().await;

    let mut user = User::new("Dana");
    let supplied = user.id;
    let id = repo.save(&mut user).await.expect("save");

    assert_eq!(id, supplied);
}

#[tokio::test]
#[ignore = "requires database"]
async fn save_existing_id_conflicts_and_leaves_row() {
    let (_source, repo) = setup().await;

    let mut original = User::new("Erin");
    let id = repo.save(&mut original).await.expect("save");

    let mut duplicate = User::with_id(id, "Mallory");
    let err = repo.save(&mut duplicate).await.unwrap_err();
    assert!(matches!(err, DbError::Conflict { resource: "user", .. }));

    let found = repo.find_by_id(id).await.expect("find").expect("row exists");
    assert_eq!(found.name, "Erin");
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_and_delete_unknown_id_are_not_found() {
    let (_source, repo) = setup().await;
    let ghost = User::new("Ghost");

    let err = repo.update(&ghost).await.unwrap_err();
    assert!(err.is_not_found());

    let err = repo.delete(&ghost).await.unwrap_err();
    assert!(err.is_not_found());

    assert!(repo.find_by_id(ghost.id).await.expect("find").is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_and_delete_unset_id_are_usage_errors() {
    let (_source, repo) = setup().await;
    let unset = User::with_id(Uuid::nil(), "Nobody");

    assert!(repo.update(&unset).await.unwrap_err().is_usage());
    assert!(repo.delete(&unset).await.unwrap_err().is_usage());
}

#[tokio::test]
#[ignore = "requires database"]
async fn full_lifecycle() {
    let (_source, repo) = setup().await;

    let mut user = User::with_id(Uuid::nil(), "Alice");
    let id = repo.save(&mut user).await.expect("save");
    assert_eq!(
        repo.find_by_id(id).await.expect("find"),
        Some(User::with_id(id, "Alice"))
    );

    let renamed = User::with_id(id, "Alice2");
    assert_eq!(repo.update(&renamed).await.expect("update"), id);
    assert_eq!(
        repo.find_by_id(id).await.expect("find"),
        Some(User::with_id(id, "Alice2"))
    );

    assert_eq!(repo.delete(&renamed).await.expect("delete"), id);
    assert_eq!(repo.find_by_id(id).await.expect("find"), None);
}

#[tokio::test]
#[ignore = "requires database"]
async fn get_all_contains_saved_users() {
    let (_source, repo) = setup().await;

    let mut ids = HashSet::new();
    for name in ["User 1", "User 2", "User 3"] {
        let mut user = User::new(name);
        ids.insert(repo.save(&mut user).await.expect("save"));
    }

    let all = repo.get_all().await.expect("get_all");
    let found: HashSet<Uuid> = all
        .iter()
        .map(|u| u.id)
        .filter(|id| ids.contains(id))
        .collect();

    assert_eq!(found, ids);
}

#[tokio::test]
#[ignore = "requires database"]
async fn get_all_returns_exactly_saved_rows() {
    let (source, repo) = setup().await;

    let mut tx = source.begin_transaction().await.expect("begin");
    tx.create_command("DELETE FROM t_users")
        .await
        .expect("command")
        .execute()
        .await
        .expect("clear table");

    let mut expected = Vec::new();
    for name in ["Ann", "Ben", "Cid", "Dee"] {
        let mut user = User::new(name);
        repo.save_in(&mut tx, &mut user).await.expect("save");
        expected.push(user);
    }

    let mut all = repo.get_all_in(&mut tx).await.expect("get_all");
    all.sort_by_key(|u| u.id);
    expected.sort_by_key(|u| u.id);
    assert_eq!(all, expected);

    // keep the shared table intact for concurrently running tests
    tx.rollback().await.expect("rollback");
    tx.close().await.expect("close");
}
