//! Integration tests for the `tokendex-db` persistence layer.
//!
//! Each test opens a fresh database file in its own temporary directory,
//! so tests are independent and need no external services.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;
use tokendex_db::{
    Collection, Database, DbError, EntityRepository, SCHEMA_VERSION, SettingsRepository,
    SharedDatabase, SqliteConfig, TxMode,
};
use tokendex_types::{BalanceRecord, EntityId, NewEntity, Rarity};

// =============================================================================
// Helpers
// =============================================================================

async fn open_temp() -> (TempDir, Database) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = SqliteConfig::for_path(&dir.path().join("tokendex.db"));
    let db = Database::open_or_create(&config)
        .await
        .expect("Failed to open database");
    (dir, db)
}

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn new_entity(name: &str, rarity: Rarity, minutes: i64) -> NewEntity {
    NewEntity {
        name: name.to_owned(),
        prompt: format!("a creature called {name}"),
        image_url: format!("https://img.example/{name}.png"),
        rarity,
        created_at: at(minutes),
    }
}

async fn reject_entity_writes(db: &Database, event: &str) {
    let sql = format!(
        "CREATE TRIGGER reject_{event} BEFORE {event} ON entities \
         BEGIN SELECT RAISE(ABORT, 'rejected by test'); END"
    );
    sqlx::query(&sql)
        .execute(db.pool())
        .await
        .expect("Failed to create trigger");
}

async fn allow_entity_writes(db: &Database, event: &str) {
    sqlx::query(&format!("DROP TRIGGER reject_{event}"))
        .execute(db.pool())
        .await
        .expect("Failed to drop trigger");
}

// =============================================================================
// Persistence engine
// =============================================================================

#[tokio::test]
async fn open_creates_collections_and_stamps_version() {
    let (_dir, db) = open_temp().await;

    assert_eq!(db.schema_version().await.unwrap(), SCHEMA_VERSION);

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('entities', 'settings') ORDER BY name",
    )
    .fetch_all(db.pool())
    .await
    .unwrap();
    assert_eq!(tables, vec!["entities".to_owned(), "settings".to_owned()]);
}

#[tokio::test]
async fn reopening_is_a_no_op_and_keeps_data() {
    let dir = TempDir::new().unwrap();
    let config = SqliteConfig::for_path(&dir.path().join("tokendex.db"));

    let db = Database::open_or_create(&config).await.unwrap();
    let inserted = EntityRepository::new(&db)
        .insert(new_entity("pebblit", Rarity::D, 0))
        .await
        .unwrap();
    SettingsRepository::new(&db).set_balance(42).await.unwrap();
    db.close().await;

    let reopened = Database::open_or_create(&config).await.unwrap();
    assert_eq!(reopened.schema_version().await.unwrap(), SCHEMA_VERSION);
    let all = EntityRepository::new(&reopened).list_all().await.unwrap();
    assert_eq!(all, vec![inserted]);
    assert_eq!(
        SettingsRepository::new(&reopened).get_balance().await.unwrap(),
        Some(42)
    );
}

#[tokio::test]
async fn newer_schema_is_refused() {
    let dir = TempDir::new().unwrap();
    let config = SqliteConfig::for_path(&dir.path().join("tokendex.db"));

    let db = Database::open_or_create(&config).await.unwrap();
    sqlx::query("PRAGMA user_version = 99")
        .execute(db.pool())
        .await
        .unwrap();
    db.close().await;

    let result = Database::open_or_create(&config).await;
    assert!(matches!(
        result,
        Err(DbError::UnsupportedVersion { found: 99, supported: SCHEMA_VERSION })
    ));
}

#[tokio::test]
async fn unreachable_path_is_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    let config = SqliteConfig::for_path(&dir.path().join("missing").join("deeper").join("x.db"));

    let result = Database::open_or_create(&config).await;
    assert!(matches!(result, Err(DbError::StorageUnavailable(_))));
}

#[tokio::test]
async fn in_memory_database_survives_across_transactions() {
    let db = Database::open_or_create(&SqliteConfig::new("sqlite::memory:"))
        .await
        .unwrap();
    let settings = SettingsRepository::new(&db);
    settings.set_balance(7).await.unwrap();
    assert_eq!(settings.get_balance().await.unwrap(), Some(7));
}

#[tokio::test]
async fn shared_database_opens_once() {
    let dir = TempDir::new().unwrap();
    let shared = SharedDatabase::new(SqliteConfig::for_path(&dir.path().join("tokendex.db")));
    assert!(!shared.is_open());

    let first = shared.get_or_open().await.unwrap();
    let second = shared.get_or_open().await.unwrap();
    assert!(shared.is_open());
    assert!(std::ptr::eq(first, second));
}

#[tokio::test]
async fn failed_operation_rolls_back_every_write() {
    let (_dir, db) = open_temp().await;

    let payload = new_entity("ghost", Rarity::A, 0);
    let result: Result<(), DbError> = db
        .run_transaction(Collection::Entities, TxMode::ReadWrite, move |tx| {
            Box::pin(async move {
                tx.add(&payload).await?;
                tx.add(&payload).await?;
                Err(DbError::Config("abort after two writes".to_owned()))
            })
        })
        .await;
    assert!(matches!(result, Err(DbError::Config(_))));

    assert!(EntityRepository::new(&db).list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn committed_operation_returns_its_result() {
    let (_dir, db) = open_temp().await;

    let payload = new_entity("first", Rarity::C, 0);
    let (id, seen) = db
        .run_transaction(Collection::Entities, TxMode::ReadWrite, move |tx| {
            Box::pin(async move {
                let id = tx.add(&payload).await?;
                let seen = tx.contains(id).await?;
                Ok((id, seen))
            })
        })
        .await
        .unwrap();
    assert!(seen);

    let stored = EntityRepository::new(&db).get(EntityId(id)).await.unwrap();
    assert_eq!(stored.map(|e| e.name), Some("first".to_owned()));
}

#[tokio::test]
async fn read_mode_rejects_writes() {
    let (_dir, db) = open_temp().await;

    let result = db
        .run_transaction(Collection::Settings, TxMode::Read, |tx| {
            Box::pin(async move { tx.put("tokenBalance", &BalanceRecord::new(1)).await })
        })
        .await;
    assert!(matches!(
        result,
        Err(DbError::ReadOnly { collection: Collection::Settings, mode: TxMode::Read })
    ));
    assert_eq!(SettingsRepository::new(&db).get_balance().await.unwrap(), None);
}

#[tokio::test]
async fn keys_must_match_the_collection() {
    let (_dir, db) = open_temp().await;

    let by_name = db
        .run_transaction(Collection::Entities, TxMode::Read, |tx| {
            Box::pin(async move { tx.get::<NewEntity>("tokenBalance").await })
        })
        .await;
    assert!(matches!(by_name, Err(DbError::KeyMismatch { .. })));

    let auto_key = db
        .run_transaction(Collection::Settings, TxMode::ReadWrite, |tx| {
            Box::pin(async move { tx.add(&BalanceRecord::new(1)).await })
        })
        .await;
    assert!(matches!(
        auto_key,
        Err(DbError::KeyMismatch { collection: Collection::Settings })
    ));
}

#[tokio::test]
async fn closed_store_fails_transactions() {
    let (_dir, db) = open_temp().await;
    db.close().await;

    let result = SettingsRepository::new(&db).set_balance(5).await;
    assert!(matches!(
        result,
        Err(DbError::TransactionFailed { collection: Collection::Settings, .. })
    ));
}

// =============================================================================
// Entity repository
// =============================================================================

#[tokio::test]
async fn list_all_is_newest_first() {
    let (_dir, db) = open_temp().await;
    let repo = EntityRepository::new(&db);

    let t1 = repo.insert(new_entity("one", Rarity::F, 1)).await.unwrap();
    let t3 = repo.insert(new_entity("three", Rarity::S, 3)).await.unwrap();
    let t2 = repo.insert(new_entity("two", Rarity::B, 2)).await.unwrap();

    let all = repo.list_all().await.unwrap();
    assert_eq!(all, vec![t3, t2, t1]);
}

#[tokio::test]
async fn identities_increase_and_are_never_reused() {
    let (_dir, db) = open_temp().await;
    let repo = EntityRepository::new(&db);

    let a = repo.insert(new_entity("a", Rarity::F, 0)).await.unwrap();
    let b = repo.insert(new_entity("b", Rarity::F, 1)).await.unwrap();
    assert!(b.id > a.id);

    assert!(repo.delete(b.id).await.unwrap());
    let c = repo.insert(new_entity("c", Rarity::F, 2)).await.unwrap();
    assert!(c.id > b.id, "id {} was reused", c.id);
}

#[tokio::test]
async fn failed_insert_consumes_no_identity() {
    let (_dir, db) = open_temp().await;
    let repo = EntityRepository::new(&db);

    let first = repo.insert(new_entity("first", Rarity::F, 0)).await.unwrap();

    reject_entity_writes(&db, "INSERT").await;
    let failed = repo.insert(new_entity("lost", Rarity::F, 1)).await;
    assert!(matches!(
        failed,
        Err(DbError::TransactionFailed { collection: Collection::Entities, .. })
    ));
    allow_entity_writes(&db, "INSERT").await;

    let next = repo.insert(new_entity("next", Rarity::F, 2)).await.unwrap();
    assert_eq!(next.id.0, first.id.0 + 1);
    assert_eq!(repo.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_a_missing_id_is_a_no_op() {
    let (_dir, db) = open_temp().await;
    let repo = EntityRepository::new(&db);

    let kept = repo.insert(new_entity("kept", Rarity::E, 0)).await.unwrap();
    assert!(!repo.delete(EntityId(999)).await.unwrap());
    assert_eq!(repo.list_all().await.unwrap(), vec![kept]);
}

#[tokio::test]
async fn update_rewrites_editable_fields() {
    let (_dir, db) = open_temp().await;
    let repo = EntityRepository::new(&db);

    let mut entity = repo.insert(new_entity("draft", Rarity::A, 0)).await.unwrap();
    entity.name = "Final".to_owned();
    entity.prompt = "a final form".to_owned();
    repo.update(&entity).await.unwrap();

    assert_eq!(repo.get(entity.id).await.unwrap(), Some(entity));
}

#[tokio::test]
async fn update_of_missing_id_fails_and_creates_nothing() {
    let (_dir, db) = open_temp().await;
    let repo = EntityRepository::new(&db);

    let phantom = new_entity("phantom", Rarity::B, 0).with_id(EntityId(41));
    let result = repo.update(&phantom).await;
    assert!(matches!(result, Err(DbError::NotFound { collection: Collection::Entities, .. })));
    assert!(repo.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_cannot_change_rarity() {
    let (_dir, db) = open_temp().await;
    let repo = EntityRepository::new(&db);

    let original = repo.insert(new_entity("steady", Rarity::D, 0)).await.unwrap();
    let mut tampered = original.clone();
    tampered.rarity = Rarity::SPlus;

    let result = repo.update(&tampered).await;
    assert!(matches!(result, Err(DbError::ImmutableField { field: "rarity" })));
    assert_eq!(repo.get(original.id).await.unwrap(), Some(original));
}

// =============================================================================
// Settings repository
// =============================================================================

#[tokio::test]
async fn balance_is_unset_until_initialized() {
    let (_dir, db) = open_temp().await;
    let settings = SettingsRepository::new(&db);

    assert_eq!(settings.get_balance().await.unwrap(), None);
    assert_eq!(settings.initialize_balance(100).await.unwrap(), 100);
    assert_eq!(settings.get_balance().await.unwrap(), Some(100));
}

#[tokio::test]
async fn initialize_keeps_an_existing_balance() {
    let (_dir, db) = open_temp().await;
    let settings = SettingsRepository::new(&db);

    settings.set_balance(0).await.unwrap();
    assert_eq!(settings.initialize_balance(100).await.unwrap(), 0);
    assert_eq!(settings.get_balance().await.unwrap(), Some(0));
}

#[tokio::test]
async fn set_balance_overwrites_without_validation() {
    let (_dir, db) = open_temp().await;
    let settings = SettingsRepository::new(&db);

    settings.set_balance(10).await.unwrap();
    settings.set_balance(-3).await.unwrap();
    assert_eq!(settings.get_balance().await.unwrap(), Some(-3));
}

#[tokio::test]
async fn balance_record_has_the_fixed_layout() {
    let (_dir, db) = open_temp().await;
    SettingsRepository::new(&db).set_balance(55).await.unwrap();

    let (id, value): (String, String) =
        sqlx::query_as("SELECT id, value FROM settings")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(id, "tokenBalance");
    let record: BalanceRecord = serde_json::from_str(&value).unwrap();
    assert_eq!(record, BalanceRecord::new(55));
}
