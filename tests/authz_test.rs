mod helpers;

use std::time::Duration;

use helpers::builders::*;
use helpers::db::TestDb;
use llinatge::authz::engine;
use llinatge::authz::policy;
use llinatge::authz::snapshot::PermissionStore;
use llinatge::authz::types::{ScopeKind, Target};
use llinatge::entities::{self, politica_grant};
use llinatge::storage;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

const TTL: Duration = Duration::from_secs(600);

fn book_target() -> Target {
    Target {
        pais_id: Some(1),
        provincia_id: Some(3),
        municipi_id: Some(5),
        arxiu_id: Some(7),
        arxiu_ids: vec![7],
        llibre_id: Some(42),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_snapshot_from_direct_binding() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "anna").await;
    seed_politica(db, 10, "editors", None).await;
    seed_grant(db, 10, "documentals.llibres.edit", "pais", Some(1), true).await;
    bind_usuari_politica(db, 1, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let snap = store.snapshot_for(1).await.expect("Snapshot failed");

    assert!(!snap.is_admin);
    assert!(engine::may(&snap, "documentals.llibres.edit", &book_target()));
    assert!(!engine::may(&snap, "documentals.llibres.moderate", &book_target()));
}

#[tokio::test]
async fn test_snapshot_through_group() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "anna").await;
    seed_grup(db, 20, "arxivers").await;
    bind_grup_membre(db, 20, 1).await;
    seed_politica(db, 10, "editors", None).await;
    seed_grant(db, 10, "documentals.arxius.edit", "municipi", Some(5), true).await;
    bind_grup_politica(db, 20, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let snap = store.snapshot_for(1).await.expect("Snapshot failed");

    let target = Target {
        municipi_id: Some(5),
        arxiu_id: Some(7),
        arxiu_ids: vec![7],
        ..Default::default()
    };
    assert!(engine::may(&snap, "documentals.arxius.edit", &target));
}

#[tokio::test]
async fn test_admin_policy_by_name() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "root").await;
    seed_politica(db, 10, "Admin", None).await;
    bind_usuari_politica(db, 1, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let snap = store.snapshot_for(1).await.expect("Snapshot failed");

    assert!(snap.is_admin);
    assert!(engine::may(&snap, "municipis.persones.moderate", &Target::default()));
}

#[tokio::test]
async fn test_legacy_document_expansion() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "arxiver").await;
    seed_politica(
        db,
        10,
        "llegat",
        Some(r#"{"Version":"2019-06-01","CanManageArxius":true}"#),
    )
    .await;
    bind_usuari_politica(db, 1, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let snap = store.snapshot_for(1).await.expect("Snapshot failed");

    assert!(!snap.is_admin);
    assert!(engine::may(&snap, "documentals.llibres.edit", &book_target()));
    assert!(!engine::has_any_grant_for(&snap, "territori.municipis.edit"));
}

#[tokio::test]
async fn test_legacy_admin_flag() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "root").await;
    seed_politica(
        db,
        10,
        "llegat-admin",
        Some(r#"{"Version":"2019-06-01","CanManageTot":true}"#),
    )
    .await;
    bind_usuari_politica(db, 1, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let snap = store.snapshot_for(1).await.expect("Snapshot failed");
    assert!(snap.is_admin);
}

#[tokio::test]
async fn test_version_bump_invalidates_cached_snapshot() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "anna").await;
    seed_politica(db, 10, "editors", None).await;
    seed_grant(db, 10, "documentals.llibres.edit", "pais", Some(1), true).await;
    bind_usuari_politica(db, 1, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let snap = store.snapshot_for(1).await.expect("Snapshot failed");
    assert!(engine::may(&snap, "documentals.llibres.edit", &book_target()));

    // Revoke the grant and bump the user's version; the cached snapshot is
    // keyed on the old version and must be rebuilt.
    entities::PoliticaGrant::delete_many()
        .filter(politica_grant::Column::PoliticaId.eq(10))
        .exec(db)
        .await
        .expect("Failed to delete grants");
    storage::bump_permissions_version(db, 1)
        .await
        .expect("Failed to bump version");

    let snap = store.snapshot_for(1).await.expect("Snapshot failed");
    assert!(!engine::may(&snap, "documentals.llibres.edit", &book_target()));
}

#[tokio::test]
async fn test_cached_snapshot_is_reused_within_ttl() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "anna").await;
    seed_politica(db, 10, "editors", None).await;
    seed_grant(db, 10, "documentals.llibres.edit", "pais", Some(1), true).await;
    bind_usuari_politica(db, 1, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let first = store.snapshot_for(1).await.expect("Snapshot failed");

    // Grants change but the version does not: the cached snapshot answers.
    entities::PoliticaGrant::delete_many()
        .filter(politica_grant::Column::PoliticaId.eq(10))
        .exec(db)
        .await
        .expect("Failed to delete grants");

    let second = store.snapshot_for(1).await.expect("Snapshot failed");
    assert!(engine::may(&second, "documentals.llibres.edit", &book_target()));
    assert_eq!(first.version, second.version);
}

#[tokio::test]
async fn test_unknown_user_is_an_error() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let store = PermissionStore::new(db.clone(), TTL);
    assert!(store.snapshot_for(999).await.is_err());
}

#[tokio::test]
async fn test_save_policy_document_round_trip() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "anna").await;
    seed_politica(db, 10, "editors", None).await;
    bind_usuari_politica(db, 1, 10).await;

    let raw = r#"{"Version":"2024-02-07","Statement":[{"Effect":"Allow","Action":["territori.municipis.view"],"Resource":["provincia:3/*"]}]}"#;
    let grants = policy::save_policy_document(db, 10, raw)
        .await
        .expect("Save failed");
    assert_eq!(grants.len(), 1);

    let stored = entities::PoliticaGrant::find()
        .filter(politica_grant::Column::PoliticaId.eq(10))
        .all(db)
        .await
        .expect("Failed to read grants");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].perm_key, "territori.municipis.view");
    assert_eq!(stored[0].scope_type, "provincia");
    assert_eq!(stored[0].scope_id, Some(3));
    assert_eq!(stored[0].include_children, 1);

    // Saving bumped the bound user's version.
    let user = storage::get_usuari(db, 1).await.unwrap().unwrap();
    assert_eq!(user.permissions_version, 1);

    // Re-emit and compare bytes.
    let specs = policy::compile_document(&policy::parse_document(raw).unwrap()).unwrap();
    let emitted = serde_json::to_string(&policy::document_from_grants("2024-02-07", &specs))
        .expect("Emit failed");
    assert_eq!(emitted, raw);
}

#[tokio::test]
async fn test_save_policy_document_rejects_invalid() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_politica(db, 10, "editors", None).await;
    seed_grant(db, 10, "documentals.llibres.edit", "pais", Some(1), true).await;

    let raw = r#"{"Version":"2024-02-07","Statement":[{"Effect":"Allow","Action":["no.such.action"]}]}"#;
    assert!(policy::save_policy_document(db, 10, raw).await.is_err());

    // No partial write: the prior grant is still there.
    let stored = entities::PoliticaGrant::find()
        .filter(politica_grant::Column::PoliticaId.eq(10))
        .all(db)
        .await
        .expect("Failed to read grants");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].perm_key, "documentals.llibres.edit");
}

#[tokio::test]
async fn test_list_scope_filter_from_db_snapshot() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_usuari(db, 1, "anna").await;
    seed_politica(db, 10, "editors", None).await;
    seed_grant(db, 10, "documentals.llibres.view", "provincia", Some(3), true).await;
    seed_grant(db, 10, "documentals.llibres.view", "arxiu", Some(7), false).await;
    bind_usuari_politica(db, 1, 10).await;

    let store = PermissionStore::new(db.clone(), TTL);
    let snap = store.snapshot_for(1).await.expect("Snapshot failed");

    let filter = engine::list_scope_filter(&snap, "documentals.llibres.view", ScopeKind::Llibre);
    assert!(!filter.global);
    assert_eq!(filter.scopes[&ScopeKind::Provincia], vec![3]);
    assert!(!filter.scopes.contains_key(&ScopeKind::Arxiu));
}
