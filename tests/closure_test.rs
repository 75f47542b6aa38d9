mod helpers;

use helpers::builders::*;
use helpers::db::TestDb;
use llinatge::closure;
use llinatge::entities::{self, admin_closure};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

async fn closure_rows(
    db: &sea_orm::DatabaseConnection,
    municipi_id: i64,
) -> Vec<(String, i64)> {
    let mut rows: Vec<(String, i64)> = entities::AdminClosure::find()
        .filter(admin_closure::Column::DescendantMunicipiId.eq(municipi_id))
        .all(db)
        .await
        .expect("Failed to read closure")
        .into_iter()
        .map(|r| (r.ancestor_type, r.ancestor_id))
        .collect();
    rows.sort();
    rows
}

#[tokio::test]
async fn test_rebuild_replaces_stale_rows() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_nivell(db, 5, "Girona", "provincia", 1).await;
    seed_nivell(db, 6, "La Garrotxa", "comarca", 1).await;
    seed_municipi(db, 10, "Besalú", None, None, Some(5), Some(6)).await;

    // Stale rows: an ancestor that no longer exists plus a wrong country.
    for (kind, id) in [("nivell", 99), ("pais", 7)] {
        admin_closure::ActiveModel {
            descendant_municipi_id: Set(10),
            ancestor_type: Set(kind.to_string()),
            ancestor_id: Set(id),
        }
        .insert(db)
        .await
        .expect("Failed to seed stale closure row");
    }

    closure::rebuild_for(db, 10).await.expect("Rebuild failed");

    let rows = closure_rows(db, 10).await;
    assert_eq!(
        rows,
        vec![
            ("municipi".to_string(), 10),
            ("nivell".to_string(), 5),
            ("nivell".to_string(), 6),
            ("pais".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_nivell(db, 5, "Girona", "provincia", 1).await;
    seed_municipi(db, 10, "Besalú", None, None, Some(5), None).await;

    closure::rebuild_for(db, 10).await.expect("First rebuild failed");
    let first = closure_rows(db, 10).await;

    closure::rebuild_for(db, 10).await.expect("Second rebuild failed");
    let second = closure_rows(db, 10).await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[tokio::test]
async fn test_municipality_without_levels_or_country() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_municipi(db, 20, "Perdut", None, None, None, None).await;
    closure::rebuild_for(db, 20).await.expect("Rebuild failed");

    // Only the self row.
    assert_eq!(closure_rows(db, 20).await, vec![("municipi".to_string(), 20)]);
}

#[tokio::test]
async fn test_own_country_wins_over_level_country() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_pais(db, 2, "Occitània").await;
    seed_nivell(db, 5, "Girona", "provincia", 1).await;
    seed_municipi(db, 30, "Frontera", Some(2), None, Some(5), None).await;

    closure::rebuild_for(db, 30).await.expect("Rebuild failed");

    let rows = closure_rows(db, 30).await;
    assert!(rows.contains(&("pais".to_string(), 2)));
    assert!(!rows.contains(&("pais".to_string(), 1)));
}

#[tokio::test]
async fn test_first_level_with_country_breaks_tie() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_pais(db, 2, "Occitània").await;
    // Region resolves country 2, province country 1; the region leads the
    // ordered chain.
    seed_nivell(db, 4, "Llenguadoc", "regio", 2).await;
    seed_nivell(db, 5, "Girona", "provincia", 1).await;
    seed_municipi(db, 40, "Disputat", None, Some(4), Some(5), None).await;

    closure::rebuild_for(db, 40).await.expect("Rebuild failed");

    let rows = closure_rows(db, 40).await;
    assert!(rows.contains(&("pais".to_string(), 2)));
    assert!(!rows.contains(&("pais".to_string(), 1)));
}

#[tokio::test]
async fn test_rebuild_all_continues_past_missing_rows() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_nivell(db, 5, "Girona", "provincia", 1).await;
    seed_municipi(db, 10, "Besalú", None, None, Some(5), None).await;
    seed_municipi(db, 11, "Banyoles", None, None, Some(5), None).await;

    let summary = closure::rebuild_all(db).await.expect("Rebuild failed");
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);

    assert_eq!(closure_rows(db, 10).await.len(), 3);
    assert_eq!(closure_rows(db, 11).await.len(), 3);
}
