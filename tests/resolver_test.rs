mod helpers;

use helpers::builders::*;
use helpers::db::TestDb;
use llinatge::authz::resolver::TargetResolver;
use llinatge::authz::types::ScopeKind;
use llinatge::settings;

fn cache_settings() -> settings::Cache {
    settings::Cache::default()
}

#[tokio::test]
async fn test_resolve_municipi_hydrates_level_chain() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_nivell(db, 2, "Nord-est", "regio", 1).await;
    seed_nivell(db, 3, "Girona", "provincia", 1).await;
    seed_nivell(db, 6, "La Garrotxa", "comarca", 1).await;
    seed_municipi(db, 5, "Besalú", None, Some(2), Some(3), Some(6)).await;

    let resolver = TargetResolver::new(db.clone(), &cache_settings());
    let target = resolver.resolve_municipi(5).await.expect("Resolve failed");

    assert_eq!(target.municipi_id, Some(5));
    assert_eq!(target.regio_id, Some(2));
    assert_eq!(target.provincia_id, Some(3));
    assert_eq!(target.comarca_id, Some(6));
    assert_eq!(target.pais_id, Some(1));
    assert_eq!(target.most_specific_scope(), Some(ScopeKind::Municipi));
}

#[tokio::test]
async fn test_resolve_llibre_with_single_archive() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_nivell(db, 3, "Girona", "provincia", 1).await;
    seed_municipi(db, 5, "Besalú", None, None, Some(3), None).await;
    seed_arxiu(db, 7, "Arxiu Parroquial", 5).await;
    seed_llibre(db, 42, "Baptismes 1790-1810", 5).await;
    link_llibre_arxiu(db, 7, 42).await;

    let resolver = TargetResolver::new(db.clone(), &cache_settings());
    let target = resolver.resolve_llibre(42).await.expect("Resolve failed");

    assert_eq!(target.llibre_id, Some(42));
    // A single attached archive also sets the scalar field.
    assert_eq!(target.arxiu_id, Some(7));
    assert_eq!(target.arxiu_ids, vec![7]);
    assert_eq!(target.municipi_id, Some(5));
    assert_eq!(target.provincia_id, Some(3));
    assert_eq!(target.pais_id, Some(1));
    assert_eq!(target.most_specific_scope(), Some(ScopeKind::Llibre));
}

#[tokio::test]
async fn test_resolve_llibre_with_multiple_archives() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_municipi(db, 5, "Besalú", Some(1), None, None, None).await;
    seed_arxiu(db, 7, "Arxiu Parroquial", 5).await;
    seed_arxiu(db, 9, "Arxiu Diocesà", 5).await;
    seed_llibre(db, 42, "Baptismes", 5).await;
    link_llibre_arxiu(db, 9, 42).await;
    link_llibre_arxiu(db, 7, 42).await;

    let resolver = TargetResolver::new(db.clone(), &cache_settings());
    let target = resolver.resolve_llibre(42).await.expect("Resolve failed");

    // Several archives: only the multi-valued field is populated.
    assert_eq!(target.arxiu_id, None);
    assert_eq!(target.arxiu_ids, vec![7, 9]);
}

#[tokio::test]
async fn test_resolve_arxiu() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_nivell(db, 3, "Girona", "provincia", 1).await;
    seed_municipi(db, 5, "Besalú", None, None, Some(3), None).await;
    seed_arxiu(db, 7, "Arxiu Parroquial", 5).await;

    let resolver = TargetResolver::new(db.clone(), &cache_settings());
    let target = resolver.resolve_arxiu(7).await.expect("Resolve failed");

    assert_eq!(target.arxiu_id, Some(7));
    assert_eq!(target.arxiu_ids, vec![7]);
    assert_eq!(target.municipi_id, Some(5));
    assert_eq!(target.pais_id, Some(1));
    assert_eq!(target.most_specific_scope(), Some(ScopeKind::Arxiu));
}

#[tokio::test]
async fn test_missing_book_resolves_partially() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let resolver = TargetResolver::new(db.clone(), &cache_settings());
    let target = resolver.resolve_llibre(404).await.expect("Resolve failed");

    assert_eq!(target.llibre_id, Some(404));
    // Callers detect the missing row via the absent parent scopes.
    assert_eq!(target.municipi_id, None);
    assert_eq!(target.pais_id, None);
}

#[tokio::test]
async fn test_repeated_resolves_are_equal_and_unaliased() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    seed_pais(db, 1, "Catalunya").await;
    seed_municipi(db, 5, "Besalú", Some(1), None, None, None).await;

    let resolver = TargetResolver::new(db.clone(), &cache_settings());
    let first = resolver.resolve_municipi(5).await.expect("Resolve failed");
    let mut second = resolver.resolve_municipi(5).await.expect("Resolve failed");

    assert_eq!(first, second);

    // Mutating a returned target must not leak into the cache.
    second.pais_id = Some(99);
    let third = resolver.resolve_municipi(5).await.expect("Resolve failed");
    assert_eq!(third.pais_id, Some(1));
}
