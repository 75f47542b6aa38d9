//! Territorial closure index: materializes each municipality's full
//! ancestor set (itself, its administrative levels, its country) into
//! `admin_closure` for scope matching and list filtering.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait};

use crate::entities::{self, admin_closure};
use crate::errors::LlinatgeError;

pub const ANCESTOR_MUNICIPI: &str = "municipi";
pub const ANCESTOR_NIVELL: &str = "nivell";
pub const ANCESTOR_PAIS: &str = "pais";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub processed: u64,
    pub failed: u64,
}

/// Recompute the ancestor set of one municipality and atomically replace
/// its closure rows. Readers never observe a partially rebuilt set.
pub async fn rebuild_for(
    db: &DatabaseConnection,
    municipi_id: i64,
) -> Result<(), LlinatgeError> {
    let row = crate::storage::get_municipi(db, municipi_id)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("municipi {municipi_id}")))?;

    let mut ancestors: Vec<(&str, i64)> = vec![(ANCESTOR_MUNICIPI, municipi_id)];

    let chain = row.nivell_chain();
    for nivell_id in &chain {
        ancestors.push((ANCESTOR_NIVELL, *nivell_id));
    }

    let pais_id = match row.pais_id.filter(|id| *id > 0) {
        Some(id) => Some(id),
        None => {
            // First level of the ordered chain with a positive country wins.
            let nivells = crate::storage::get_nivells(db, &chain).await?;
            chain
                .iter()
                .filter_map(|id| nivells.iter().find(|n| n.id == *id))
                .map(|n| n.pais_id)
                .find(|pais| *pais > 0)
        }
    };
    if let Some(pais) = pais_id {
        ancestors.push((ANCESTOR_PAIS, pais));
    }

    let mut seen = HashSet::new();
    ancestors.retain(|entry| seen.insert(*entry));

    let rows: Vec<admin_closure::ActiveModel> = ancestors
        .into_iter()
        .map(|(kind, id)| admin_closure::ActiveModel {
            descendant_municipi_id: Set(municipi_id),
            ancestor_type: Set(kind.to_string()),
            ancestor_id: Set(id),
        })
        .collect();

    let txn = db.begin().await?;
    entities::AdminClosure::delete_many()
        .filter(admin_closure::Column::DescendantMunicipiId.eq(municipi_id))
        .exec(&txn)
        .await?;
    entities::AdminClosure::insert_many(rows).exec(&txn).await?;
    txn.commit().await?;

    Ok(())
}

/// Rebuild the closure of every municipality. Individual failures are
/// logged and skipped; the batch continues.
pub async fn rebuild_all(db: &DatabaseConnection) -> Result<RebuildSummary, LlinatgeError> {
    let ids = crate::storage::all_municipi_ids(db).await?;

    let mut summary = RebuildSummary::default();
    for municipi_id in ids {
        match rebuild_for(db, municipi_id).await {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                tracing::warn!(municipi_id, error = %e, "Closure rebuild failed, skipping");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        "Closure rebuild finished"
    );
    Ok(summary)
}
