use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::sync::RwLock;

use crate::authz::catalog;
use crate::authz::policy;
use crate::authz::types::{CompiledGrant, ScopeKind};
use crate::entities::{self, grup_membre, grup_politica, politica_grant, usuari_politica};
use crate::errors::LlinatgeError;

/// Compiled grant set of one user at one permission version. Immutable once
/// built; shared behind `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PermissionSnapshot {
    pub user_id: i64,
    pub version: i64,
    pub is_admin: bool,
    grants: HashMap<String, Vec<CompiledGrant>>,
}

impl PermissionSnapshot {
    pub fn new(user_id: i64, version: i64) -> Self {
        Self {
            user_id,
            version,
            ..Default::default()
        }
    }

    pub fn admin(user_id: i64, version: i64) -> Self {
        Self {
            user_id,
            version,
            is_admin: true,
            ..Default::default()
        }
    }

    pub fn add_grant(&mut self, action: &str, grant: CompiledGrant) {
        self.grants.entry(action.to_string()).or_default().push(grant);
    }

    pub fn grants_for(&self, action: &str) -> &[CompiledGrant] {
        self.grants.get(action).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.is_admin || !self.grants_for(action).is_empty()
    }
}

struct CacheEntry {
    version: i64,
    built_at: Instant,
    snapshot: Arc<PermissionSnapshot>,
}

/// Per-user snapshot cache keyed on `(user_id, permissions_version)` with a
/// short TTL. Version-bump invalidation is opportunistic: a bumped version
/// misses the cache on the next read; staleness is otherwise bounded by the
/// TTL.
#[derive(Clone)]
pub struct PermissionStore {
    db: DatabaseConnection,
    ttl: Duration,
    entries: Arc<RwLock<HashMap<i64, CacheEntry>>>,
}

impl PermissionStore {
    pub fn new(db: DatabaseConnection, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Compiled snapshot for the user. DB errors propagate; callers treat
    /// an error as "no permissions".
    pub async fn snapshot_for(
        &self,
        user_id: i64,
    ) -> Result<Arc<PermissionSnapshot>, LlinatgeError> {
        let user = crate::storage::get_usuari(&self.db, user_id)
            .await?
            .ok_or_else(|| LlinatgeError::NotFound(format!("usuari {user_id}")))?;
        let version = user.permissions_version;

        let mut stale = false;
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user_id) {
                if entry.version == version && entry.built_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&entry.snapshot));
                }
                stale = true;
            }
        }
        if stale {
            // Delete the observed stale entry before treating this as a miss.
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.get(&user_id) {
                if entry.version != version || entry.built_at.elapsed() >= self.ttl {
                    entries.remove(&user_id);
                }
            }
        }

        let snapshot = Arc::new(self.build(user_id, version).await?);

        let mut entries = self.entries.write().await;
        // Insert evicts any prior entry for the same user.
        entries.insert(
            user_id,
            CacheEntry {
                version,
                built_at: Instant::now(),
                snapshot: Arc::clone(&snapshot),
            },
        );
        Ok(snapshot)
    }

    pub async fn invalidate(&self, user_id: i64) {
        self.entries.write().await.remove(&user_id);
    }

    async fn build(
        &self,
        user_id: i64,
        version: i64,
    ) -> Result<PermissionSnapshot, LlinatgeError> {
        let mut politica_ids: Vec<i64> = entities::UsuariPolitica::find()
            .filter(usuari_politica::Column::UsuariId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|b| b.politica_id)
            .collect();

        let grup_ids: Vec<i64> = entities::GrupMembre::find()
            .filter(grup_membre::Column::UsuariId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.grup_id)
            .collect();
        if !grup_ids.is_empty() {
            let via_grups = entities::GrupPolitica::find()
                .filter(grup_politica::Column::GrupId.is_in(grup_ids))
                .all(&self.db)
                .await?;
            politica_ids.extend(via_grups.into_iter().map(|b| b.politica_id));
        }
        politica_ids.sort_unstable();
        politica_ids.dedup();

        let mut snapshot = PermissionSnapshot::new(user_id, version);
        if politica_ids.is_empty() {
            return Ok(snapshot);
        }

        let politiques = entities::Politica::find()
            .filter(crate::entities::politica::Column::Id.is_in(politica_ids.clone()))
            .all(&self.db)
            .await?;
        let grant_rows = entities::PoliticaGrant::find()
            .filter(politica_grant::Column::PoliticaId.is_in(politica_ids))
            .all(&self.db)
            .await?;

        let mut grants_by_politica: HashMap<i64, Vec<politica_grant::Model>> = HashMap::new();
        for row in grant_rows {
            grants_by_politica.entry(row.politica_id).or_default().push(row);
        }

        for p in &politiques {
            if p.nom.eq_ignore_ascii_case("admin") {
                snapshot.is_admin = true;
            }

            let structured = grants_by_politica.remove(&p.id).unwrap_or_default();

            let legacy_doc = p.document.as_deref().and_then(|raw| {
                match policy::parse_document(raw) {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        tracing::warn!(politica = %p.nom, error = %e, "Skipping unreadable legacy policy document");
                        None
                    }
                }
            });
            if let Some(doc) = &legacy_doc {
                if doc.can_manage_tot {
                    snapshot.is_admin = true;
                }
            }

            if structured.is_empty() {
                if let Some(doc) = &legacy_doc {
                    expand_legacy_flags(&mut snapshot, doc);
                }
                continue;
            }

            for row in structured {
                let Some(scope) = ScopeKind::parse(&row.scope_type) else {
                    tracing::warn!(
                        politica = %p.nom,
                        scope_type = %row.scope_type,
                        "Skipping grant with unknown scope kind"
                    );
                    continue;
                };
                snapshot.add_grant(
                    &row.perm_key,
                    CompiledGrant {
                        scope,
                        scope_id: row.scope_id,
                        include_descendants: row.include_children != 0,
                    },
                );
            }
        }

        Ok(snapshot)
    }
}

/// Expand a legacy boolean document into the fixed action sets at global
/// scope. The admin flag is handled by the caller.
fn expand_legacy_flags(snapshot: &mut PermissionSnapshot, doc: &policy::PolicyDocument) {
    let mut sets: Vec<&[&str]> = Vec::new();
    if doc.can_manage_territori {
        sets.push(catalog::LEGACY_TERRITORI);
    }
    if doc.can_manage_entitats {
        sets.push(catalog::LEGACY_ENTITATS);
    }
    if doc.can_manage_arxius {
        sets.push(catalog::LEGACY_ARXIUS);
    }
    if doc.can_manage_politiques {
        sets.push(catalog::LEGACY_POLITIQUES);
    }
    for set in sets {
        for action in set {
            snapshot.add_grant(action, CompiledGrant::global());
        }
    }
}
