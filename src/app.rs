//! Process-wide container owning the database handle and every mutable
//! cache or store. Constructed once at startup and cloned into handlers and
//! background tasks; tests build fresh containers.

use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::authz::engine;
use crate::authz::resolver::TargetResolver;
use crate::authz::snapshot::PermissionStore;
use crate::authz::types::{ListScopeFilter, ScopeKind, Target};
use crate::jobs::JobRegistry;
use crate::moderation::bulk::BulkJobStore;
use crate::settings::Settings;

#[derive(Clone)]
pub struct App {
    pub db: DatabaseConnection,
    pub permissions: PermissionStore,
    pub targets: TargetResolver,
    pub bulk_jobs: BulkJobStore,
    pub jobs: JobRegistry,
}

impl App {
    pub fn new(db: DatabaseConnection, settings: &Settings) -> Self {
        let permissions = PermissionStore::new(
            db.clone(),
            Duration::from_secs(settings.cache.permissions_ttl_secs),
        );
        let targets = TargetResolver::new(db.clone(), &settings.cache);
        let jobs = JobRegistry::new(db.clone());
        Self {
            db,
            permissions,
            targets,
            bulk_jobs: BulkJobStore::new(),
            jobs,
        }
    }

    /// Point query. A snapshot error denies: no permissions on failure.
    pub async fn may(&self, user_id: i64, action: &str, target: &Target) -> bool {
        match self.permissions.snapshot_for(user_id).await {
            Ok(snapshot) => engine::may(&snapshot, action, target),
            Err(e) => {
                tracing::warn!(user_id, action, error = %e, "Permission snapshot failed, denying");
                false
            }
        }
    }

    pub async fn may_any(&self, user_id: i64, actions: &[&str], target: &Target) -> bool {
        match self.permissions.snapshot_for(user_id).await {
            Ok(snapshot) => engine::may_any(&snapshot, actions, target),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Permission snapshot failed, denying");
                false
            }
        }
    }

    pub async fn has_any_grant_for(&self, user_id: i64, action: &str) -> bool {
        match self.permissions.snapshot_for(user_id).await {
            Ok(snapshot) => engine::has_any_grant_for(&snapshot, action),
            Err(e) => {
                tracing::warn!(user_id, action, error = %e, "Permission snapshot failed, denying");
                false
            }
        }
    }

    /// List filter. A snapshot error yields the empty filter, which admits
    /// nothing.
    pub async fn list_scope_filter(
        &self,
        user_id: i64,
        action: &str,
        list_scope: ScopeKind,
    ) -> ListScopeFilter {
        match self.permissions.snapshot_for(user_id).await {
            Ok(snapshot) => engine::list_scope_filter(&snapshot, action, list_scope),
            Err(e) => {
                tracing::warn!(user_id, action, error = %e, "Permission snapshot failed, empty filter");
                ListScopeFilter::default()
            }
        }
    }
}
