use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::sync::RwLock;

use crate::authz::types::Target;
use crate::entities::{self, arxiu_llibre, municipi, nivell_administratiu};
use crate::errors::LlinatgeError;
use crate::settings;

/// Bounded cache with TTL and first-added-first-removed eviction. Values
/// are cloned on the way in and out so callers never alias stored entries.
struct BoundedCache<T: Clone> {
    map: HashMap<i64, (T, Instant)>,
    order: VecDeque<i64>,
    capacity: usize,
    ttl: Duration,
}

impl<T: Clone> BoundedCache<T> {
    fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            ttl,
        }
    }

    fn get_fresh(&self, id: i64) -> Option<T> {
        let (value, inserted_at) = self.map.get(&id)?;
        if inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(value.clone())
    }

    fn is_stale(&self, id: i64) -> bool {
        self.map
            .get(&id)
            .is_some_and(|(_, inserted_at)| inserted_at.elapsed() >= self.ttl)
    }

    fn remove(&mut self, id: i64) {
        if self.map.remove(&id).is_some() {
            self.order.retain(|k| *k != id);
        }
    }

    fn insert(&mut self, id: i64, value: T) {
        if self.map.insert(id, (value, Instant::now())).is_none() {
            self.order.push_back(id);
        }
        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&oldest);
        }
    }
}

type SharedCache = Arc<RwLock<BoundedCache<Target>>>;

async fn cache_get(cache: &SharedCache, id: i64) -> Option<Target> {
    {
        let guard = cache.read().await;
        if let Some(hit) = guard.get_fresh(id) {
            return Some(hit);
        }
        if !guard.is_stale(id) {
            return None;
        }
    }
    // Stale entry observed: delete under the exclusive lock, then miss.
    let mut guard = cache.write().await;
    if guard.is_stale(id) {
        guard.remove(id);
    }
    None
}

/// Hydrates partial targets (a book id, an archive id, a municipality id)
/// into the full hierarchical address grant matching needs.
#[derive(Clone)]
pub struct TargetResolver {
    db: DatabaseConnection,
    llibres: SharedCache,
    arxius: SharedCache,
    municipis: SharedCache,
}

impl TargetResolver {
    pub fn new(db: DatabaseConnection, cache: &settings::Cache) -> Self {
        let ttl = Duration::from_secs(cache.targets_ttl_secs);
        Self {
            db,
            llibres: Arc::new(RwLock::new(BoundedCache::new(cache.llibres_capacity, ttl))),
            arxius: Arc::new(RwLock::new(BoundedCache::new(cache.arxius_capacity, ttl))),
            municipis: Arc::new(RwLock::new(BoundedCache::new(
                cache.municipis_capacity,
                ttl,
            ))),
        }
    }

    pub async fn resolve_municipi(&self, municipi_id: i64) -> Result<Target, LlinatgeError> {
        if let Some(hit) = cache_get(&self.municipis, municipi_id).await {
            return Ok(hit);
        }

        let Some(row) = crate::storage::get_municipi(&self.db, municipi_id).await? else {
            // Missing row: partially populated target, not cached.
            return Ok(Target::municipi(municipi_id));
        };
        let target = self.municipi_target(&row).await?;

        self.municipis.write().await.insert(municipi_id, target.clone());
        Ok(target)
    }

    pub async fn resolve_arxiu(&self, arxiu_id: i64) -> Result<Target, LlinatgeError> {
        if let Some(hit) = cache_get(&self.arxius, arxiu_id).await {
            return Ok(hit);
        }

        let joined = entities::Arxiu::find_by_id(arxiu_id)
            .find_also_related(entities::Municipi)
            .one(&self.db)
            .await?;
        let Some((row, municipi_row)) = joined else {
            return Ok(Target {
                arxiu_id: Some(arxiu_id),
                arxiu_ids: vec![arxiu_id],
                ..Default::default()
            });
        };

        // Joined fetch normally carries the municipality; fall back to a
        // per-entity read when it does not.
        let municipi_row = match municipi_row {
            Some(m) => Some(m),
            None => crate::storage::get_municipi(&self.db, row.municipi_id).await?,
        };

        let mut target = match &municipi_row {
            Some(m) => self.municipi_target(m).await?,
            None => Target::default(),
        };
        target.entitat_id = row.entitat_id.filter(|id| *id > 0).or(target.entitat_id);
        target.arxiu_id = Some(arxiu_id);
        target.arxiu_ids = vec![arxiu_id];

        self.arxius.write().await.insert(arxiu_id, target.clone());
        Ok(target)
    }

    pub async fn resolve_llibre(&self, llibre_id: i64) -> Result<Target, LlinatgeError> {
        if let Some(hit) = cache_get(&self.llibres, llibre_id).await {
            return Ok(hit);
        }

        let joined = entities::Llibre::find_by_id(llibre_id)
            .find_also_related(entities::Municipi)
            .one(&self.db)
            .await?;
        let Some((row, municipi_row)) = joined else {
            return Ok(Target {
                llibre_id: Some(llibre_id),
                ..Default::default()
            });
        };

        let municipi_row = match municipi_row {
            Some(m) => Some(m),
            None => crate::storage::get_municipi(&self.db, row.municipi_id).await?,
        };

        let mut target = match &municipi_row {
            Some(m) => self.municipi_target(m).await?,
            None => Target::default(),
        };
        target.entitat_id = row.entitat_id.filter(|id| *id > 0).or(target.entitat_id);
        target.llibre_id = Some(llibre_id);

        let mut arxiu_ids: Vec<i64> = entities::ArxiuLlibre::find()
            .filter(arxiu_llibre::Column::LlibreId.eq(llibre_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|b| b.arxiu_id)
            .collect();
        arxiu_ids.sort_unstable();
        // A single attached archive also populates the scalar id; with
        // several, only the multi-valued field is set.
        if arxiu_ids.len() == 1 {
            target.arxiu_id = Some(arxiu_ids[0]);
        }
        target.arxiu_ids = arxiu_ids;

        self.llibres.write().await.insert(llibre_id, target.clone());
        Ok(target)
    }

    /// Hierarchy fields of a municipality row: the level chain mapped onto
    /// regio/provincia/comarca plus the country.
    async fn municipi_target(&self, row: &municipi::Model) -> Result<Target, LlinatgeError> {
        let mut target = Target::municipi(row.id);

        let chain = row.nivell_chain();
        let nivells = crate::storage::get_nivells(&self.db, &chain).await?;
        let by_id: HashMap<i64, &nivell_administratiu::Model> =
            nivells.iter().map(|n| (n.id, n)).collect();

        target.pais_id = row.pais_id.filter(|id| *id > 0);
        for nivell_id in &chain {
            let Some(nivell) = by_id.get(nivell_id) else {
                continue;
            };
            match nivell.tipus.as_str() {
                "regio" => target.regio_id = Some(nivell.id),
                "provincia" => target.provincia_id = Some(nivell.id),
                "comarca" => target.comarca_id = Some(nivell.id),
                other => {
                    tracing::warn!(nivell = nivell.id, tipus = %other, "Unknown level kind");
                }
            }
            // First level of the ordered chain with a positive country wins.
            if target.pais_id.is_none() && nivell.pais_id > 0 {
                target.pais_id = Some(nivell.pais_id);
            }
        }

        Ok(target)
    }
}
