//! The pending-change engine: snapshot submission, moderation decisions and
//! application of accepted snapshots back to canonical rows.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{self, arxiu_llibre, wiki_change};
use crate::errors::LlinatgeError;
use crate::moderation::snapshot::{decode_snapshot, get_field_i64, get_field_str};

pub const ESTAT_PENDENT: &str = "pendent";
pub const ESTAT_PUBLICAT: &str = "publicat";
pub const ESTAT_REBUTJAT: &str = "rebutjat";

/// Entity kinds subject to wiki moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Municipi,
    Arxiu,
    Llibre,
    Persona,
    Cognom,
    EventHistoric,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Municipi => "municipi",
            ObjectKind::Arxiu => "arxiu",
            ObjectKind::Llibre => "llibre",
            ObjectKind::Persona => "persona",
            ObjectKind::Cognom => "cognom",
            ObjectKind::EventHistoric => "event_historic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "municipi" => Some(ObjectKind::Municipi),
            "arxiu" => Some(ObjectKind::Arxiu),
            "llibre" => Some(ObjectKind::Llibre),
            "persona" => Some(ObjectKind::Persona),
            "cognom" => Some(ObjectKind::Cognom),
            "event_historic" => Some(ObjectKind::EventHistoric),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata document stored on every change. `arxiu_id` carries the
/// designated archive of a book change for bridge re-linking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeMetadata {
    pub before: Option<Value>,
    pub after: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_change_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arxiu_id: Option<i64>,
}

/// Decode stored metadata, accepting one extra level of string encoding.
/// Always emitted single-encoded on write.
pub fn decode_metadata(raw: &str) -> Result<ChangeMetadata, LlinatgeError> {
    let mut value: Value = serde_json::from_str(raw)?;
    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner)?;
    }
    let mut meta: ChangeMetadata = serde_json::from_value(value)?;
    meta.before = meta.before.map(|v| decode_snapshot(&v)).filter(|v| !v.is_null());
    meta.after = meta.after.map(|v| decode_snapshot(&v)).filter(|v| !v.is_null());
    Ok(meta)
}

/// Store a new pending change with its before/after snapshots.
pub async fn submit_change(
    db: &DatabaseConnection,
    kind: ObjectKind,
    object_id: i64,
    changed_by: i64,
    metadata: ChangeMetadata,
) -> Result<i64, LlinatgeError> {
    let raw = serde_json::to_string(&metadata)?;
    let row = wiki_change::ActiveModel {
        object_type: Set(kind.as_str().to_string()),
        object_id: Set(object_id),
        changed_by: Set(changed_by),
        moderacio_estat: Set(ESTAT_PENDENT.to_string()),
        metadata: Set(raw),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };
    let inserted = row.insert(db).await?;
    tracing::info!(
        change_id = inserted.id,
        kind = %kind,
        object_id,
        changed_by,
        "Queued wiki change"
    );
    Ok(inserted.id)
}

/// Apply an accepted change: write the `after` snapshot to the canonical
/// row, then mark the change published. Snapshot decode failures leave the
/// canonical row untouched and the change pending.
pub async fn apply(
    db: &DatabaseConnection,
    change: &wiki_change::Model,
    moderator_id: i64,
    motiu: Option<String>,
) -> Result<(), LlinatgeError> {
    let meta = decode_metadata(&change.metadata)?;
    let after = meta.after.clone().ok_or_else(|| {
        LlinatgeError::ChangeWithoutData(format!("change {} has no after snapshot", change.id))
    })?;

    let kind = ObjectKind::parse(&change.object_type).ok_or_else(|| {
        LlinatgeError::BadRequest(format!("unknown object kind {}", change.object_type))
    })?;

    // A chained draft referencing an already-resolved change is processed
    // normally; the prior state is not re-applied.
    let now = Utc::now().timestamp();
    match kind {
        ObjectKind::Municipi => {
            apply_municipi(db, change.object_id, &after, moderator_id, now, &motiu).await?
        }
        ObjectKind::Arxiu => {
            apply_arxiu(db, change.object_id, &after, moderator_id, now, &motiu).await?
        }
        ObjectKind::Llibre => {
            apply_llibre(db, change.object_id, &after, moderator_id, now, &motiu).await?;
            if let Some(arxiu_id) = meta.arxiu_id {
                relink_llibre_arxiu(db, change.object_id, arxiu_id).await;
            }
        }
        ObjectKind::Persona => apply_persona(db, change.object_id, &after).await?,
        ObjectKind::Cognom => apply_cognom(db, change.object_id, &after).await?,
        ObjectKind::EventHistoric => {
            apply_event(db, change.object_id, &after, moderator_id, now, &motiu).await?
        }
    }

    let mut active = change.clone().into_active_model();
    active.moderacio_estat = Set(ESTAT_PUBLICAT.to_string());
    active.moderated_by = Set(Some(moderator_id));
    active.moderated_at = Set(Some(now));
    active.moderacio_motiu = Set(motiu);
    active.update(db).await?;

    tracing::info!(change_id = change.id, kind = %kind, moderator_id, "Published wiki change");
    Ok(())
}

/// Reject a pending change. The canonical row is untouched.
pub async fn reject(
    db: &DatabaseConnection,
    change: &wiki_change::Model,
    moderator_id: i64,
    motiu: Option<String>,
) -> Result<(), LlinatgeError> {
    let mut active = change.clone().into_active_model();
    active.moderacio_estat = Set(ESTAT_REBUTJAT.to_string());
    active.moderated_by = Set(Some(moderator_id));
    active.moderated_at = Set(Some(Utc::now().timestamp()));
    active.moderacio_motiu = Set(motiu);
    active.update(db).await?;

    tracing::info!(change_id = change.id, moderator_id, "Rejected wiki change");
    Ok(())
}

/// Non-moderators see published changes plus their own pending or rejected
/// ones.
pub fn filter_visible(
    changes: Vec<wiki_change::Model>,
    user_id: i64,
    can_moderate: bool,
) -> Vec<wiki_change::Model> {
    if can_moderate {
        return changes;
    }
    changes
        .into_iter()
        .filter(|c| c.moderacio_estat == ESTAT_PUBLICAT || c.changed_by == user_id)
        .collect()
}

/// Pending changes, optionally restricted to one object kind.
pub async fn pending_for(
    db: &DatabaseConnection,
    kind: Option<ObjectKind>,
) -> Result<Vec<wiki_change::Model>, LlinatgeError> {
    let mut query = entities::WikiChange::find()
        .filter(wiki_change::Column::ModeracioEstat.eq(ESTAT_PENDENT));
    if let Some(kind) = kind {
        query = query.filter(wiki_change::Column::ObjectType.eq(kind.as_str()));
    }
    let rows = query.order_by_asc(wiki_change::Column::Id).all(db).await?;
    Ok(rows)
}

/// Full change history of one object, oldest first. Feeds the multi-version
/// diff view.
pub async fn changes_for_object(
    db: &DatabaseConnection,
    kind: ObjectKind,
    object_id: i64,
) -> Result<Vec<wiki_change::Model>, LlinatgeError> {
    let rows = entities::WikiChange::find()
        .filter(wiki_change::Column::ObjectType.eq(kind.as_str()))
        .filter(wiki_change::Column::ObjectId.eq(object_id))
        .order_by_asc(wiki_change::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

async fn apply_municipi(
    db: &DatabaseConnection,
    id: i64,
    after: &Value,
    moderator_id: i64,
    now: i64,
    motiu: &Option<String>,
) -> Result<(), LlinatgeError> {
    let row = entities::Municipi::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("municipi {id}")))?;
    let mut active = row.into_active_model();

    if let Some(Some(nom)) = get_field_str(after, "Nom") {
        active.nom = Set(nom);
    }
    if let Some(v) = get_field_i64(after, "PaisId") {
        active.pais_id = Set(v);
    }
    if let Some(v) = get_field_i64(after, "RegioId") {
        active.regio_id = Set(v);
    }
    if let Some(v) = get_field_i64(after, "ProvinciaId") {
        active.provincia_id = Set(v);
    }
    if let Some(v) = get_field_i64(after, "ComarcaId") {
        active.comarca_id = Set(v);
    }
    active.moderacio_estat = Set(ESTAT_PUBLICAT.to_string());
    active.moderated_by = Set(Some(moderator_id));
    active.moderated_at = Set(Some(now));
    active.moderacio_motiu = Set(motiu.clone());
    active.update(db).await?;
    Ok(())
}

async fn apply_arxiu(
    db: &DatabaseConnection,
    id: i64,
    after: &Value,
    moderator_id: i64,
    now: i64,
    motiu: &Option<String>,
) -> Result<(), LlinatgeError> {
    let row = entities::Arxiu::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("arxiu {id}")))?;
    let mut active = row.into_active_model();

    if let Some(Some(nom)) = get_field_str(after, "Nom") {
        active.nom = Set(nom);
    }
    if let Some(Some(municipi_id)) = get_field_i64(after, "MunicipiId") {
        active.municipi_id = Set(municipi_id);
    }
    if let Some(v) = get_field_i64(after, "EntitatId") {
        active.entitat_id = Set(v);
    }
    active.moderacio_estat = Set(ESTAT_PUBLICAT.to_string());
    active.moderated_by = Set(Some(moderator_id));
    active.moderated_at = Set(Some(now));
    active.moderacio_motiu = Set(motiu.clone());
    active.update(db).await?;
    Ok(())
}

async fn apply_llibre(
    db: &DatabaseConnection,
    id: i64,
    after: &Value,
    moderator_id: i64,
    now: i64,
    motiu: &Option<String>,
) -> Result<(), LlinatgeError> {
    let row = entities::Llibre::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("llibre {id}")))?;
    let mut active = row.into_active_model();

    if let Some(Some(titol)) = get_field_str(after, "Titol") {
        active.titol = Set(titol);
    }
    if let Some(Some(municipi_id)) = get_field_i64(after, "MunicipiId") {
        active.municipi_id = Set(municipi_id);
    }
    if let Some(v) = get_field_i64(after, "EntitatId") {
        active.entitat_id = Set(v);
    }
    if let Some(v) = get_field_str(after, "Anys") {
        active.anys = Set(v);
    }
    active.moderacio_estat = Set(ESTAT_PUBLICAT.to_string());
    active.moderated_by = Set(Some(moderator_id));
    active.moderated_at = Set(Some(now));
    active.moderacio_motiu = Set(motiu.clone());
    active.update(db).await?;
    Ok(())
}

/// Point the book at its designated archive: drop other bridge rows, insert
/// the designated one. Best-effort after the book row has been updated.
async fn relink_llibre_arxiu(db: &DatabaseConnection, llibre_id: i64, arxiu_id: i64) {
    let result = async {
        entities::ArxiuLlibre::delete_many()
            .filter(arxiu_llibre::Column::LlibreId.eq(llibre_id))
            .filter(arxiu_llibre::Column::ArxiuId.ne(arxiu_id))
            .exec(db)
            .await?;

        let existing = entities::ArxiuLlibre::find_by_id((arxiu_id, llibre_id))
            .one(db)
            .await?;
        if existing.is_none() {
            arxiu_llibre::ActiveModel {
                arxiu_id: Set(arxiu_id),
                llibre_id: Set(llibre_id),
            }
            .insert(db)
            .await?;
        }
        Ok::<(), LlinatgeError>(())
    }
    .await;

    if let Err(e) = result {
        tracing::warn!(llibre_id, arxiu_id, error = %e, "Book archive re-link failed");
    }
}

/// Person rows keep their own moderation trail; apply only sets identity
/// and state.
async fn apply_persona(
    db: &DatabaseConnection,
    id: i64,
    after: &Value,
) -> Result<(), LlinatgeError> {
    let row = entities::Persona::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("persona {id}")))?;
    let mut active = row.into_active_model();

    if let Some(Some(nom)) = get_field_str(after, "Nom") {
        active.nom = Set(nom);
    }
    if let Some(v) = get_field_str(after, "Cognom1") {
        active.cognom1 = Set(v);
    }
    if let Some(v) = get_field_str(after, "Cognom2") {
        active.cognom2 = Set(v);
    }
    if let Some(v) = get_field_i64(after, "MunicipiId") {
        active.municipi_id = Set(v);
    }
    active.moderacio_estat = Set(ESTAT_PUBLICAT.to_string());
    active.update(db).await?;
    Ok(())
}

async fn apply_cognom(
    db: &DatabaseConnection,
    id: i64,
    after: &Value,
) -> Result<(), LlinatgeError> {
    let row = entities::Cognom::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("cognom {id}")))?;
    let mut active = row.into_active_model();

    if let Some(Some(nom)) = get_field_str(after, "Nom") {
        active.nom = Set(nom);
    }
    if let Some(v) = get_field_str(after, "Normalitzat") {
        active.normalitzat = Set(v);
    }
    active.moderacio_estat = Set(ESTAT_PUBLICAT.to_string());
    active.update(db).await?;
    Ok(())
}

async fn apply_event(
    db: &DatabaseConnection,
    id: i64,
    after: &Value,
    moderator_id: i64,
    now: i64,
    motiu: &Option<String>,
) -> Result<(), LlinatgeError> {
    let row = entities::EventHistoric::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("event_historic {id}")))?;
    let mut active = row.into_active_model();

    if let Some(Some(titol)) = get_field_str(after, "Titol") {
        active.titol = Set(titol);
    }
    if let Some(v) = get_field_str(after, "Descripcio") {
        active.descripcio = Set(v);
    }
    if let Some(v) = get_field_str(after, "Data") {
        active.data = Set(v);
    }
    if let Some(v) = get_field_i64(after, "MunicipiId") {
        active.municipi_id = Set(v);
    }
    active.moderacio_estat = Set(ESTAT_PUBLICAT.to_string());
    active.moderated_by = Set(Some(moderator_id));
    active.moderated_at = Set(Some(now));
    active.moderacio_motiu = Set(motiu.clone());
    active.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_kind_round_trip() {
        for kind in [
            ObjectKind::Municipi,
            ObjectKind::Arxiu,
            ObjectKind::Llibre,
            ObjectKind::Persona,
            ObjectKind::Cognom,
            ObjectKind::EventHistoric,
        ] {
            assert_eq!(ObjectKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ObjectKind::parse("document"), None);
    }

    #[test]
    fn test_decode_metadata_single_encoded() {
        let meta = decode_metadata(
            r#"{"before":{"Nom":"A"},"after":{"Nom":"B"},"source_change_id":4}"#,
        )
        .unwrap();
        assert_eq!(meta.before, Some(json!({"Nom": "A"})));
        assert_eq!(meta.after, Some(json!({"Nom": "B"})));
        assert_eq!(meta.source_change_id, Some(4));
    }

    #[test]
    fn test_decode_metadata_double_encoded() {
        let inner = r#"{"before":null,"after":{"Nom":"B"}}"#;
        let double = serde_json::to_string(inner).unwrap();
        let meta = decode_metadata(&double).unwrap();
        assert_eq!(meta.before, None);
        assert_eq!(meta.after, Some(json!({"Nom": "B"})));
    }

    #[test]
    fn test_decode_metadata_string_wrapped_snapshots() {
        let meta = decode_metadata(
            r#"{"before":"{\"Nom\":\"A\"}","after":{"Nom":"B"}}"#,
        )
        .unwrap();
        assert_eq!(meta.before, Some(json!({"Nom": "A"})));
    }

    #[test]
    fn test_metadata_emits_single_encoded() {
        let meta = ChangeMetadata {
            before: Some(json!({"Nom": "A"})),
            after: Some(json!({"Nom": "B"})),
            source_change_id: None,
            arxiu_id: None,
        };
        let raw = serde_json::to_string(&meta).unwrap();
        assert_eq!(raw, r#"{"before":{"Nom":"A"},"after":{"Nom":"B"}}"#);
    }

    #[test]
    fn test_filter_visible_non_moderator() {
        let mk = |id: i64, estat: &str, changed_by: i64| wiki_change::Model {
            id,
            object_type: "municipi".into(),
            object_id: 1,
            changed_by,
            moderacio_estat: estat.into(),
            metadata: "{}".into(),
            created_at: 0,
            moderated_by: None,
            moderated_at: None,
            moderacio_motiu: None,
        };
        let changes = vec![
            mk(1, ESTAT_PENDENT, 7),
            mk(2, ESTAT_PENDENT, 8),
            mk(3, ESTAT_PUBLICAT, 8),
            mk(4, ESTAT_REBUTJAT, 7),
        ];

        let visible = filter_visible(changes.clone(), 7, false);
        let ids: Vec<i64> = visible.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);

        // Moderators see everything.
        assert_eq!(filter_visible(changes, 7, true).len(), 4);
    }
}
