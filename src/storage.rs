use crate::entities::{self, municipi, nivell_administratiu, usuari};
use crate::errors::LlinatgeError;
use crate::settings::Database as DbCfg;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, Database, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, LlinatgeError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

pub async fn get_municipi(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<municipi::Model>, LlinatgeError> {
    let row = entities::Municipi::find_by_id(id).one(db).await?;
    Ok(row)
}

pub async fn get_nivells(
    db: &DatabaseConnection,
    ids: &[i64],
) -> Result<Vec<nivell_administratiu::Model>, LlinatgeError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = entities::NivellAdministratiu::find()
        .filter(nivell_administratiu::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get_usuari(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<usuari::Model>, LlinatgeError> {
    let row = entities::Usuari::find_by_id(id).one(db).await?;
    Ok(row)
}

/// Bump the monotonic permission version of one user. Returns the new value.
pub async fn bump_permissions_version(
    db: &DatabaseConnection,
    usuari_id: i64,
) -> Result<i64, LlinatgeError> {
    let user = entities::Usuari::find_by_id(usuari_id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("usuari {usuari_id}")))?;

    let next = user.permissions_version + 1;
    entities::Usuari::update_many()
        .col_expr(usuari::Column::PermissionsVersion, Expr::value(next))
        .filter(usuari::Column::Id.eq(usuari_id))
        .exec(db)
        .await?;
    Ok(next)
}

/// Bump the permission version of every user bound to the policy, directly
/// or through a group.
pub async fn bump_versions_for_politica(
    db: &DatabaseConnection,
    politica_id: i64,
) -> Result<u64, LlinatgeError> {
    use crate::entities::{grup_membre, grup_politica, usuari_politica};

    let direct: Vec<i64> = entities::UsuariPolitica::find()
        .filter(usuari_politica::Column::PoliticaId.eq(politica_id))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.usuari_id)
        .collect();

    let grups: Vec<i64> = entities::GrupPolitica::find()
        .filter(grup_politica::Column::PoliticaId.eq(politica_id))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.grup_id)
        .collect();

    let mut user_ids = direct;
    if !grups.is_empty() {
        let membres = entities::GrupMembre::find()
            .filter(grup_membre::Column::GrupId.is_in(grups))
            .all(db)
            .await?;
        user_ids.extend(membres.into_iter().map(|m| m.usuari_id));
    }
    user_ids.sort_unstable();
    user_ids.dedup();

    if user_ids.is_empty() {
        return Ok(0);
    }
    let users = entities::Usuari::find()
        .filter(usuari::Column::Id.is_in(user_ids))
        .all(db)
        .await?;
    let bumped = users.len() as u64;
    for user in users {
        entities::Usuari::update_many()
            .col_expr(
                usuari::Column::PermissionsVersion,
                Expr::value(user.permissions_version + 1),
            )
            .filter(usuari::Column::Id.eq(user.id))
            .exec(db)
            .await?;
    }
    Ok(bumped)
}

/// Municipalities referencing the administrative level at any position of
/// their chain.
pub async fn municipi_ids_for_nivell(
    db: &DatabaseConnection,
    nivell_id: i64,
) -> Result<Vec<i64>, LlinatgeError> {
    let rows: Vec<i64> = entities::Municipi::find()
        .select_only()
        .column(municipi::Column::Id)
        .filter(
            Condition::any()
                .add(municipi::Column::RegioId.eq(nivell_id))
                .add(municipi::Column::ProvinciaId.eq(nivell_id))
                .add(municipi::Column::ComarcaId.eq(nivell_id)),
        )
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn all_municipi_ids(db: &DatabaseConnection) -> Result<Vec<i64>, LlinatgeError> {
    let rows: Vec<i64> = entities::Municipi::find()
        .select_only()
        .column(municipi::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn all_nivell_ids(db: &DatabaseConnection) -> Result<Vec<i64>, LlinatgeError> {
    let rows: Vec<i64> = entities::NivellAdministratiu::find()
        .select_only()
        .column(nivell_administratiu::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows)
}
