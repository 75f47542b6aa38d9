//! Seed helpers for integration tests. Fixed ids keep assertions readable.

use llinatge::entities::{
    arxiu, arxiu_llibre, grup, grup_membre, grup_politica, llibre, municipi,
    nivell_administratiu, pais, persona, politica, politica_grant, usuari, usuari_politica,
    wiki_change,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub async fn seed_pais(db: &DatabaseConnection, id: i64, nom: &str) -> pais::Model {
    pais::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
        codi: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to seed pais")
}

pub async fn seed_nivell(
    db: &DatabaseConnection,
    id: i64,
    nom: &str,
    tipus: &str,
    pais_id: i64,
) -> nivell_administratiu::Model {
    nivell_administratiu::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
        tipus: Set(tipus.to_string()),
        pais_id: Set(pais_id),
        parent_id: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to seed nivell")
}

pub async fn seed_municipi(
    db: &DatabaseConnection,
    id: i64,
    nom: &str,
    pais_id: Option<i64>,
    regio_id: Option<i64>,
    provincia_id: Option<i64>,
    comarca_id: Option<i64>,
) -> municipi::Model {
    municipi::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
        pais_id: Set(pais_id),
        regio_id: Set(regio_id),
        provincia_id: Set(provincia_id),
        comarca_id: Set(comarca_id),
        moderacio_estat: Set("publicat".to_string()),
        moderated_by: Set(None),
        moderated_at: Set(None),
        moderacio_motiu: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to seed municipi")
}

pub async fn seed_arxiu(
    db: &DatabaseConnection,
    id: i64,
    nom: &str,
    municipi_id: i64,
) -> arxiu::Model {
    arxiu::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
        municipi_id: Set(municipi_id),
        entitat_id: Set(None),
        moderacio_estat: Set("publicat".to_string()),
        moderated_by: Set(None),
        moderated_at: Set(None),
        moderacio_motiu: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to seed arxiu")
}

pub async fn seed_llibre(
    db: &DatabaseConnection,
    id: i64,
    titol: &str,
    municipi_id: i64,
) -> llibre::Model {
    llibre::ActiveModel {
        id: Set(id),
        titol: Set(titol.to_string()),
        municipi_id: Set(municipi_id),
        entitat_id: Set(None),
        anys: Set(None),
        moderacio_estat: Set("publicat".to_string()),
        moderated_by: Set(None),
        moderated_at: Set(None),
        moderacio_motiu: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to seed llibre")
}

pub async fn link_llibre_arxiu(db: &DatabaseConnection, arxiu_id: i64, llibre_id: i64) {
    arxiu_llibre::ActiveModel {
        arxiu_id: Set(arxiu_id),
        llibre_id: Set(llibre_id),
    }
    .insert(db)
    .await
    .expect("Failed to link llibre to arxiu");
}

pub async fn seed_persona(
    db: &DatabaseConnection,
    id: i64,
    nom: &str,
    cognom1: Option<&str>,
    municipi_id: Option<i64>,
) -> persona::Model {
    persona::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
        cognom1: Set(cognom1.map(str::to_string)),
        cognom2: Set(None),
        municipi_id: Set(municipi_id),
        moderacio_estat: Set("publicat".to_string()),
        moderated_by: Set(None),
        moderated_at: Set(None),
        moderacio_motiu: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to seed persona")
}

pub async fn seed_usuari(db: &DatabaseConnection, id: i64, nom: &str) -> usuari::Model {
    usuari::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
        email: Set(None),
        permissions_version: Set(0),
        created_at: Set(0),
    }
    .insert(db)
    .await
    .expect("Failed to seed usuari")
}

pub async fn seed_politica(
    db: &DatabaseConnection,
    id: i64,
    nom: &str,
    document: Option<&str>,
) -> politica::Model {
    politica::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
        document: Set(document.map(str::to_string)),
    }
    .insert(db)
    .await
    .expect("Failed to seed politica")
}

pub async fn seed_grant(
    db: &DatabaseConnection,
    politica_id: i64,
    perm_key: &str,
    scope_type: &str,
    scope_id: Option<i64>,
    include_children: bool,
) {
    politica_grant::ActiveModel {
        politica_id: Set(politica_id),
        perm_key: Set(perm_key.to_string()),
        scope_type: Set(scope_type.to_string()),
        scope_id: Set(scope_id),
        include_children: Set(i64::from(include_children)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed grant");
}

pub async fn bind_usuari_politica(db: &DatabaseConnection, usuari_id: i64, politica_id: i64) {
    usuari_politica::ActiveModel {
        usuari_id: Set(usuari_id),
        politica_id: Set(politica_id),
    }
    .insert(db)
    .await
    .expect("Failed to bind usuari to politica");
}

pub async fn seed_grup(db: &DatabaseConnection, id: i64, nom: &str) -> grup::Model {
    grup::ActiveModel {
        id: Set(id),
        nom: Set(nom.to_string()),
    }
    .insert(db)
    .await
    .expect("Failed to seed grup")
}

pub async fn bind_grup_membre(db: &DatabaseConnection, grup_id: i64, usuari_id: i64) {
    grup_membre::ActiveModel {
        grup_id: Set(grup_id),
        usuari_id: Set(usuari_id),
    }
    .insert(db)
    .await
    .expect("Failed to add grup member");
}

pub async fn bind_grup_politica(db: &DatabaseConnection, grup_id: i64, politica_id: i64) {
    grup_politica::ActiveModel {
        grup_id: Set(grup_id),
        politica_id: Set(politica_id),
    }
    .insert(db)
    .await
    .expect("Failed to bind grup to politica");
}

pub async fn seed_wiki_change(
    db: &DatabaseConnection,
    object_type: &str,
    object_id: i64,
    changed_by: i64,
    metadata: &str,
) -> wiki_change::Model {
    wiki_change::ActiveModel {
        object_type: Set(object_type.to_string()),
        object_id: Set(object_id),
        changed_by: Set(changed_by),
        moderacio_estat: Set("pendent".to_string()),
        metadata: Set(metadata.to_string()),
        created_at: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed wiki change")
}
