use std::collections::{BTreeMap, BTreeSet, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::authz::catalog;
use crate::authz::errors::AuthzError;
use crate::authz::types::ScopeKind;
use crate::entities::{self, politica, politica_grant};
use crate::errors::LlinatgeError;

/// AWS-IAM-like policy document exchanged with administrators. The
/// `CanManage…` booleans are the legacy flag set that predates structured
/// statements.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "CanManageTot", default, skip_serializing_if = "is_false")]
    pub can_manage_tot: bool,
    #[serde(rename = "CanManageTerritori", default, skip_serializing_if = "is_false")]
    pub can_manage_territori: bool,
    #[serde(
        rename = "CanManageEntitatsEclesiastiques",
        default,
        skip_serializing_if = "is_false"
    )]
    pub can_manage_entitats: bool,
    #[serde(rename = "CanManageArxius", default, skip_serializing_if = "is_false")]
    pub can_manage_arxius: bool,
    #[serde(rename = "CanManagePolitiques", default, skip_serializing_if = "is_false")]
    pub can_manage_politiques: bool,
    #[serde(rename = "Statement", default, skip_serializing_if = "Vec::is_empty")]
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statement {
    #[serde(rename = "Effect")]
    pub effect: String,
    #[serde(rename = "Action")]
    pub action: Vec<String>,
    /// Omitted means `["global"]`.
    #[serde(rename = "Resource", default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Vec<String>>,
}

fn is_false(b: &bool) -> bool {
    !b
}

/// One validated grant extracted from a document, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GrantSpec {
    pub perm_key: String,
    pub scope: ScopeKind,
    pub scope_id: Option<i64>,
    pub include_descendants: bool,
}

impl GrantSpec {
    fn resource_string(&self) -> String {
        match (self.scope, self.scope_id) {
            (ScopeKind::Global, _) => "global".to_string(),
            (kind, Some(id)) if self.include_descendants => format!("{kind}:{id}/*"),
            (kind, Some(id)) => format!("{kind}:{id}"),
            // scope_id is always Some for non-global grants
            (kind, None) => format!("{kind}:0"),
        }
    }
}

pub fn parse_document(raw: &str) -> Result<PolicyDocument, AuthzError> {
    serde_json::from_str(raw).map_err(|e| AuthzError::InvalidDocument(e.to_string()))
}

/// Validate a document and expand its statements into grant tuples.
/// Duplicate tuples collapse; nothing is returned when any statement is
/// invalid.
pub fn compile_document(doc: &PolicyDocument) -> Result<Vec<GrantSpec>, AuthzError> {
    let mut grants = Vec::new();
    let mut seen = HashSet::new();

    for stmt in &doc.statement {
        if stmt.effect != "Allow" {
            return Err(AuthzError::UnsupportedEffect(stmt.effect.clone()));
        }

        let mut actions: Vec<&str> = Vec::new();
        for action in &stmt.action {
            if action == "*" {
                actions.extend_from_slice(catalog::ACTIONS);
            } else if catalog::is_valid_action(action) {
                actions.push(action.as_str());
            } else {
                return Err(AuthzError::UnknownAction(action.clone()));
            }
        }

        let default_resources = vec!["global".to_string()];
        let resources = stmt.resource.as_ref().unwrap_or(&default_resources);

        for resource in resources {
            let (scope, scope_id, include_descendants) = parse_resource(resource)?;
            for action in &actions {
                let spec = GrantSpec {
                    perm_key: action.to_string(),
                    scope,
                    scope_id,
                    include_descendants,
                };
                let key = (
                    spec.perm_key.clone(),
                    spec.scope,
                    spec.scope_id,
                    spec.include_descendants,
                );
                if seen.insert(key) {
                    grants.push(spec);
                }
            }
        }
    }

    Ok(grants)
}

/// Parse a single resource entry: `"global"`, `"*"`, or
/// `"<scope_kind>:<id>"` with optional `"/*"` suffix.
fn parse_resource(resource: &str) -> Result<(ScopeKind, Option<i64>, bool), AuthzError> {
    if resource == "global" || resource == "*" {
        return Ok((ScopeKind::Global, None, true));
    }

    let (body, descendants) = match resource.strip_suffix("/*") {
        Some(body) => (body, true),
        None => (resource, false),
    };

    let (kind_str, id_str) = body
        .split_once(':')
        .ok_or_else(|| AuthzError::InvalidResource(resource.to_string()))?;

    let kind = ScopeKind::parse(kind_str)
        .ok_or_else(|| AuthzError::UnknownScopeKind(kind_str.to_string()))?;
    if kind == ScopeKind::Global {
        // "global:<id>" makes no sense; global is only valid bare
        return Err(AuthzError::InvalidResource(resource.to_string()));
    }

    let id: i64 = id_str
        .parse()
        .map_err(|_| AuthzError::InvalidScopeId(resource.to_string()))?;
    if id <= 0 {
        return Err(AuthzError::InvalidScopeId(resource.to_string()));
    }

    Ok((kind, Some(id), descendants))
}

/// Re-emit grants as a canonical document: statements grouped by resource
/// set, actions sorted, resources sorted. Canonical emission re-parses to
/// the same grants and serializes byte-identically.
pub fn document_from_grants(version: &str, grants: &[GrantSpec]) -> PolicyDocument {
    // resource signature -> sorted action set
    let mut groups: BTreeMap<String, (BTreeSet<String>, BTreeSet<String>)> = BTreeMap::new();
    let mut per_action: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for grant in grants {
        per_action
            .entry(grant.perm_key.clone())
            .or_default()
            .insert(grant.resource_string());
    }
    for (action, resources) in per_action {
        let signature = resources.iter().cloned().collect::<Vec<_>>().join("\u{0}");
        let entry = groups.entry(signature).or_insert_with(|| (BTreeSet::new(), resources));
        entry.0.insert(action);
    }

    let mut statements: Vec<Statement> = groups
        .into_values()
        .map(|(actions, resources)| Statement {
            effect: "Allow".to_string(),
            action: actions.into_iter().collect(),
            resource: Some(resources.into_iter().collect()),
        })
        .collect();
    statements.sort_by(|a, b| a.action.cmp(&b.action));

    PolicyDocument {
        version: version.to_string(),
        statement: statements,
        ..Default::default()
    }
}

/// Validate and persist a policy document: replaces the structured grants
/// of the policy and stores the raw document, in one transaction, then
/// bumps the permission version of every bound user. No partial write on
/// validation failure.
pub async fn save_policy_document(
    db: &DatabaseConnection,
    politica_id: i64,
    raw: &str,
) -> Result<Vec<GrantSpec>, LlinatgeError> {
    let doc = parse_document(raw).map_err(|e| LlinatgeError::BadRequest(e.to_string()))?;
    let grants =
        compile_document(&doc).map_err(|e| LlinatgeError::BadRequest(e.to_string()))?;

    let existing = entities::Politica::find_by_id(politica_id)
        .one(db)
        .await?
        .ok_or_else(|| LlinatgeError::NotFound(format!("politica {politica_id}")))?;

    let txn = db.begin().await?;

    entities::PoliticaGrant::delete_many()
        .filter(politica_grant::Column::PoliticaId.eq(politica_id))
        .exec(&txn)
        .await?;

    if !grants.is_empty() {
        let rows: Vec<politica_grant::ActiveModel> = grants
            .iter()
            .map(|g| politica_grant::ActiveModel {
                politica_id: Set(politica_id),
                perm_key: Set(g.perm_key.clone()),
                scope_type: Set(g.scope.as_str().to_string()),
                scope_id: Set(g.scope_id),
                include_children: Set(i64::from(g.include_descendants)),
                ..Default::default()
            })
            .collect();
        entities::PoliticaGrant::insert_many(rows).exec(&txn).await?;
    }

    let mut active: politica::ActiveModel = existing.into_active_model();
    active.document = Set(Some(raw.to_string()));
    active.update(&txn).await?;

    txn.commit().await?;

    let bumped = crate::storage::bump_versions_for_politica(db, politica_id).await?;
    tracing::info!(
        politica_id,
        grants = grants.len(),
        users_invalidated = bumped,
        "Saved policy document"
    );

    Ok(grants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_forms() {
        assert_eq!(
            parse_resource("global").unwrap(),
            (ScopeKind::Global, None, true)
        );
        assert_eq!(parse_resource("*").unwrap(), (ScopeKind::Global, None, true));
        assert_eq!(
            parse_resource("provincia:3").unwrap(),
            (ScopeKind::Provincia, Some(3), false)
        );
        assert_eq!(
            parse_resource("provincia:3/*").unwrap(),
            (ScopeKind::Provincia, Some(3), true)
        );

        assert!(matches!(
            parse_resource("provincia"),
            Err(AuthzError::InvalidResource(_))
        ));
        assert!(matches!(
            parse_resource("regio:3"),
            Err(AuthzError::UnknownScopeKind(_))
        ));
        assert!(matches!(
            parse_resource("provincia:0"),
            Err(AuthzError::InvalidScopeId(_))
        ));
        assert!(matches!(
            parse_resource("provincia:-4"),
            Err(AuthzError::InvalidScopeId(_))
        ));
        assert!(matches!(
            parse_resource("global:1"),
            Err(AuthzError::InvalidResource(_))
        ));
    }

    #[test]
    fn test_compile_basic_statement() {
        let doc = parse_document(
            r#"{"Version":"2024-02-07","Statement":[{"Effect":"Allow","Action":["territori.municipis.view"],"Resource":["provincia:3/*"]}]}"#,
        )
        .unwrap();
        let grants = compile_document(&doc).unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].perm_key, "territori.municipis.view");
        assert_eq!(grants[0].scope, ScopeKind::Provincia);
        assert_eq!(grants[0].scope_id, Some(3));
        assert!(grants[0].include_descendants);
    }

    #[test]
    fn test_compile_rejects_deny() {
        let doc = parse_document(
            r#"{"Version":"2024-02-07","Statement":[{"Effect":"Deny","Action":["territori.municipis.view"]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            compile_document(&doc),
            Err(AuthzError::UnsupportedEffect(_))
        ));
    }

    #[test]
    fn test_compile_rejects_unknown_action() {
        let doc = parse_document(
            r#"{"Version":"2024-02-07","Statement":[{"Effect":"Allow","Action":["territori.municipis.destroy"]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            compile_document(&doc),
            Err(AuthzError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_omitted_resource_means_global() {
        let doc = parse_document(
            r#"{"Version":"2024-02-07","Statement":[{"Effect":"Allow","Action":["admin.jobs.view"]}]}"#,
        )
        .unwrap();
        let grants = compile_document(&doc).unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].scope, ScopeKind::Global);
        assert_eq!(grants[0].scope_id, None);
    }

    #[test]
    fn test_star_action_expands_catalog() {
        let doc = parse_document(
            r#"{"Version":"2024-02-07","Statement":[{"Effect":"Allow","Action":["*"],"Resource":["municipi:5"]}]}"#,
        )
        .unwrap();
        let grants = compile_document(&doc).unwrap();
        assert_eq!(grants.len(), catalog::ACTIONS.len());
        assert!(grants.iter().all(|g| g.scope == ScopeKind::Municipi));
    }

    #[test]
    fn test_duplicate_grants_collapse() {
        let doc = parse_document(
            r#"{"Version":"2024-02-07","Statement":[
                {"Effect":"Allow","Action":["admin.jobs.view"],"Resource":["municipi:5"]},
                {"Effect":"Allow","Action":["admin.jobs.view"],"Resource":["municipi:5"]}
            ]}"#,
        )
        .unwrap();
        let grants = compile_document(&doc).unwrap();
        assert_eq!(grants.len(), 1);
    }

    #[test]
    fn test_document_round_trip_is_byte_identical() {
        let raw = r#"{"Version":"2024-02-07","Statement":[{"Effect":"Allow","Action":["territori.municipis.view"],"Resource":["provincia:3/*"]}]}"#;
        let doc = parse_document(raw).unwrap();
        let grants = compile_document(&doc).unwrap();

        let emitted = document_from_grants("2024-02-07", &grants);
        let emitted_json = serde_json::to_string(&emitted).unwrap();
        assert_eq!(emitted_json, raw);

        // Parse the emission again; the second emission is identical.
        let reparsed = parse_document(&emitted_json).unwrap();
        let regrants = compile_document(&reparsed).unwrap();
        let reemitted = serde_json::to_string(&document_from_grants("2024-02-07", &regrants))
            .unwrap();
        assert_eq!(reemitted, emitted_json);
    }

    #[test]
    fn test_emission_sorts_actions_and_resources() {
        let grants = vec![
            GrantSpec {
                perm_key: "territori.municipis.view".into(),
                scope: ScopeKind::Provincia,
                scope_id: Some(3),
                include_descendants: true,
            },
            GrantSpec {
                perm_key: "documentals.llibres.view".into(),
                scope: ScopeKind::Provincia,
                scope_id: Some(3),
                include_descendants: true,
            },
            GrantSpec {
                perm_key: "documentals.llibres.view".into(),
                scope: ScopeKind::Arxiu,
                scope_id: Some(7),
                include_descendants: false,
            },
        ];
        let doc = document_from_grants("2024-02-07", &grants);
        // Two distinct resource sets: {arxiu:7, provincia:3/*} for llibres.view,
        // {provincia:3/*} for municipis.view.
        assert_eq!(doc.statement.len(), 2);
        assert_eq!(doc.statement[0].action, vec!["documentals.llibres.view"]);
        assert_eq!(
            doc.statement[0].resource.as_deref().unwrap(),
            ["arxiu:7", "provincia:3/*"]
        );
        assert_eq!(doc.statement[1].action, vec!["territori.municipis.view"]);
    }

    #[test]
    fn test_legacy_flags_survive_serde() {
        let raw = r#"{"Version":"2019-06-01","CanManageArxius":true}"#;
        let doc = parse_document(raw).unwrap();
        assert!(doc.can_manage_arxius);
        assert!(!doc.can_manage_tot);
        assert!(doc.statement.is_empty());
        assert_eq!(serde_json::to_string(&doc).unwrap(), raw);
    }
}
