use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of hierarchy node a grant attaches to. Closed set; `Global`
/// grants apply everywhere and carry no scope id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Global,
    Pais,
    Provincia,
    Comarca,
    Municipi,
    EntitatEclesiastica,
    Arxiu,
    Llibre,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Pais => "pais",
            ScopeKind::Provincia => "provincia",
            ScopeKind::Comarca => "comarca",
            ScopeKind::Municipi => "municipi",
            ScopeKind::EntitatEclesiastica => "entitat_eclesiastica",
            ScopeKind::Arxiu => "arxiu",
            ScopeKind::Llibre => "llibre",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "global" => Some(ScopeKind::Global),
            "pais" => Some(ScopeKind::Pais),
            "provincia" => Some(ScopeKind::Provincia),
            "comarca" => Some(ScopeKind::Comarca),
            "municipi" => Some(ScopeKind::Municipi),
            "entitat_eclesiastica" => Some(ScopeKind::EntitatEclesiastica),
            "arxiu" => Some(ScopeKind::Arxiu),
            "llibre" => Some(ScopeKind::Llibre),
            _ => None,
        }
    }

    /// Strict ancestry in the canonical hierarchy:
    /// pais > provincia > comarca > municipi > {arxiu, entitat_eclesiastica}
    /// > llibre, with entitat_eclesiastica an alternate parent of arxiu.
    pub fn is_ancestor_of(self, other: ScopeKind) -> bool {
        use ScopeKind::*;
        match self {
            Global => false,
            Pais => matches!(
                other,
                Provincia | Comarca | Municipi | EntitatEclesiastica | Arxiu | Llibre
            ),
            Provincia => matches!(
                other,
                Comarca | Municipi | EntitatEclesiastica | Arxiu | Llibre
            ),
            Comarca => matches!(other, Municipi | EntitatEclesiastica | Arxiu | Llibre),
            Municipi => matches!(other, EntitatEclesiastica | Arxiu | Llibre),
            EntitatEclesiastica => matches!(other, Arxiu | Llibre),
            Arxiu => matches!(other, Llibre),
            Llibre => false,
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compiled grant of a snapshot. `scope_id` is `None` exactly for
/// `Global`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGrant {
    pub scope: ScopeKind,
    pub scope_id: Option<i64>,
    pub include_descendants: bool,
}

impl CompiledGrant {
    pub fn global() -> Self {
        Self {
            scope: ScopeKind::Global,
            scope_id: None,
            include_descendants: true,
        }
    }

    pub fn scoped(scope: ScopeKind, scope_id: i64, include_descendants: bool) -> Self {
        Self {
            scope,
            scope_id: Some(scope_id),
            include_descendants,
        }
    }
}

/// A partial hierarchy address. When several ids are populated they are
/// mutually consistent (a book's municipality matches `municipi_id`, and so
/// on); the resolver guarantees this. `regio_id` is address-only — grants
/// never attach to a region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub pais_id: Option<i64>,
    pub regio_id: Option<i64>,
    pub provincia_id: Option<i64>,
    pub comarca_id: Option<i64>,
    pub municipi_id: Option<i64>,
    pub entitat_id: Option<i64>,
    /// Set when the target is (or resolves through) exactly one archive.
    pub arxiu_id: Option<i64>,
    /// All attached archives of a book; every one participates in grant
    /// matching.
    pub arxiu_ids: Vec<i64>,
    pub llibre_id: Option<i64>,
}

impl Target {
    pub fn municipi(id: i64) -> Self {
        Self {
            municipi_id: Some(id),
            ..Default::default()
        }
    }

    /// The deepest populated grantable field, if any.
    pub fn most_specific_scope(&self) -> Option<ScopeKind> {
        if self.llibre_id.is_some() {
            Some(ScopeKind::Llibre)
        } else if self.arxiu_id.is_some() || !self.arxiu_ids.is_empty() {
            Some(ScopeKind::Arxiu)
        } else if self.entitat_id.is_some() {
            Some(ScopeKind::EntitatEclesiastica)
        } else if self.municipi_id.is_some() {
            Some(ScopeKind::Municipi)
        } else if self.comarca_id.is_some() {
            Some(ScopeKind::Comarca)
        } else if self.provincia_id.is_some() {
            Some(ScopeKind::Provincia)
        } else if self.pais_id.is_some() {
            Some(ScopeKind::Pais)
        } else {
            None
        }
    }

    /// The target's id at the given scope kind, if populated.
    pub fn scope_id(&self, kind: ScopeKind) -> Option<i64> {
        match kind {
            ScopeKind::Global => None,
            ScopeKind::Pais => self.pais_id,
            ScopeKind::Provincia => self.provincia_id,
            ScopeKind::Comarca => self.comarca_id,
            ScopeKind::Municipi => self.municipi_id,
            ScopeKind::EntitatEclesiastica => self.entitat_id,
            ScopeKind::Arxiu => self.arxiu_id,
            ScopeKind::Llibre => self.llibre_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.most_specific_scope().is_none()
    }
}

/// Structured restriction the SQL layer turns into a `WHERE` clause when
/// listing rows of some kind. `global = true` means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListScopeFilter {
    pub global: bool,
    /// Scope ids bucketed by kind, deduplicated, ascending.
    pub scopes: BTreeMap<ScopeKind, Vec<i64>>,
}

impl ListScopeFilter {
    pub fn unrestricted() -> Self {
        Self {
            global: true,
            scopes: BTreeMap::new(),
        }
    }

    /// An empty filter admits nothing; callers short-circuit to an empty
    /// result set.
    pub fn is_empty(&self) -> bool {
        !self.global && self.scopes.values().all(|v| v.is_empty())
    }
}
