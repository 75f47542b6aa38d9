use miette::Diagnostic;
use thiserror::Error;

/// Policy-document validation failures. All of these are raised at save
/// time; nothing is written when any statement is invalid.
#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Invalid policy document: {0}")]
    #[diagnostic(
        code(llinatge::authz::invalid_document),
        help("The document must be JSON with a `Version` string and a `Statement` array")
    )]
    InvalidDocument(String),

    #[error("Unknown action `{0}`")]
    #[diagnostic(
        code(llinatge::authz::unknown_action),
        help("Action keys belong to the closed catalog (admin.*, territori.*, documentals.*, municipis.*); \"*\" expands to the full catalog")
    )]
    UnknownAction(String),

    #[error("Unsupported effect `{0}`")]
    #[diagnostic(
        code(llinatge::authz::unsupported_effect),
        help("Only `Allow` statements are accepted")
    )]
    UnsupportedEffect(String),

    #[error("Invalid resource `{0}`")]
    #[diagnostic(
        code(llinatge::authz::invalid_resource),
        help("Resource syntax: \"<scope_kind>:<id>\" with optional \"/*\" suffix, or \"global\" / \"*\"")
    )]
    InvalidResource(String),

    #[error("Unknown scope kind `{0}`")]
    #[diagnostic(
        code(llinatge::authz::unknown_scope_kind),
        help("Scope kinds: global, pais, provincia, comarca, municipi, entitat_eclesiastica, arxiu, llibre")
    )]
    UnknownScopeKind(String),

    #[error("Invalid scope id in `{0}`")]
    #[diagnostic(
        code(llinatge::authz::invalid_scope_id),
        help("Scope ids must be positive integers")
    )]
    InvalidScopeId(String),
}
