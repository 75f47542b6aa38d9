//! Hierarchical authorization: a closed permission catalog, per-user
//! compiled grant snapshots, a point/list evaluator and a target resolver.
//!
//! A grant attaches an action to a point of the territorial hierarchy
//! (pais > provincia > comarca > municipi > {arxiu, entitat_eclesiastica} >
//! llibre). Evaluation matches a grant against a resolved [`types::Target`].

pub mod catalog;
pub mod engine;
pub mod errors;
pub mod policy;
pub mod resolver;
pub mod snapshot;
pub mod types;
