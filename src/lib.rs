//! Llinatge - collaborative genealogy platform core
//!
//! This library provides the two load-bearing subsystems of the platform:
//! the hierarchical authorization engine and the moderated wiki-change
//! pipeline, together with the territorial closure index and admin job
//! tracking they depend on. HTTP handlers live elsewhere and call in
//! through [`app::App`].

pub mod app;
pub mod authz;
pub mod closure;
pub mod entities;
pub mod errors;
pub mod jobs;
pub mod moderation;
pub mod rebuild;
pub mod settings;
pub mod storage;
