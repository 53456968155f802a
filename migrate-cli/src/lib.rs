//! Regex-driven import migration for PegasusSimulator on Isaac Sim 4.5.
//!
//! A [`catalog::MigrationPlan`] lists files and the ordered
//! [`catalog::RuleCatalog`] applied to them; [`rewriter::Migrator`] runs it
//! with one-time backups and reports a status per file.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod core;
pub mod rewriter;
