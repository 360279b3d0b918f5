//! # platshim-pipeline
//!
//! Two build pipelines, one rule table:
//! - `intercept`: resolver interception for bundlers that expose a resolve hook
//! - `alias`: static alias tables for bundlers that only take a module map
//! - `check`: the sync report that flags drift between the two

pub mod alias;
pub mod check;
pub mod error;
pub mod intercept;

pub use alias::{ALIAS_TABLE_KIND, AliasDrift, AliasTable, DriftKind};
pub use check::{SYNC_CHECK_KIND, SyncCheckIssue, SyncCheckReport, check_pipelines};
pub use error::PipelineError;
pub use intercept::{InterceptEnvelope, InterceptPipeline};
