//! tagsync keeps a mirrored container image in step with its upstream.
//!
//! One run collects the upstream Docker Hub tag list, the mirror's (Aliyun
//! ACR) existing tags, and publishes a release commit plus tag to a GitHub
//! repository for every version the mirror is missing or behind on.
//!
//! # Modules
//!
//! - [`config`]: constants and the compiled-in default configuration
//! - [`tag`]: the `VersionTag` model and name-shape helpers
//! - [`registry`]: upstream and mirror collectors
//! - [`reconcile`]: the per-tag publish decision
//! - [`publish`]: GitHub release commits and tags
//! - [`sync`]: the single-pass orchestration

pub mod config;
pub mod publish;
pub mod reconcile;
pub mod registry;
pub mod sync;
pub mod tag;
