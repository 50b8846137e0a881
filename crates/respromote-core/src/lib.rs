//! Core library for respromote.
//!
//! Promotes the highest version of a `RuleApp`, together with the managed XOM
//! libraries and archives it depends on, from a source Rule Execution Server
//! to a destination one.
//!
//! # Layers
//!
//! - [`endpoint`]: server coordinates and the management base URL.
//! - [`io::transport`]: authenticated request/response against one server.
//! - [`io::staging`]: local directory where fetched archives are written.
//! - [`promoter`]: the promotion pipeline and its dry-run contract.
//! - [`reporter`]: diagnostic sink injected into the promoter.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod io;
pub mod promoter;
pub mod report;
pub mod reporter;

pub use config::PromoteConfig;
pub use endpoint::Endpoint;
pub use error::PromoteError;
pub use io::staging::Staging;
pub use io::transport::Transport;
pub use promoter::Promoter;
pub use report::{ArtifactOutcome, ArtifactRecord, PromotionReport, RuleAppOutcome};
pub use reporter::{NullReporter, Reporter, TracingReporter};

/// User Agent string sent with every management API request.
pub const USER_AGENT: &str = concat!("respromote/", env!("CARGO_PKG_VERSION"));

/// Staging directory used when none is configured.
pub const DEFAULT_STAGE_DIR: &str = "./data";
