//! Batch configuration orchestration for DefensePro appliances.
//!
//! The engine takes a typed desired-state batch, translates friendly
//! attribute values to vendor wire fields, plans an ordered list of REST
//! operations, and executes them sequentially with per-item failure
//! isolation. The result is a three-way report: success, partial
//! success, or failure, with every operation's outcome attached.
//!
//! ```no_run
//! use dpctl_core::{BatchRunner, DesiredBatch};
//!
//! # async fn run(client: &dpctl_api::CcClient) -> Result<(), dpctl_core::CoreError> {
//! let batch: DesiredBatch = serde_yaml::from_str("cl_protections: []")
//!     .map_err(|e| dpctl_core::CoreError::Validation { message: e.to_string() })?;
//! let runner = BatchRunner::new(client, "10.1.1.1");
//! let report = runner.run_create(&batch).await?;
//! println!("{}: {} succeeded", report.status, report.summary.succeeded);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod execute;
pub mod model;
pub mod plan;
pub mod registry;
pub mod report;
pub mod translate;

pub use batch::BatchRunner;
pub use error::CoreError;
pub use execute::ExecutorOptions;
pub use model::{
    AttrValue, Attributes, DeleteBatch, DeleteTarget, DesiredBatch, EntityKind, EntityRef,
    GroupRef, NamedAttrs, NetworkClassSpec, NetworkGroup, ProfileDetachment, ProfileSpec,
    ProtectionSpec, TableSpec,
};
pub use plan::{Method, ResolvedOperation};
pub use registry::IndexRegistry;
pub use report::{
    BatchPreview, BatchReport, BatchStatus, BatchSummary, OperationOutcome, OutcomeStatus,
    PlannedOperation,
};
pub use translate::ApiAttributes;
