// ── Batch runner ──
//
// The facade the CLI drives: fetch the registry when the batch needs it,
// plan, execute, aggregate. Each run_* method is one complete batch
// against one device; preview_* methods produce the same plan without
// sending anything.

use tracing::info;

use dpctl_api::{CcClient, paths};

use crate::error::CoreError;
use crate::execute::{self, ExecutorOptions};
use crate::model::{DeleteBatch, DesiredBatch, EntityKind};
use crate::plan;
use crate::registry::IndexRegistry;
use crate::report::{BatchPreview, BatchReport};

/// Phrases the policy-update endpoint buries in 200 bodies on failure.
const FAILURE_PHRASES: [&str; 5] = ["error", "fail", "exception", "timeout", "denied"];

/// Orchestrates batches against one device through one client session.
pub struct BatchRunner<'a> {
    client: &'a CcClient,
    device: String,
    options: ExecutorOptions,
}

impl<'a> BatchRunner<'a> {
    pub fn new(client: &'a CcClient, device: impl Into<String>) -> Self {
        Self {
            client,
            device: device.into(),
            options: ExecutorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    // ── Create ───────────────────────────────────────────────────────

    /// Create everything in `batch`, in dependency order.
    pub async fn run_create(&self, batch: &DesiredBatch) -> Result<BatchReport, CoreError> {
        let plan = plan::plan_create(&self.device, batch);
        self.run(plan).await
    }

    pub fn preview_create(&self, batch: &DesiredBatch) -> BatchPreview {
        let plan = plan::plan_create(&self.device, batch);
        BatchPreview::from_plan(&self.device, &plan)
    }

    // ── Edit ─────────────────────────────────────────────────────────

    /// Edit everything in `batch`. Protections without an explicit index
    /// are resolved by name through the live attack table.
    pub async fn run_edit(&self, batch: &DesiredBatch) -> Result<BatchReport, CoreError> {
        let registry = self.edit_registry(batch).await?;
        let plan = plan::plan_edit(&self.device, batch, registry.as_ref());
        self.run(plan).await
    }

    pub async fn preview_edit(&self, batch: &DesiredBatch) -> Result<BatchPreview, CoreError> {
        let registry = self.edit_registry(batch).await?;
        let plan = plan::plan_edit(&self.device, batch, registry.as_ref());
        Ok(BatchPreview::from_plan(&self.device, &plan))
    }

    async fn edit_registry(
        &self,
        batch: &DesiredBatch,
    ) -> Result<Option<IndexRegistry>, CoreError> {
        if batch.cl_protections.iter().any(|p| p.index.is_none()) {
            Ok(Some(self.fetch_registry().await?))
        } else {
            Ok(None)
        }
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// Delete everything in `batch`, policies first.
    pub async fn run_delete(&self, batch: &DeleteBatch) -> Result<BatchReport, CoreError> {
        let registry = self.delete_registry(batch, false).await?;
        let plan = plan::plan_delete(&self.device, batch, registry.as_ref(), false);
        self.run(plan).await
    }

    pub async fn preview_delete(&self, batch: &DeleteBatch) -> Result<BatchPreview, CoreError> {
        let registry = self.delete_registry(batch, true).await?;
        let plan = plan::plan_delete(&self.device, batch, registry.as_ref(), true);
        Ok(BatchPreview::from_plan(&self.device, &plan))
    }

    async fn delete_registry(
        &self,
        batch: &DeleteBatch,
        preview: bool,
    ) -> Result<Option<IndexRegistry>, CoreError> {
        if batch.needs_registry(preview) {
            Ok(Some(self.fetch_registry().await?))
        } else {
            Ok(None)
        }
    }

    // ── Shared plumbing ──────────────────────────────────────────────

    /// One registry read per batch; a failure here aborts before any
    /// operation is attempted.
    async fn fetch_registry(&self) -> Result<IndexRegistry, CoreError> {
        IndexRegistry::fetch(self.client, &self.device, EntityKind::ClProtection).await
    }

    async fn run(&self, plan: Vec<plan::ResolvedOperation>) -> Result<BatchReport, CoreError> {
        info!(device = %self.device, operations = plan.len(), "executing batch");
        let outcomes = execute::execute(self.client, &self.device, &plan, self.options).await;
        let report = BatchReport::aggregate(outcomes);
        info!(
            device = %self.device,
            status = %report.status,
            succeeded = report.summary.succeeded,
            failed = report.summary.failed,
            "batch finished"
        );
        Ok(report)
    }

    // ── Device lock ──────────────────────────────────────────────────

    /// Acquire the device configuration lock.
    pub async fn lock(&self) -> Result<(), CoreError> {
        self.client.lock_device(&self.device).await?;
        Ok(())
    }

    /// Release the device configuration lock.
    pub async fn unlock(&self) -> Result<(), CoreError> {
        self.client.unlock_device(&self.device).await?;
        Ok(())
    }

    // ── Policy activation ────────────────────────────────────────────

    /// Push pending policy changes into the device's active configuration.
    ///
    /// Table writes leave policies in a pending state; this is the
    /// explicit activation step.
    pub async fn apply_policy_updates(&self) -> Result<(), CoreError> {
        let path = paths::update_policies_path(&self.device);
        let resp = self.client.post(&path, None).await?;

        if !resp.is_success() {
            return Err(CoreError::RemoteRejected {
                status: resp.status,
                body: resp.body,
            });
        }
        if let Some(message) = execute::embedded_error(&resp.body) {
            return Err(CoreError::RemoteRejected { status: resp.status, body: message });
        }
        // The update endpoint reports some failures as 200 with an error
        // phrase in an otherwise unstructured body.
        let lowered = resp.body.to_lowercase();
        if FAILURE_PHRASES.iter().any(|p| lowered.contains(p)) {
            return Err(CoreError::RemoteRejected { status: resp.status, body: resp.body });
        }

        info!(device = %self.device, "policy updates applied");
        Ok(())
    }
}
