//! # Notification Collaborator
//!
//! The narrow boundary to whatever delivers push/Telegram messages.
//!
//! ## Fire-and-Forget Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Settlement commits ──► dispatch() spawns a task ──► Notifier impl     │
//! │                                                                         │
//! │  • Delivery runs AFTER the transaction committed                       │
//! │  • Delivery failure is warn!'d and swallowed                           │
//! │  • A slow notifier can neither block nor abort a settlement            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Delivery failure from a notifier backend.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// What an approver needs to know about a sale waiting on them.
#[derive(Debug, Clone)]
pub struct PendingApprovalNotice {
    pub sale_id: String,
    pub customer_name: Option<String>,
    pub seller_name: String,
    pub amount_cents: i64,
}

/// The notification collaborator interface.
///
/// Implementations deliver to push/Telegram/whatever; the engine only
/// ever calls them best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tells approvers a sale is waiting for sign-off.
    async fn pending_approval(&self, notice: PendingApprovalNotice) -> Result<(), NotifyError>;
}

/// Default notifier: writes the notice to the log and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn pending_approval(&self, notice: PendingApprovalNotice) -> Result<(), NotifyError> {
        info!(
            sale_id = %notice.sale_id,
            seller = %notice.seller_name,
            amount = notice.amount_cents,
            "Sale pending approval"
        );
        Ok(())
    }
}

/// Dispatches a notice on a spawned task, swallowing any failure.
pub(crate) fn dispatch(notifier: Arc<dyn Notifier>, notice: PendingApprovalNotice) {
    tokio::spawn(async move {
        let sale_id = notice.sale_id.clone();
        if let Err(err) = notifier.pending_approval(notice).await {
            warn!(sale_id = %sale_id, error = %err, "Pending-approval notification failed");
        }
    });
}
