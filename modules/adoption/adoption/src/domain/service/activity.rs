//! Admin activity log: append-only, best-effort.

use adoption_sdk::{ActivityLogEntry, AdminAction, TargetType};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::consistency::ConsistencyEngine;
use crate::domain::error::DomainError;

/// One privileged mutation to be recorded against an admin.
#[derive(Debug, Clone)]
pub struct AdminActivity {
    pub action: AdminAction,
    pub target_type: TargetType,
    pub target_id: Uuid,
    pub target_name: Option<String>,
    pub description: String,
}

impl AdminActivity {
    #[must_use]
    pub fn new(action: AdminAction, target_type: TargetType, target_id: Uuid) -> Self {
        Self {
            action,
            target_type,
            target_id,
            target_name: None,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn target_name(mut self, name: impl Into<String>) -> Self {
        self.target_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl ConsistencyEngine {
    /// Appends an entry to the admin's activity log.
    ///
    /// Never fails the calling operation: a missing admin or a failed append
    /// is logged and the entry is skipped.
    pub async fn log_admin_activity(&self, admin_id: Uuid, activity: AdminActivity) {
        let entry = ActivityLogEntry {
            id: Uuid::now_v7(),
            action: activity.action,
            target_type: activity.target_type,
            target_id: activity.target_id,
            target_name: activity.target_name,
            description: activity.description,
            performed_at: OffsetDateTime::now_utc(),
        };

        match self.repos().admins.append_activity(admin_id, entry).await {
            Ok(true) => {
                debug!(admin_id = %admin_id, action = ?activity.action, "Recorded admin activity");
            }
            Ok(false) => {
                warn!(admin_id = %admin_id, action = ?activity.action, "Admin not found, activity log entry skipped");
            }
            Err(e) => {
                warn!(admin_id = %admin_id, action = ?activity.action, error = %e, "Failed to append admin activity, entry skipped");
            }
        }
    }

    /// The admin's newest `recent_activity_limit` entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the admin does not exist.
    pub async fn recent_admin_activity(
        &self,
        admin_id: Uuid,
    ) -> Result<Vec<ActivityLogEntry>, DomainError> {
        self.repos()
            .admins
            .recent_activity(admin_id, self.config().recent_activity_limit)
            .await?
            .ok_or_else(|| DomainError::not_found("Admin", admin_id))
    }
}
