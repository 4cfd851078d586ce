//! Public models for the adoption module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the adoption engine and its consumers. Status enums serialize to
//! their snake_case wire names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Applications
// =============================================================================

/// Lifecycle status of an adoption application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    ConsultationPending,
    ConsultationCompleted,
    AdoptionApproved,
    AdoptionRejected,
}

impl ApplicationStatus {
    pub const ALL: [Self; 4] = [
        Self::ConsultationPending,
        Self::ConsultationCompleted,
        Self::AdoptionApproved,
        Self::AdoptionRejected,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsultationPending => "consultation_pending",
            Self::ConsultationCompleted => "consultation_completed",
            Self::AdoptionApproved => "adoption_approved",
            Self::AdoptionRejected => "adoption_rejected",
        }
    }

    /// Returns `true` if no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::AdoptionApproved | Self::AdoptionRejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authoritative ledger record of one adoption inquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub breeder_id: Uuid,
    pub adopter_id: Uuid,
    pub pet_id: Option<Uuid>,
    pub status: ApplicationStatus,
    pub form_answers: BTreeMap<String, String>,
    pub applied_at: OffsetDateTime,
    pub processed_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

/// Input for submitting a new application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewApplication {
    pub breeder_id: Uuid,
    pub pet_id: Option<Uuid>,
    pub form_answers: BTreeMap<String, String>,
    pub privacy_consent: bool,
}

/// Breeder-side mirror entry of an application (read-model projection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedApplication {
    pub application_id: Uuid,
    pub adopter_id: Uuid,
    pub adopter_name: String,
    pub pet_id: Option<Uuid>,
    pub status: ApplicationStatus,
    pub applied_at: OffsetDateTime,
    pub processed_at: Option<OffsetDateTime>,
}

/// Success payload of a lifecycle operation: entity id plus echoed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReceipt<S> {
    pub id: Uuid,
    pub status: S,
}

// =============================================================================
// Breeders
// =============================================================================

/// Breeder verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Reviewing,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Reviewing, Self::Approved, Self::Rejected];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription plan requested with a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreederPlan {
    #[default]
    Basic,
    Pro,
}

/// A document attached to a verification request. Only the storage key is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDocument {
    pub kind: String,
    pub file_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Verification {
    pub status: VerificationStatus,
    pub plan: BreederPlan,
    pub documents: Vec<VerificationDocument>,
    pub submitted_at: Option<OffsetDateTime>,
    pub reviewed_at: Option<OffsetDateTime>,
    pub rejection_reason: Option<String>,
}

/// Derived counters owned by the consistency engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BreederStats {
    pub total_applications: u64,
    pub completed_adoptions: u64,
    pub average_rating: f64,
    pub total_reviews: u64,
    pub profile_views: u64,
}

/// Report lifecycle status (breeder reports and moderation queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewing,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    NoContract,
    FalseInformation,
    InappropriateContent,
    Fraud,
    Other,
}

/// A report filed by an adopter against a breeder, embedded in the breeder aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreederReport {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reason: ReportReason,
    pub description: String,
    pub status: ReportStatus,
    pub reported_at: OffsetDateTime,
    pub resolved_at: Option<OffsetDateTime>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breeder {
    pub id: Uuid,
    pub name: String,
    /// Storage key of the profile image, never a URL.
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub verification: Verification,
    pub stats: BreederStats,
    pub received_applications: Vec<ReceivedApplication>,
    pub reports: Vec<BreederReport>,
}

impl Breeder {
    /// Creates a breeder with a fresh `pending` verification and zeroed counters.
    #[must_use]
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            profile_image: None,
            location: None,
            verification: Verification::default(),
            stats: BreederStats::default(),
            received_applications: Vec::new(),
            reports: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.verification.status == VerificationStatus::Approved
    }
}

/// Public view of an approved breeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreederProfile {
    pub id: Uuid,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub location: Option<String>,
    pub plan: BreederPlan,
    pub stats: BreederStats,
}

/// Pet availability as reported by the pet catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetStatus {
    Available,
    Reserved,
    Adopted,
}

/// Admin decision on a verification under review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationDecision {
    Approve,
    Reject { reason: Option<String> },
}

/// Terminal outcome an admin assigns to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Resolved,
    Dismissed,
}

impl From<ReportOutcome> for ReportStatus {
    fn from(outcome: ReportOutcome) -> Self {
        match outcome {
            ReportOutcome::Resolved => Self::Resolved,
            ReportOutcome::Dismissed => Self::Dismissed,
        }
    }
}

/// A breeder report together with the breeder it was filed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreederReportView {
    pub breeder_id: Uuid,
    pub breeder_name: String,
    pub report: BreederReport,
}

// =============================================================================
// Adopters
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Deactivated,
}

/// Cached snapshot of a breeder taken when the favorite was added.
///
/// Snapshots are not refreshed when the breeder profile changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteBreeder {
    pub breeder_id: Uuid,
    pub breeder_name: String,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub added_at: OffsetDateTime,
}

/// Read-side view of a favorite with the profile image resolved to a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteBreederView {
    pub breeder_id: Uuid,
    pub breeder_name: String,
    pub profile_image_url: Option<String>,
    pub location: Option<String>,
    pub added_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adopter {
    pub id: Uuid,
    pub name: String,
    pub account_status: AccountStatus,
    pub favorite_breeders: Vec<FavoriteBreeder>,
}

impl Adopter {
    #[must_use]
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            account_status: AccountStatus::Active,
            favorite_breeders: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    Consultation,
    Adoption,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub breeder_id: Uuid,
    pub adopter_id: Uuid,
    pub review_type: ReviewType,
    /// Star rating, 1 to 5.
    pub rating: u8,
    pub content: String,
    pub written_at: OffsetDateTime,
    pub is_visible: bool,
    /// Set while the review's report is pending or under review.
    pub is_reported: bool,
    /// The latest report filed against this review.
    pub report: Option<ReviewReport>,
}

/// Report flagged on a review. Follows the same lifecycle as a breeder report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub reporter_id: Uuid,
    pub reason: String,
    pub status: ReportStatus,
    pub reported_at: OffsetDateTime,
    pub resolved_at: Option<OffsetDateTime>,
    pub admin_notes: Option<String>,
}

impl ReviewReport {
    #[must_use]
    pub fn pending(reporter_id: Uuid, reason: String, reported_at: OffsetDateTime) -> Self {
        Self {
            reporter_id,
            reason,
            status: ReportStatus::Pending,
            reported_at,
            resolved_at: None,
            admin_notes: None,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub breeder_id: Uuid,
    pub review_type: ReviewType,
    pub rating: u8,
    pub content: String,
}

// =============================================================================
// Admins
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct AdminPermissions {
    pub can_manage_users: bool,
    pub can_manage_breeders: bool,
    pub can_manage_reports: bool,
    pub can_manage_statistics: bool,
}

impl AdminPermissions {
    /// All permission flags set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            can_manage_users: true,
            can_manage_breeders: true,
            can_manage_reports: true,
            can_manage_statistics: true,
        }
    }
}

/// A single permission flag, used when checking admin capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPermission {
    ManageUsers,
    ManageBreeders,
    ManageReports,
    ManageStatistics,
}

impl AdminPermission {
    #[must_use]
    pub const fn granted_by(self, permissions: &AdminPermissions) -> bool {
        match self {
            Self::ManageUsers => permissions.can_manage_users,
            Self::ManageBreeders => permissions.can_manage_breeders,
            Self::ManageReports => permissions.can_manage_reports,
            Self::ManageStatistics => permissions.can_manage_statistics,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageUsers => "can_manage_users",
            Self::ManageBreeders => "can_manage_breeders",
            Self::ManageReports => "can_manage_reports",
            Self::ManageStatistics => "can_manage_statistics",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    ApproveBreeder,
    RejectBreeder,
    SuspendUser,
    ActivateUser,
    DeactivateUser,
    ReviewReport,
    ResolveReport,
    DismissReport,
    HideReview,
    OverrideApplication,
    ReconcileStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Breeder,
    Adopter,
    Report,
    Review,
    Application,
}

/// Immutable audit entry for one privileged mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub action: AdminAction,
    pub target_type: TargetType,
    pub target_id: Uuid,
    pub target_name: Option<String>,
    pub description: String,
    pub performed_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub permissions: AdminPermissions,
    pub activity_logs: Vec<ActivityLogEntry>,
}

impl Admin {
    #[must_use]
    pub fn new(id: Uuid, name: impl Into<String>, permissions: AdminPermissions) -> Self {
        Self {
            id,
            name: name.into(),
            permissions,
            activity_logs: Vec::new(),
        }
    }
}

// =============================================================================
// Queries and aggregates
// =============================================================================

/// Skip/limit pagination. A missing limit falls back to the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub skip: usize,
    pub limit: Option<usize>,
}

impl ListQuery {
    #[must_use]
    pub const fn new(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }
}

/// A page of results plus the total number of matching items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Platform-wide counts for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlatformStats {
    pub breeders_by_verification: BTreeMap<String, usize>,
    pub applications_by_status: BTreeMap<String, usize>,
    pub pending_reports: usize,
    pub reported_reviews: usize,
    pub hidden_reviews: usize,
}
