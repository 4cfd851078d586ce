//! Transition tables for the application, verification and report state machines.
//!
//! Every check returns [`Transition::AlreadyApplied`] when the target equals the
//! current state of a settled record, so client retries succeed without
//! re-running the transition.

use adoption_sdk::{ApplicationStatus, ReportStatus, VerificationStatus};

use super::error::DomainError;

/// Outcome of validating a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The write must be performed.
    Apply,
    /// The record is already in the requested state.
    AlreadyApplied,
}

/// Validates an application status change.
///
/// `consultation_pending -> consultation_completed -> adoption_approved | adoption_rejected`,
/// and the consultation step may be skipped.
///
/// # Errors
///
/// Returns `Validation` for any move out of a terminal state or backwards.
pub fn application_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<Transition, DomainError> {
    use ApplicationStatus::{
        AdoptionApproved, AdoptionRejected, ConsultationCompleted, ConsultationPending,
    };

    match (from, to) {
        (ConsultationPending, ConsultationCompleted | AdoptionApproved | AdoptionRejected)
        | (ConsultationCompleted, AdoptionApproved | AdoptionRejected) => Ok(Transition::Apply),
        (a, b) if a == b && a != ConsultationPending => Ok(Transition::AlreadyApplied),
        _ => Err(DomainError::validation(
            "status",
            format!("cannot move application from {from} to {to}"),
        )),
    }
}

/// Validates a breeder's (re-)submission of verification documents.
///
/// # Errors
///
/// Returns `Validation` when the breeder is already approved.
pub fn verification_submission(from: VerificationStatus) -> Result<Transition, DomainError> {
    match from {
        VerificationStatus::Pending
        | VerificationStatus::Reviewing
        | VerificationStatus::Rejected => Ok(Transition::Apply),
        VerificationStatus::Approved => Err(DomainError::validation(
            "verification",
            "breeder is already approved",
        )),
    }
}

/// Validates an admin decision on a verification.
///
/// # Errors
///
/// Returns `Validation` when nothing was submitted or a different decision was already made.
pub fn verification_decision(
    from: VerificationStatus,
    to: VerificationStatus,
) -> Result<Transition, DomainError> {
    match (from, to) {
        (VerificationStatus::Reviewing, VerificationStatus::Approved | VerificationStatus::Rejected) => {
            Ok(Transition::Apply)
        }
        (a, b) if a == b && matches!(a, VerificationStatus::Approved | VerificationStatus::Rejected) => {
            Ok(Transition::AlreadyApplied)
        }
        (VerificationStatus::Pending, _) => Err(DomainError::validation(
            "verification",
            "no verification has been submitted",
        )),
        _ => Err(DomainError::validation(
            "verification",
            format!("cannot move verification from {from} to {to}"),
        )),
    }
}

/// Validates a report status change.
///
/// `pending -> reviewing -> resolved | dismissed`; an admin may settle a
/// pending report directly.
///
/// # Errors
///
/// Returns `Validation` for any move out of a settled report or backwards.
pub fn report_transition(from: ReportStatus, to: ReportStatus) -> Result<Transition, DomainError> {
    match (from, to) {
        (ReportStatus::Pending, ReportStatus::Reviewing | ReportStatus::Resolved | ReportStatus::Dismissed)
        | (ReportStatus::Reviewing, ReportStatus::Resolved | ReportStatus::Dismissed) => {
            Ok(Transition::Apply)
        }
        (a, b) if a == b && a != ReportStatus::Pending => Ok(Transition::AlreadyApplied),
        _ => Err(DomainError::validation(
            "status",
            format!("cannot move report from {from} to {to}"),
        )),
    }
}
