//! Authorization module - report access rules
//!
//! Every report operation asks the policy engine whether the acting
//! principal may perform an action on a resource before touching storage.
//! Decisions depend only on the actor's id and role and on the report owner.

mod evaluator;
mod principal;

pub use evaluator::{PolicyEvaluator, ReportPolicy};
pub use principal::{Principal, ResourceContext};

use crate::errors::AppError;

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateReport,
    ViewReport,
    ListAllReports,
    ListOwnReports,
    UpdateNotes,
    UpdateStatus,
    DeleteReport,
    DownloadFile,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateReport => "report.create",
            Action::ViewReport => "report.view",
            Action::ListAllReports => "report.list_all",
            Action::ListOwnReports => "report.list_own",
            Action::UpdateNotes => "report.update_notes",
            Action::UpdateStatus => "report.update_status",
            Action::DeleteReport => "report.delete",
            Action::DownloadFile => "report.download",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Deny becomes `Forbidden`. The message does not say which rule failed.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AppError::forbidden("you are not allowed to perform this action")),
        }
    }
}

/// Evaluate `action` and turn a denial into `AppError::Forbidden`.
pub fn ensure(
    policy: &dyn PolicyEvaluator,
    principal: &Principal,
    action: Action,
    ctx: &ResourceContext,
) -> Result<(), AppError> {
    policy.decide(principal, action, ctx).into_result()
}
