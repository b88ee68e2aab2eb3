use super::principal::{Principal, ResourceContext};
use super::{Action, Decision};

/// Policy evaluator trait for pluggable authorization logic
pub trait PolicyEvaluator: Send + Sync {
    /// Decide whether the principal may perform `action` on the resource
    fn decide(&self, principal: &Principal, action: Action, ctx: &ResourceContext) -> Decision;
}

/// Role and ownership rules for reports
///
/// | action                         | allowed when            |
/// |--------------------------------|-------------------------|
/// | create, list all, list own     | any authenticated actor |
/// | view, download, notes, delete  | manager or owner        |
/// | update status                  | manager                 |
#[derive(Debug, Clone, Default)]
pub struct ReportPolicy;

impl ReportPolicy {
    pub fn new() -> Self {
        Self
    }

    fn rule(principal: &Principal, action: Action, ctx: &ResourceContext) -> bool {
        match action {
            Action::CreateReport | Action::ListAllReports | Action::ListOwnReports => true,
            Action::ViewReport | Action::DownloadFile | Action::UpdateNotes | Action::DeleteReport => {
                principal.is_manager() || principal.owns(ctx)
            }
            Action::UpdateStatus => principal.is_manager(),
        }
    }
}

impl PolicyEvaluator for ReportPolicy {
    fn decide(&self, principal: &Principal, action: Action, ctx: &ResourceContext) -> Decision {
        let decision = if Self::rule(principal, action, ctx) {
            Decision::Allow
        } else {
            Decision::Deny
        };

        tracing::debug!(
            user_id = %principal.user_id,
            role = %principal.role,
            action = action.as_str(),
            resource_id = ?ctx.resource_id,
            decision = ?decision,
            "authorization decision"
        );

        decision
    }
}
