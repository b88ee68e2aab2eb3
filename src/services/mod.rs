pub mod reports;
pub mod users;

pub use reports::ReportService;
pub use users::{create_user, UserService};
