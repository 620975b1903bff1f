pub mod guard;
pub mod response;

pub use guard::{guard_decision, require_admin, AdminSession, GuardDecision, AUTH_FLAG_KEY, LOGIN_PATH};
pub use response::{ApiResponse, ApiResult};
