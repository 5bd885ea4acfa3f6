pub mod authentication;

pub use authentication::{extract_basic_auth, extract_bearer_token, require_session, CurrentUser};
