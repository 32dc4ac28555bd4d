//! Password hashing, access tokens, and password-reset tokens.

pub mod password;
pub mod reset;
pub mod token;

pub use password::{hash_password, verify_password};
pub use reset::{hash_reset_token, issue_reset_token, ResetToken};
pub use token::{auth_cookie, logout_cookie, password_changed_after, sign_token, verify_token, Claims};
