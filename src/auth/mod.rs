pub mod email_token;
pub mod jwt;
pub mod password;

pub use email_token::*;
pub use jwt::*;
pub use password::*;
