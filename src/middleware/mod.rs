pub mod auth;
pub mod metrics;
pub mod quota;

pub use auth::*;
pub use metrics::*;
pub use quota::*;
