pub mod notification;
pub mod project;
pub mod quota;
pub mod user;
pub mod version;

pub use notification::*;
pub use project::*;
pub use quota::*;
pub use user::*;
pub use version::*;
