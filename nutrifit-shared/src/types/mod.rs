pub mod api;
pub mod auth;
pub mod codes;
pub mod pagination;

pub use api::*;
pub use auth::*;
pub use pagination::*;
