pub mod auth;
pub mod timing;

pub use timing::{record_request, ViewRoute};
