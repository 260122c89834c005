pub mod rest;
pub mod session;

pub use rest::{ApiError, Collection, RestClient};
pub use session::SessionStore;
