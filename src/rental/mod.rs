pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod repository;
pub mod service;
pub mod status_machine;

pub use error::*;
pub use identity::*;
pub use models::*;
pub use repository::*;
pub use service::*;
pub use status_machine::*;
