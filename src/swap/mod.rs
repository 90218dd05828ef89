pub mod models;
pub mod repository;
pub mod service;

pub use models::{RequestStatus, RequestType, SwapRequest};
pub use repository::SwapStore;
pub use service::{SwapConfig, SwapService};
