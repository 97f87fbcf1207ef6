//! HTTP adapter for the inventory REST API used by the Quick-Add flow.

pub mod client;
pub mod error;
pub mod proxy;

mod retry;

pub use client::{FetchedImage, InventoryClient};
pub use error::ClientError;
pub use proxy::ProxyResolver;
