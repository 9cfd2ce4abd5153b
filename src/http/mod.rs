//! HTTP plumbing between the runner and the backend under test

mod client;
pub mod protocol;

pub use client::{validate_base_url, ApiClient, Transport};
pub use protocol::{ApiRequest, ApiResponse, Method};
