// dpctl-api: HTTP/session layer for the CyberController REST API.
//
// This crate owns everything the orchestration engine treats as an
// external collaborator: TLS/transport setup, login and session renewal,
// verb helpers, and resource path construction.

pub mod client;
pub mod error;
pub mod paths;
pub mod transport;

pub use client::{ApiResponse, CcClient, ClientConfig};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
