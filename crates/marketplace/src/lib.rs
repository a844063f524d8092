//! Client for the procurement marketplace.
//!
//! Every remote call the bid submission makes goes through
//! [`MarketplaceClient`], which builds URLs and JSON payloads and hands them
//! to a [`Transport`]. [`HttpTransport`] talks to the real marketplace over
//! HTTPS; [`InMemoryMarketplace`] replays scripted replies for tests.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod memory;
pub mod transport;

pub use client::MarketplaceClient;
pub use common::{NeedId, RemoteId};
pub use config::MarketplaceConfig;
pub use endpoint::{ENTITY_TYPE_ID, Endpoint, OPERATION_ID};
pub use error::{MarketplaceError, Result};
pub use http::HttpTransport;
pub use memory::{InMemoryMarketplace, RecordedRequest};
pub use transport::{ApiRequest, ApiResponse, Credential, Method, Transport};
