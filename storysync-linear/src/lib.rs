//! storysync Linear boundary: API client, gateway, resolver, filters.
//!
//! - [`client`]: the [`LinearClient`] seam and wire types
//! - [`http`]: reqwest-backed GraphQL client
//! - [`gateway`]: typed create/update/fetch over any client
//! - [`resolver`]: names → ids, cached per run
//! - [`filter`]: export filters → `IssueFilter` JSON

pub mod client;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod resolver;

pub use client::{IssueInput, LinearClient, UserQuery};
pub use error::{ClientError, GatewayError, ResolveError};
pub use filter::{build_issue_filter, ExportFilter};
pub use gateway::{Gateway, RemoteIssue};
pub use http::HttpClient;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockClient;
pub use resolver::{is_identifier, LabelResolution, Resolver};
