//! HTTP request lifecycle
//!
//! [`ApiClient`] issues requests through an [`HttpTransport`], enforces a
//! timeout on each one, and reduces every result to a [`RequestOutcome`].
//! The transport is a trait so tests can substitute slow, failing or
//! never-completing implementations; [`ReqwestTransport`] is the real one.

mod client;
mod transport;
mod types;

pub use crate::config::ApiConfig;
pub use client::ApiClient;
pub use transport::{HttpTransport, ReqwestTransport, TransportError};
pub use types::{
    Headers, HttpMethod, HttpRequest, HttpResponse, RequestOptions, RequestOutcome, get_header, set_header,
};
