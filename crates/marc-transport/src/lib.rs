//! Transport layer for the mARC relay.
//!
//! Provides:
//! - Wire protocol (JSON request and response bodies)
//! - HTTP + SSE router (feature: http)

pub mod error;
pub mod protocol;

#[cfg(feature = "http")]
pub mod http;

pub use error::TransportError;
pub use protocol::{ErrataRequest, MembershipRequest, PostRequest};
