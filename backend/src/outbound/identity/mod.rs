//! Identity store adapters.
//!
//! [`HttpIdentityStore`] talks to a hosted auth service; the in-memory store
//! backs tests and local runs without one.

mod http;
mod in_memory;

pub use http::{HttpIdentityConfig, HttpIdentityStore};
pub use in_memory::InMemoryIdentityStore;
