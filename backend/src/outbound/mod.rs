//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local repositories for tests and database-less runs
//! - **identity**: password identity stores (remote auth service or local)
//! - **notify**: in-process application change fan-out
//! - **storage**: durable key-value storage for client session caches
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod identity;
pub mod memory;
pub mod notify;
pub mod persistence;
pub mod storage;
