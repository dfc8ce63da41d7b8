//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the portal repository ports backed by
//! PostgreSQL via `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel rows and domain types. Lifecycle rules stay in the domain.
//! - **Internal models**: Row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: Database failures map onto the port error
//!   enums; rows that fail domain validation surface as `Corrupt`.
//!
//! # Example
//!
//! ```ignore
//! use portal::outbound::persistence::{DbPool, DieselApplicationRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/portal")).await?;
//! let repo = DieselApplicationRepository::new(pool);
//! ```

mod diesel_application_repository;
mod diesel_document_type_repository;
mod diesel_user_profile_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_application_repository::DieselApplicationRepository;
pub use diesel_document_type_repository::DieselDocumentTypeRepository;
pub use diesel_user_profile_repository::DieselUserProfileRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
