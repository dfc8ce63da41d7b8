//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`IdentityStore`, the repositories, `DurableStorage`,
//! `ApplicationChangeFeed`) are implemented by outbound adapters. Driving ports
//! (`AccountCommand`, `ApplicationCommand`, `ApplicationQuery`) are
//! implemented by domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod application_change_feed;
mod application_command;
mod application_query;
mod application_repository;
mod document_type_repository;
mod durable_storage;
mod identity_store;
mod user_profile_repository;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::{AccountCommand, AuthenticatedAccount};
#[cfg(test)]
pub use application_change_feed::MockApplicationChangeFeed;
pub use application_change_feed::{
    ApplicationChangeFeed, ChangeStream, ChangeSubscription, NoOpChangeFeed,
};
#[cfg(test)]
pub use application_command::MockApplicationCommand;
pub use application_command::{
    ApplicationCommand, ProcessApplicationRequest, SubmitApplicationRequest,
};
#[cfg(test)]
pub use application_query::MockApplicationQuery;
pub use application_query::ApplicationQuery;
#[cfg(test)]
pub use application_repository::MockApplicationRepository;
pub use application_repository::{
    ApplicationListQuery, ApplicationPersistenceError, ApplicationRepository,
};
#[cfg(test)]
pub use document_type_repository::MockDocumentTypeRepository;
pub use document_type_repository::{DocumentTypePersistenceError, DocumentTypeRepository};
#[cfg(test)]
pub use durable_storage::MockDurableStorage;
pub use durable_storage::{DurableStorage, DurableStorageError, validate_key};
#[cfg(test)]
pub use identity_store::MockIdentityStore;
pub use identity_store::{Identity, IdentitySession, IdentityStore, IdentityStoreError};
#[cfg(test)]
pub use user_profile_repository::MockUserProfileRepository;
pub use user_profile_repository::{UserPersistenceError, UserProfileRepository};
