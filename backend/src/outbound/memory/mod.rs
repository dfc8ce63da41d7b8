//! Process-local repository adapters.
//!
//! Used when no database is configured and by behaviour tests. They honour
//! the same contracts as the Diesel adapters: scope is applied inside the
//! query, tracking numbers are unique, and status updates are
//! compare-and-set on the previous status.

mod applications;
mod document_types;
mod users;

pub use applications::InMemoryApplicationRepository;
pub use document_types::InMemoryDocumentTypeRepository;
pub use users::InMemoryUserProfileRepository;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
