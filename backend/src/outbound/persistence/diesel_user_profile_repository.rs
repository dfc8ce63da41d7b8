//! PostgreSQL-backed `UserProfileRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserProfileRepository};
use crate::domain::{User, UserDraft, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{NewUserRow, UserProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed profile repository.
#[derive(Clone)]
pub struct DieselUserProfileRepository {
    pool: DbPool,
}

impl DieselUserProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let role = row
        .role
        .parse()
        .map_err(|err| UserPersistenceError::corrupt(format!("user {}: {err}", row.id)))?;
    User::try_from(UserDraft {
        id: UserId::from_uuid(row.id),
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        middle_name: row.middle_name,
        contact_number: row.contact_number,
        address: row.address,
        role,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(|err| UserPersistenceError::corrupt(format!("user {}: {err}", row.id)))
}

#[async_trait]
impl UserProfileRepository for DieselUserProfileRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            email: user.email().as_ref(),
            first_name: user.first_name().as_ref(),
            last_name: user.last_name().as_ref(),
            middle_name: user.middle_name().map(AsRef::as_ref),
            contact_number: user.contact_number().as_ref(),
            address: user.address().as_ref(),
            role: user.role().as_str(),
            is_active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if unique_violation(&err).is_some() {
                    UserPersistenceError::duplicate_email(user.email().as_ref())
                } else {
                    diesel_error(err)
                }
            })
    }

    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changes = UserProfileUpdate {
            first_name: user.first_name().as_ref(),
            last_name: user.last_name().as_ref(),
            middle_name: user.middle_name().map(AsRef::as_ref),
            contact_number: user.contact_number().as_ref(),
            address: user.address().as_ref(),
            updated_at: user.updated_at(),
        };
        let updated = diesel::update(users::table.find(user.id().as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn count(&self) -> Result<u64, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}
