//! Resident and staff profiles.
//!
//! A [`User`] is the profile row kept in the `users` table. Identity (the
//! password and session tokens) lives in the identity store; both share the
//! same [`UserId`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum length of first and last names.
pub const NAME_MIN: usize = 2;
/// Maximum length of any name part.
pub const NAME_MAX: usize = 100;
/// Minimum length of a postal address.
pub const ADDRESS_MIN: usize = 10;
/// Maximum length of a postal address.
pub const ADDRESS_MAX: usize = 500;
/// Maximum length of an email address.
pub const EMAIL_MAX: usize = 254;

/// Validation errors for profile values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// The identifier was blank.
    EmptyId,
    /// The identifier was not a UUID.
    InvalidId,
    /// The email address is malformed.
    InvalidEmail,
    /// A name part is shorter than [`NAME_MIN`].
    NameTooShort {
        /// Wire name of the offending field.
        field: &'static str,
        /// Minimum length.
        min: usize,
    },
    /// A name part is longer than [`NAME_MAX`].
    NameTooLong {
        /// Wire name of the offending field.
        field: &'static str,
        /// Maximum length.
        max: usize,
    },
    /// The contact number is not a Philippine mobile number.
    InvalidContactNumber,
    /// The address is shorter than [`ADDRESS_MIN`].
    AddressTooShort {
        /// Minimum length.
        min: usize,
    },
    /// The address is longer than [`ADDRESS_MAX`].
    AddressTooLong {
        /// Maximum length.
        max: usize,
    },
    /// The role string is not recognised.
    UnknownRole(String),
}

impl UserValidationError {
    /// Wire name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyId | Self::InvalidId => "id",
            Self::InvalidEmail => "email",
            Self::NameTooShort { field, .. } | Self::NameTooLong { field, .. } => *field,
            Self::InvalidContactNumber => "contactNumber",
            Self::AddressTooShort { .. } | Self::AddressTooLong { .. } => "address",
            Self::UnknownRole(_) => "role",
        }
    }

    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyId => "empty_id",
            Self::InvalidId => "invalid_id",
            Self::InvalidEmail => "invalid_email",
            Self::NameTooShort { .. } => "name_too_short",
            Self::NameTooLong { .. } => "name_too_long",
            Self::InvalidContactNumber => "invalid_contact_number",
            Self::AddressTooShort { .. } => "address_too_short",
            Self::AddressTooLong { .. } => "address_too_long",
            Self::UnknownRole(_) => "unknown_role",
        }
    }
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::InvalidEmail => write!(f, "please enter a valid email address"),
            Self::NameTooShort { field, min } => {
                write!(f, "{field} must be at least {min} characters")
            }
            Self::NameTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidContactNumber => {
                write!(f, "please enter a valid Philippine mobile number")
            }
            Self::AddressTooShort { min } => {
                write!(f, "address must be at least {min} characters")
            }
            Self::AddressTooLong { max } => write!(f, "address must be at most {max} characters"),
            Self::UnknownRole(role) => write!(f, "unknown role: {role}"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier shared by the identity store and the profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from text.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim().is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lowercased, trimmed email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::Email;
    ///
    /// let email = Email::new("  Juan.Dela.Cruz@Example.PH ").expect("valid email");
    /// assert_eq!(email.as_ref(), "juan.dela.cruz@example.ph");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.len() > EMAIL_MAX || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        let Some((local, domain)) = normalised.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        let domain_ok = !domain.contains('@')
            && domain
                .split('.')
                .filter(|label| !label.is_empty())
                .count()
                >= 2
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A trimmed name part (first, middle or last name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// Validate a required name part reported under `field`.
    pub fn new(field: &'static str, raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length < NAME_MIN {
            return Err(UserValidationError::NameTooShort {
                field,
                min: NAME_MIN,
            });
        }
        if length > NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                field,
                max: NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Validate an optional middle name; blank input yields `None`.
    pub fn optional(raw: Option<&str>) -> Result<Option<Self>, UserValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) if value.chars().count() > NAME_MAX => {
                Err(UserValidationError::NameTooLong {
                    field: "middleName",
                    max: NAME_MAX,
                })
            }
            Some(value) => Ok(Some(Self(value.to_owned()))),
        }
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Philippine mobile number in `09XXXXXXXXX`, `9XXXXXXXXX` or `+639XXXXXXXXX` form.
///
/// Whitespace is stripped before validation; the stored value keeps the
/// caller's prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactNumber(String);

impl ContactNumber {
    /// Validate a mobile number.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::ContactNumber;
    ///
    /// assert!(ContactNumber::new("0917 123 4567").is_ok());
    /// assert!(ContactNumber::new("+639171234567").is_ok());
    /// assert!(ContactNumber::new("0817 123 4567").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let compact: String = raw
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let subscriber = compact
            .strip_prefix("+63")
            .or_else(|| compact.strip_prefix('0'))
            .unwrap_or(compact.as_str());
        let valid = subscriber.len() == 10
            && subscriber.starts_with('9')
            && subscriber.chars().all(|c| c.is_ascii_digit());
        if valid {
            Ok(Self(compact))
        } else {
            Err(UserValidationError::InvalidContactNumber)
        }
    }
}

impl AsRef<str> for ContactNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Residential address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(String);

impl Address {
    /// Validate an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length < ADDRESS_MIN {
            return Err(UserValidationError::AddressTooShort { min: ADDRESS_MIN });
        }
        if length > ADDRESS_MAX {
            return Err(UserValidationError::AddressTooLong { max: ADDRESS_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Portal role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Resident requesting documents.
    Resident,
    /// Administrator reviewing requests.
    Admin,
    /// Barangay staff with read access to all requests.
    Staff,
}

impl Role {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resident" => Ok(Self::Resident),
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Raw profile values used to assemble a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    /// Identifier shared with the identity store.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Optional middle name.
    #[serde(default)]
    pub middle_name: Option<String>,
    /// Mobile number.
    pub contact_number: String,
    /// Residential address.
    pub address: String,
    /// Portal role.
    pub role: Role,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last profile change.
    pub updated_at: DateTime<Utc>,
}

/// Validated user profile.
///
/// Serialises with camelCase keys; deserialisation re-validates every field,
/// so a tampered cache entry fails to load instead of producing a bad user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserDraft", into = "UserDraft")]
pub struct User {
    id: UserId,
    email: Email,
    first_name: PersonName,
    last_name: PersonName,
    middle_name: Option<PersonName>,
    contact_number: ContactNumber,
    address: Address,
    role: Role,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserDraft> for User {
    type Error = UserValidationError;

    fn try_from(draft: UserDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            id: draft.id,
            email: Email::new(&draft.email)?,
            first_name: PersonName::new("firstName", &draft.first_name)?,
            last_name: PersonName::new("lastName", &draft.last_name)?,
            middle_name: PersonName::optional(draft.middle_name.as_deref())?,
            contact_number: ContactNumber::new(&draft.contact_number)?,
            address: Address::new(&draft.address)?,
            role: draft.role,
            is_active: draft.is_active,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }
}

impl From<User> for UserDraft {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into(),
            first_name: user.first_name.0,
            last_name: user.last_name.0,
            middle_name: user.middle_name.map(|name| name.0),
            contact_number: user.contact_number.0,
            address: user.address.0,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl User {
    /// New active resident profile for a freshly created identity.
    pub fn from_registration(
        id: UserId,
        registration: &super::Registration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email: registration.email().clone(),
            first_name: registration.first_name().clone(),
            last_name: registration.last_name().clone(),
            middle_name: registration.middle_name().cloned(),
            contact_number: registration.contact_number().clone(),
            address: registration.address().clone(),
            role: Role::Resident,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Email address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// First name.
    pub fn first_name(&self) -> &PersonName {
        &self.first_name
    }

    /// Last name.
    pub fn last_name(&self) -> &PersonName {
        &self.last_name
    }

    /// Middle name, if given.
    pub fn middle_name(&self) -> Option<&PersonName> {
        self.middle_name.as_ref()
    }

    /// Mobile number.
    pub fn contact_number(&self) -> &ContactNumber {
        &self.contact_number
    }

    /// Residential address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Portal role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the account may sign in.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last profile change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// "First Middle Last" display form.
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }

    /// Administrators may process applications.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Administrators and staff may read every application.
    pub fn sees_all_applications(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Staff)
    }

    /// Apply a profile update, stamping `updated_at`.
    pub fn apply(self, update: super::ProfileUpdate, now: DateTime<Utc>) -> Self {
        let super::ProfileUpdate {
            first_name,
            last_name,
            middle_name,
            contact_number,
            address,
        } = update;
        Self {
            first_name: first_name.unwrap_or(self.first_name),
            last_name: last_name.unwrap_or(self.last_name),
            middle_name: middle_name.unwrap_or(self.middle_name),
            contact_number: contact_number.unwrap_or(self.contact_number),
            address: address.unwrap_or(self.address),
            updated_at: now,
            ..self
        }
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
