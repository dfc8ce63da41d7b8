//! Account request types: login, registration and profile updates.
//!
//! Inbound adapters build these from raw strings; every constructor validates
//! before a service or port sees the value.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::user::{Address, ContactNumber, Email, PersonName, UserValidationError};

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN: usize = 6;

/// Validation errors for account requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    /// A profile field failed validation.
    Profile(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },
    /// Password confirmation does not match.
    PasswordMismatch,
    /// A profile update changed nothing.
    EmptyUpdate,
}

impl AccountValidationError {
    /// Wire name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Profile(err) => err.field(),
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
            Self::PasswordMismatch => "confirmPassword",
            Self::EmptyUpdate => "body",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Profile(err) => err.code(),
            Self::EmptyPassword => "empty_password",
            Self::PasswordTooShort { .. } => "password_too_short",
            Self::PasswordMismatch => "password_mismatch",
            Self::EmptyUpdate => "empty_update",
        }
    }
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordMismatch => write!(f, "passwords don't match"),
            Self::EmptyUpdate => write!(f, "profile update must change at least one field"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

impl From<UserValidationError> for AccountValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::Profile(value)
    }
}

/// Validated login credentials.
///
/// # Examples
/// ```
/// use portal::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Resident@Example.ph", "secret1")
///     .expect("valid credentials");
/// assert_eq!(creds.email().as_ref(), "resident@example.ph");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Build credentials from raw inputs.
    ///
    /// Password whitespace is preserved; only emptiness is rejected so stored
    /// passwords compare exactly.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AccountValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(AccountValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password as typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Raw registration form values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDraft {
    /// Email address.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
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
}

/// Validated registration request.
///
/// New accounts are always residents; the role is not caller-controlled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: Email,
    password: Zeroizing<String>,
    first_name: PersonName,
    last_name: PersonName,
    middle_name: Option<PersonName>,
    contact_number: ContactNumber,
    address: Address,
}

impl TryFrom<RegistrationDraft> for Registration {
    type Error = AccountValidationError;

    fn try_from(draft: RegistrationDraft) -> Result<Self, Self::Error> {
        let RegistrationDraft {
            email,
            password,
            confirm_password,
            first_name,
            last_name,
            middle_name,
            contact_number,
            address,
        } = draft;
        let password = Zeroizing::new(password);
        let confirm_password = Zeroizing::new(confirm_password);
        let email = Email::new(&email)?;
        if password.chars().count() < PASSWORD_MIN {
            return Err(AccountValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if *password != *confirm_password {
            return Err(AccountValidationError::PasswordMismatch);
        }
        Ok(Self {
            email,
            password,
            first_name: PersonName::new("firstName", &first_name)?,
            last_name: PersonName::new("lastName", &last_name)?,
            middle_name: PersonName::optional(middle_name.as_deref())?,
            contact_number: ContactNumber::new(&contact_number)?,
            address: Address::new(&address)?,
        })
    }
}

impl Registration {
    /// Email to register.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password to register.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// First name.
    pub fn first_name(&self) -> &PersonName {
        &self.first_name
    }

    /// Last name.
    pub fn last_name(&self) -> &PersonName {
        &self.last_name
    }

    /// Middle name.
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
}

/// Raw profile update; absent keys are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateDraft {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New middle name; an empty string clears it.
    pub middle_name: Option<String>,
    /// New mobile number.
    pub contact_number: Option<String>,
    /// New address.
    pub address: Option<String>,
}

/// Validated profile update.
///
/// `middle_name` is doubly optional: `None` keeps the current value and
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New first name.
    pub first_name: Option<PersonName>,
    /// New last name.
    pub last_name: Option<PersonName>,
    /// New middle name.
    pub middle_name: Option<Option<PersonName>>,
    /// New mobile number.
    pub contact_number: Option<ContactNumber>,
    /// New address.
    pub address: Option<Address>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.middle_name.is_none()
            && self.contact_number.is_none()
            && self.address.is_none()
    }
}

impl TryFrom<ProfileUpdateDraft> for ProfileUpdate {
    type Error = AccountValidationError;

    fn try_from(draft: ProfileUpdateDraft) -> Result<Self, Self::Error> {
        let update = Self {
            first_name: draft
                .first_name
                .map(|value| PersonName::new("firstName", value))
                .transpose()?,
            last_name: draft
                .last_name
                .map(|value| PersonName::new("lastName", value))
                .transpose()?,
            middle_name: draft
                .middle_name
                .map(|value| PersonName::optional(Some(value.as_str())))
                .transpose()?,
            contact_number: draft.contact_number.map(ContactNumber::new).transpose()?,
            address: draft.address.map(Address::new).transpose()?,
        };
        if update.is_empty() {
            return Err(AccountValidationError::EmptyUpdate);
        }
        Ok(update)
    }
}

/// Opaque session token issued by the identity store.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw token value for transport.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(**redacted**)")
    }
}
