//! Session cookie settings read from the environment.
//!
//! Debug builds fall back to permissive defaults with a warning; release
//! builds insist on every toggle being present and valid.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zeroize::Zeroize;

const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
/// Shortest key file accepted in release builds.
pub const KEY_MIN_LEN: usize = 64;
const FINGERPRINT_BYTES: usize = 8;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Whether lenient fallbacks apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Missing or invalid toggles warn and fall back.
    Debug,
    /// Missing or invalid toggles are errors.
    Release,
}

impl BuildMode {
    /// Mode matching `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Validated cookie settings.
pub struct SessionSettings {
    /// Signing and encryption key.
    pub key: Key,
    /// Whether cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// `SameSite` policy.
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Short fingerprint of the active key, safe to log.
    pub fn key_fingerprint(&self) -> String {
        key_fingerprint(&self.key)
    }
}

/// Invalid session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// Required variable absent in a release build.
    #[error("missing required environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// Variable present but unparsable.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Accepted forms.
        expected: &'static str,
    },
    /// Key file unreadable and no ephemeral fallback allowed.
    #[error("failed to read session key at {}: {source}", .path.display())]
    KeyRead {
        /// Configured key path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Key file shorter than [`KEY_MIN_LEN`].
    #[error(
        "session key at {} too short: need >= {min} bytes, got {length}",
        .path.display(),
        min = KEY_MIN_LEN
    )]
    KeyTooShort {
        /// Configured key path.
        path: PathBuf,
        /// Bytes read.
        length: usize,
    },
    /// `SameSite=None` without `Secure`.
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    /// Ephemeral keys requested in a release build.
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// One environment toggle with its debug fallback.
struct Toggle<T> {
    name: &'static str,
    expected: &'static str,
    parse: fn(&str) -> Option<T>,
    debug_default: T,
}

impl<T: Copy> Toggle<T> {
    fn read<E: Env>(&self, env: &E, mode: BuildMode) -> Result<T, SessionConfigError> {
        let Some(value) = env.string(self.name) else {
            if mode == BuildMode::Release {
                return Err(SessionConfigError::MissingEnv { name: self.name });
            }
            warn!(name = self.name, "session toggle not set; using debug default");
            return Ok(self.debug_default);
        };
        match (self.parse)(&value) {
            Some(parsed) => Ok(parsed),
            None if mode == BuildMode::Debug => {
                warn!(name = self.name, %value, "invalid session toggle; using debug default");
                Ok(self.debug_default)
            }
            None => Err(SessionConfigError::InvalidEnv {
                name: self.name,
                value,
                expected: self.expected,
            }),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => Some(SameSite::Strict),
        "lax" => Some(SameSite::Lax),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

/// Read and validate session settings.
///
/// # Errors
///
/// Release builds reject missing or malformed toggles, short or unreadable
/// key files, `SameSite=None` without `Secure`, and ephemeral keys.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = Toggle {
        name: COOKIE_SECURE_ENV,
        expected: BOOL_EXPECTED,
        parse: parse_bool,
        debug_default: true,
    }
    .read(env, mode)?;
    let same_site = Toggle {
        name: SAMESITE_ENV,
        expected: SAMESITE_EXPECTED,
        parse: parse_same_site,
        debug_default: SameSite::Lax,
    }
    .read(env, mode)?;
    if same_site == SameSite::None && !cookie_secure {
        if mode == BuildMode::Release {
            return Err(SessionConfigError::InsecureSameSiteNone);
        }
        warn!("SESSION_SAMESITE=None without a secure cookie; browsers may drop it");
    }
    let allow_ephemeral = Toggle {
        name: ALLOW_EPHEMERAL_ENV,
        expected: BOOL_EXPECTED,
        parse: parse_bool,
        debug_default: false,
    }
    .read(env, mode)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }

    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| KEY_DEFAULT_PATH.to_owned()),
    );
    let key = load_key(path, mode, allow_ephemeral)?;
    let settings = SessionSettings {
        key,
        cookie_secure,
        same_site,
    };
    info!(
        fingerprint = %settings.key_fingerprint(),
        cookie_secure,
        same_site = ?same_site,
        "session settings loaded"
    );
    Ok(settings)
}

fn load_key(path: PathBuf, mode: BuildMode, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort { path, length });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(path = %path.display(), %error, "using an ephemeral session key");
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

/// First eight bytes of the SHA-256 of the signing key, hex encoded.
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
