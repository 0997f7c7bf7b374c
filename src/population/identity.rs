//! Synthetic user identities.
//!
//! Identifiers are random 128-bit UUIDs drawn from the user's own seeded
//! stream, so they are reproducible and collision-free with overwhelming
//! probability. Profile fields are placeholders derived from the user index.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

use crate::activity::Sex;

pub const DEFAULT_LOCALE: &str = "de";

pub const DEFAULT_PICTURE: &str =
    "https://lh3.googleusercontent.com/-XdUIqdMkCWA/AAAAAAAAAAI/AAAAAAAAAAA/4252rscbv5M/photo.jpg";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// A version 4 UUID built from 16 bytes of `rng`.
    pub fn random(rng: &mut impl Rng) -> Self {
        let bytes: [u8; 16] = rng.gen();
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Display metadata for a user account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub family_name: String,
    pub given_name: String,
    pub locale: String,
    pub name: String,
    pub verified_email: bool,
    pub picture: String,
}

impl UserProfile {
    /// Placeholder profile named after the user's index.
    pub fn numbered(index: usize) -> Self {
        let label = index.to_string();
        Self {
            email: format!("{}@gmail.com", label),
            family_name: label.clone(),
            given_name: label.clone(),
            locale: DEFAULT_LOCALE.to_string(),
            name: label,
            verified_email: true,
            picture: DEFAULT_PICTURE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub profile: UserProfile,
    /// Set only when the population was generated gender-specific.
    pub sex: Option<Sex>,
}

impl UserIdentity {
    pub fn generate(index: usize, sex: Option<Sex>, rng: &mut impl Rng) -> Self {
        Self {
            id: UserId::random(rng),
            profile: UserProfile::numbered(index),
            sex,
        }
    }
}
