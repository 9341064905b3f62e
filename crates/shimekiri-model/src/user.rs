// SPDX-License-Identifier: Apache-2.0

use crate::validate::ParseError;
use serde::{Deserialize, Serialize};

pub const NICKNAME_MAX_LEN: usize = 64;
pub const DISPLAY_NAME_MAX_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

/// Unique handle used in the profile URL (`/users/{nickname}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct Nickname(String);

impl Nickname {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("nickname"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("nickname"));
        }
        if input.len() > NICKNAME_MAX_LEN {
            return Err(ParseError::TooLong("nickname", NICKNAME_MAX_LEN));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct User {
    pub id: UserId,
    pub provider_id: String,
    pub nickname: Nickname,
    pub name: String,
    pub avatar_url: String,
}

impl User {
    #[must_use]
    pub fn new(
        id: UserId,
        provider_id: String,
        nickname: Nickname,
        name: String,
        avatar_url: String,
    ) -> Self {
        Self {
            id,
            provider_id,
            nickname,
            name,
            avatar_url,
        }
    }
}

/// Identity handed back by the external login provider.
///
/// The provider-side fields are untrusted text; `nickname` is validated when
/// the identity is turned into a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExternalIdentity {
    pub provider_id: String,
    pub nickname: String,
    pub name: String,
    pub avatar_url: String,
}

impl ExternalIdentity {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.provider_id.is_empty() {
            return Err(ParseError::Empty("provider_id"));
        }
        Nickname::parse(&self.nickname)?;
        if self.name.len() > DISPLAY_NAME_MAX_LEN {
            return Err(ParseError::TooLong("name", DISPLAY_NAME_MAX_LEN));
        }
        Ok(())
    }
}
