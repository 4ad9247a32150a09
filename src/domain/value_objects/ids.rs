//! # Identifiers
//!
//! Strongly typed identifiers for marketplace documents and users.
//!
//! Document ids are UUID-based; [`UserId`] wraps the opaque string handed
//! over by the identity collaborator.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::{OfferId, UserId};
//!
//! let offer = OfferId::new_v4();
//! let parsed: OfferId = offer.to_string().parse().unwrap();
//! assert_eq!(offer, parsed);
//!
//! let vendor = UserId::new("vendor-1");
//! assert_eq!(vendor.as_str(), "vendor-1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[inline]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an individual sourcing request.
    RequestId
);
uuid_id!(
    /// Identifier of a supplier offer against a request.
    OfferId
);
uuid_id!(
    /// Identifier of a buying group.
    GroupId
);
uuid_id!(
    /// Identifier of the pooled request a group leader opens.
    GroupRequestId
);
uuid_id!(
    /// Identifier of a supplier offer against a group request.
    GroupOfferId
);
uuid_id!(
    /// Identifier of a domain event.
    EventId
);

/// Identifier of an authenticated marketplace user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(RequestId::new_v4(), RequestId::new_v4());
    }

    #[test]
    fn uuid_id_parse_roundtrip() {
        let id = GroupRequestId::new_v4();
        let parsed = GroupRequestId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn uuid_id_rejects_garbage() {
        assert!(GroupId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let id = UserId::new("supplier-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"supplier-7\"");
    }
}
