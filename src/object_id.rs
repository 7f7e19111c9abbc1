use std::{cmp::Ordering, hash::Hash, marker::PhantomData, str::FromStr};

use base64::{display::Base64Display, engine::GeneralPurpose, Engine};
use thiserror::Error;
use uuid::Uuid;

/// Create a new ObjectId type with the given short prefix.
#[macro_export]
macro_rules! make_object_id {
    ($typ:ident, $prefix:ident) => {
        mod $prefix {
            #[derive(Debug)]
            pub struct $typ;
            impl $crate::object_id::ObjectIdPrefix for $typ {
                fn prefix() -> &'static str {
                    stringify!($prefix)
                }
            }
        }

        /// The ObjectId type alias for this kind of object.
        pub type $typ = $crate::object_id::ObjectId<$prefix::$typ>;
    };
}

/// An error related to parsing an ObjectId
#[derive(Debug, Error)]
pub enum ObjectIdError {
    /// The prefix in the parsed ID did not match the expected prefix
    #[error("Invalid ID prefix, expected {0}")]
    InvalidPrefix(&'static str),

    /// The text after the prefix was not a base64-encoded UUID
    #[error("Failed to decode object ID")]
    DecodeFailure,
}

/// Provides the prefix for a serialized ObjectId.
pub trait ObjectIdPrefix {
    /// The short prefix for this ID type
    fn prefix() -> &'static str;
}

/// A UUIDv7 that displays as a type prefix followed by URL-safe base64, so IDs sort by
/// creation time and cannot be confused across object types.
pub struct ObjectId<PREFIX: ObjectIdPrefix>(pub Uuid, PhantomData<PREFIX>);

impl<PREFIX: ObjectIdPrefix> ObjectId<PREFIX> {
    /// Create a new ObjectId with a timestamp of now
    pub fn new() -> Self {
        Self(Uuid::now_v7(), PhantomData)
    }

    /// Create a new ObjectId from a UUID
    pub const fn from_uuid(u: Uuid) -> Self {
        Self(u, PhantomData)
    }

    /// Return a reference to the inner Uuid
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Writes the UUID portion of the object ID, without the prefix
    pub fn display_without_prefix(&self) -> Base64Display<GeneralPurpose> {
        Base64Display::new(
            self.0.as_bytes(),
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        )
    }
}

impl<PREFIX: ObjectIdPrefix> Default for ObjectId<PREFIX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<PREFIX: ObjectIdPrefix> Clone for ObjectId<PREFIX> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<PREFIX: ObjectIdPrefix> Copy for ObjectId<PREFIX> {}

impl<PREFIX: ObjectIdPrefix> PartialEq for ObjectId<PREFIX> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<PREFIX: ObjectIdPrefix> Eq for ObjectId<PREFIX> {}

impl<PREFIX: ObjectIdPrefix> PartialOrd for ObjectId<PREFIX> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<PREFIX: ObjectIdPrefix> Ord for ObjectId<PREFIX> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<PREFIX: ObjectIdPrefix> Hash for ObjectId<PREFIX> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<PREFIX: ObjectIdPrefix> std::fmt::Debug for ObjectId<PREFIX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_string()).finish()
    }
}

impl<PREFIX: ObjectIdPrefix> std::fmt::Display for ObjectId<PREFIX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(PREFIX::prefix())?;
        self.display_without_prefix().fmt(f)
    }
}

impl<PREFIX: ObjectIdPrefix> FromStr for ObjectId<PREFIX> {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expected_prefix = PREFIX::prefix();
        let suffix = s
            .strip_prefix(expected_prefix)
            .ok_or(ObjectIdError::InvalidPrefix(expected_prefix))?;

        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(suffix)
            .map_err(|_| ObjectIdError::DecodeFailure)?;
        Uuid::from_slice(&bytes)
            .map(Self::from_uuid)
            .map_err(|_| ObjectIdError::DecodeFailure)
    }
}

/// Serialize to the prefixed string form.
impl<PREFIX: ObjectIdPrefix> serde::Serialize for ObjectId<PREFIX> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Deserialize from the prefixed string form.
impl<'de, PREFIX: ObjectIdPrefix> serde::Deserialize<'de> for ObjectId<PREFIX> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::Path, response::IntoResponse, Router};

    use super::*;

    make_object_id!(AlbumId, alb);
    make_object_id!(TagId, tag);

    #[test]
    fn to_from_str() {
        let id = AlbumId::new();

        let s = id.to_string();
        assert!(s.starts_with("alb"));
        let id2 = AlbumId::from_str(&s).unwrap();
        assert_eq!(id, id2, "ID converts to string and back");
    }

    #[test]
    fn rejects_other_prefix() {
        let tag = TagId::new().to_string();
        let err = AlbumId::from_str(&tag).unwrap_err();
        assert!(matches!(err, ObjectIdError::InvalidPrefix("alb")));

        let err = AlbumId::from_str("albnot-base64!").unwrap_err();
        assert!(matches!(err, ObjectIdError::DecodeFailure));
    }

    #[test]
    fn serde() {
        let id = AlbumId::new();
        let json_str = serde_json::to_string(&id).unwrap();
        assert_eq!(json_str, format!("\"{id}\""));
        let id2: AlbumId = serde_json::from_str(&json_str).unwrap();
        assert_eq!(id, id2, "Value serializes and deserializes to itself");
    }

    #[test]
    fn can_use_in_axum_path() {
        async fn get_id(Path(_id): Path<AlbumId>) -> impl IntoResponse {
            "ok"
        }

        let _ = Router::<()>::new().route("/:id", axum::routing::get(get_id));
    }
}
