//! Document identifiers.
//!
//! Every stored document (users, products, orders, addresses) is keyed by a
//! 12-byte [`DocumentId`] rendered as 24 lowercase hex characters. The
//! `define_id!` macro wraps it in per-entity newtypes so a `ProductId` can never
//! be passed where a `UserId` is expected.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of raw bytes in a [`DocumentId`].
pub const DOCUMENT_ID_LEN: usize = 12;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Errors produced when parsing an identifier from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// No identifier was supplied.
    #[error("identifier is empty")]
    Empty,

    /// The identifier is not 24 hexadecimal characters.
    #[error("malformed identifier: {0:?}")]
    Malformed(String),
}

/// A 12-byte document identifier.
///
/// Layout: 4 bytes of big-endian Unix seconds, 5 random bytes, and a 3-byte
/// process-wide counter, so identifiers generated in one process sort by
/// creation time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId([u8; DOCUMENT_ID_LEN]);

impl DocumentId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX);
        let random = uuid::Uuid::new_v4();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes();

        let mut bytes = [0u8; DOCUMENT_ID_LEN];
        let (time_part, rest) = bytes.split_at_mut(4);
        let (random_part, counter_part) = rest.split_at_mut(5);
        time_part.copy_from_slice(&seconds.to_be_bytes());
        random_part.copy_from_slice(&random.as_bytes()[..5]);
        counter_part.copy_from_slice(&count[1..]);
        Self(bytes)
    }

    /// Create an identifier from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DOCUMENT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the 24-character hex form.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` for blank input and `IdError::Malformed` for
    /// anything that is not exactly 24 hex digits.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.len() != DOCUMENT_ID_LEN * 2 || !trimmed.is_ascii() {
            return Err(IdError::Malformed(trimmed.to_string()));
        }

        let mut bytes = [0u8; DOCUMENT_ID_LEN];
        for (slot, pair) in bytes.iter_mut().zip(trimmed.as_bytes().chunks_exact(2)) {
            let digits = std::str::from_utf8(pair)
                .map_err(|_| IdError::Malformed(trimmed.to_string()))?;
            *slot = u8::from_str_radix(digits, 16)
                .map_err(|_| IdError::Malformed(trimmed.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// Raw bytes of the identifier.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DOCUMENT_ID_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({self})")
    }
}

impl FromStr for DocumentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for DocumentId {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for DocumentId {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
        let raw = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for DocumentId {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.to_hex(), buf)
    }
}

/// Macro to define a type-safe document ID wrapper.
///
/// Creates a newtype around [`DocumentId`] with:
/// - transparent `Serialize`/`Deserialize` (the hex string)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `generate()`, `parse()`, `Display` and `FromStr`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use emporium_core::define_id;
/// define_id!(CartLineId);
///
/// let id = CartLineId::generate();
/// let parsed: CartLineId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::DocumentId);

        impl $name {
            /// Generate a fresh ID.
            #[must_use]
            pub fn generate() -> Self {
                Self($crate::DocumentId::generate())
            }

            /// Parse the 24-character hex form.
            ///
            /// # Errors
            ///
            /// Returns an `IdError` if the input is empty or malformed.
            pub fn parse(input: &str) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::DocumentId::parse(input).map(Self)
            }

            /// Get the underlying document ID.
            #[must_use]
            pub const fn as_document_id(&self) -> $crate::DocumentId {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$crate::DocumentId> for $name {
            fn from(id: $crate::DocumentId) -> Self {
                Self(id)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <$crate::DocumentId as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <$crate::DocumentId as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <$crate::DocumentId as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <$crate::DocumentId as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(AddressId);
