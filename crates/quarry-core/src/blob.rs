//! Serialized objects stored in `BLOB` columns.
//!
//! Objects are written as a JSON envelope `{"type": <id>, "data": <value>}`.
//! On read the type id is checked against an [`AllowList`] before the
//! payload is decoded, so a row can never make the reader materialize a
//! type it did not opt into.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A type that may be stored as a serialized blob.
pub trait BlobType: Serialize + DeserializeOwned {
    /// Identifier written into the envelope and checked on read.
    const TYPE_ID: &'static str;
}

macro_rules! blob_type {
    ($($ty:ty => $id:literal),* $(,)?) => {
        $(
            impl BlobType for $ty {
                const TYPE_ID: &'static str = $id;
            }
        )*
    };
}

blob_type! {
    String => "string",
    i64 => "i64",
    i32 => "i32",
    f64 => "f64",
    bool => "bool",
    Uuid => "uuid",
    NaiveDateTime => "timestamp",
}

impl<T: BlobType> BlobType for Vec<T> {
    const TYPE_ID: &'static str = "list";
}

impl<T: BlobType> BlobType for BTreeMap<String, T> {
    const TYPE_ID: &'static str = "map";
}

/// Type ids accepted when deserializing blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    types: BTreeSet<String>,
    prefixes: Vec<String>,
}

impl Default for AllowList {
    /// The built-in scalar, list and map types.
    fn default() -> Self {
        let types = [
            String::TYPE_ID,
            i64::TYPE_ID,
            i32::TYPE_ID,
            f64::TYPE_ID,
            bool::TYPE_ID,
            Uuid::TYPE_ID,
            NaiveDateTime::TYPE_ID,
            "list",
            "map",
        ];
        Self {
            types: types.iter().map(ToString::to_string).collect(),
            prefixes: Vec::new(),
        }
    }
}

impl AllowList {
    /// An allow-list that rejects everything.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: BTreeSet::new(),
            prefixes: Vec::new(),
        }
    }

    /// Allows one exact type id.
    #[must_use]
    pub fn allow(mut self, type_id: &str) -> Self {
        self.types.insert(type_id.to_string());
        self
    }

    /// Allows every type id starting with `prefix`.
    #[must_use]
    pub fn allow_prefix(mut self, prefix: &str) -> Self {
        self.prefixes.push(prefix.to_string());
        self
    }

    /// Returns true if `type_id` may be deserialized.
    #[must_use]
    pub fn permits(&self, type_id: &str) -> bool {
        self.types.contains(type_id)
            || self.prefixes.iter().any(|p| type_id.starts_with(p.as_str()))
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    #[serde(rename = "type")]
    type_id: &'a str,
    data: &'a T,
}

#[derive(Deserialize)]
struct Header {
    #[serde(rename = "type")]
    type_id: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Encodes `value` as a tagged envelope.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn encode<T: BlobType>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&EnvelopeRef {
        type_id: T::TYPE_ID,
        data: value,
    })?)
}

/// Decodes an envelope, rejecting type ids the allow-list does not permit.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] for a disallowed type id, and
/// [`Error::Serialization`] for malformed input or a mismatched type.
pub fn decode<T: BlobType>(bytes: &[u8], allow_list: &AllowList) -> Result<T> {
    let header: Header = serde_json::from_slice(bytes)?;
    if !allow_list.permits(&header.type_id) {
        return Err(Error::Forbidden(header.type_id));
    }
    if header.type_id != T::TYPE_ID {
        return Err(Error::Forbidden(format!(
            "{} (expected {})",
            header.type_id,
            T::TYPE_ID
        )));
    }
    let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
    Ok(envelope.data)
}

/// Field wrapper storing `T` as a serialized blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Serialized<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Settings {
        theme: String,
    }

    impl BlobType for Settings {
        const TYPE_ID: &'static str = "app.settings";
    }

    #[test]
    fn test_envelope_layout() {
        let bytes = encode(&String::from("hi")).unwrap();
        assert_eq!(bytes, br#"{"type":"string","data":"hi"}"#);
    }

    #[test]
    fn test_decode_default_type() {
        let bytes = encode(&vec![1_i64, 2]).unwrap();
        let decoded: Vec<i64> = decode(&bytes, &AllowList::default()).unwrap();
        assert_eq!(decoded, [1, 2]);
    }

    #[test]
    fn test_unlisted_type_is_forbidden() {
        let bytes = encode(&Settings {
            theme: String::from("dark"),
        })
        .unwrap();
        let result = decode::<Settings>(&bytes, &AllowList::default());
        assert!(matches!(result, Err(Error::Forbidden(id)) if id == "app.settings"));
    }

    #[test]
    fn test_prefix_allows_type() {
        let bytes = encode(&Settings {
            theme: String::from("dark"),
        })
        .unwrap();
        let allow = AllowList::default().allow_prefix("app.");
        let decoded: Settings = decode(&bytes, &allow).unwrap();
        assert_eq!(decoded.theme, "dark");
    }

    #[test]
    fn test_empty_allow_list_rejects_builtin() {
        let bytes = encode(&true).unwrap();
        assert!(decode::<bool>(&bytes, &AllowList::empty()).is_err());
    }
}
