//! Newtype domain identifiers.
//!
//! Every name that arrives on a URL path and is forwarded upstream is wrapped in
//! a distinct newtype. This keeps an organization name from being passed where a
//! dataset name is expected, even though both are plain strings on the wire.
//!
//! Construction never validates against the upstream system; it only rejects
//! empty values. Whether a name exists is decided by the CMS or DMS.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, AsRef<str>.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// CMS identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// Slug of a CMS post or page (e.g. `"about-open-data"`).
    ///
    /// Localized pages carry a `-{locale}` suffix; see
    /// [`crate::Locales::localized_slug`].
    PostSlug
}

// ---------------------------------------------------------------------------
// DMS identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// Name of a publishing organization (the `{owner}` path segment).
    OwnerName
}

string_id! {
    /// Name (or id) of a dataset as understood by `package_show`.
    DatasetName
}

string_id! {
    /// Name of a collection (a CKAN group).
    CollectionName
}

string_id! {
    /// Identifier of a single resource within a dataset.
    ResourceId
}

// ---------------------------------------------------------------------------

string_id! {
    /// A language tag such as `"en"` or `"id"`.
    LocaleTag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(OwnerName::new("").is_none());
        assert!(DatasetName::new(String::new()).is_none());
    }

    #[test]
    fn identifiers_display_their_value() {
        let name = CollectionName::new("ekonomi").unwrap();
        assert_eq!(name.to_string(), "ekonomi");
        assert_eq!(name.as_str(), "ekonomi");
    }
}
