/// Defines a newtype over [`Ulid`](crate::Ulid) implementing
/// [`PrefixedId`](crate::PrefixedId).
///
/// Serializes as its `{prefix}_{ulid}` string.
///
/// ```ignore
/// define_id!(
///     /// Token minted for each new egg.
///     EggToken => "egg"
/// );
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(into = "String", try_from = "String")]
        pub struct $name($crate::Ulid);

        impl $crate::PrefixedId for $name {
            const PREFIX: &'static str = $prefix;

            fn from_ulid(ulid: $crate::Ulid) -> Self {
                Self(ulid)
            }

            fn ulid(&self) -> $crate::Ulid {
                self.0
            }
        }

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                <Self as $crate::PrefixedId>::generate()
            }

            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                <Self as $crate::PrefixedId>::parse_prefixed(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                $crate::PrefixedId::fmt_prefixed(self, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }
    };
}
