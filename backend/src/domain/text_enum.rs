//! Helper macro for enums stored and transmitted as lowercase text.
//!
//! Status and role columns are `TEXT` with `CHECK` constraints, and the same
//! spellings appear in JSON payloads and query strings. The macro keeps the
//! serde, `Display` and `FromStr` spellings in one place.

macro_rules! text_enum {
    (
        $(#[$outer:meta])*
        pub enum $name:ident, parse error $error:ident ($what:literal) {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $text:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::utoipa::ToSchema,
        )]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $text)]
                $variant,
            )*
        }

        #[doc = concat!("Error returned when text is not a valid ", $what, ".")]
        #[derive(Debug, Clone, PartialEq, Eq, ::thiserror::Error)]
        #[error("invalid {}: {}", $what, .value)]
        pub struct $error {
            /// Rejected input.
            pub value: String,
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Stable lowercase spelling.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)*
                    _ => Err($error { value: value.to_owned() }),
                }
            }
        }
    };
}

pub(crate) use text_enum;
