//! Helper macro for driven-port error enums.
//!
//! Every repository error carries `Connection` and `Query` variants. The macro
//! injects them, generates snake-case constructors for every variant, and
//! converts the enum into the domain [`Error`](crate::domain::Error):
//! `Connection` becomes `503`, anything not handled explicitly by a service
//! becomes `500`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident ($label:literal) {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            /// Backing store could not be reached.
            #[error("{} connection failed: {message}", $label)]
            Connection { message: String },
            /// Query or mutation failed during execution.
            #[error("{} query failed: {message}", $label)]
            Query { message: String },
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            define_port_error!(@ctor Connection { message: String });
            define_port_error!(@ctor Query { message: String });
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }

        impl From<$name> for $crate::domain::Error {
            #[allow(unreachable_patterns)]
            fn from(error: $name) -> Self {
                match error {
                    $name::Connection { message } => $crate::domain::Error::service_unavailable(
                        format!("{} unavailable: {message}", $label),
                    ),
                    $name::Query { message } => {
                        $crate::domain::Error::internal(format!("{} error: {message}", $label))
                    }
                    other => $crate::domain::Error::internal(other.to_string()),
                }
            }
        }
    };
}

pub(crate) use define_port_error;
