//! Defines helper macros for generating domain port error enums.
//!
//! Each variant names the category it reports through `kind()`, so a port
//! error and its coarse classification are declared in one place.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            /// Construct this error variant.
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
            /// Construct this error variant.
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
        pub enum $name:ident : $kind:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($(#[$field_meta:meta])* $field:ident : $ty:ty),* $(,)? } )?
                    as $category:ident => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($(#[$field_meta])* $field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Category of this error.
            pub const fn kind(&self) -> $kind {
                match self {
                    $( Self::$variant { .. } => $kind::$category, )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ExampleKind {
        Missing,
        Broken,
    }

    define_port_error! {
        /// Port error used only by these tests.
        pub enum ExamplePortError: ExampleKind {
            /// Unit variant.
            Gone as Missing => "gone",
            /// Single string field.
            Foo {
                /// Detail text.
                message: String
            } as Broken => "foo: {message}",
            /// Mixed field types.
            Baz {
                /// Detail text.
                message: String,
                /// Occurrence count.
                count: u32
            } as Broken => "baz: {message} ({count})",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExamplePortError::foo("hello");
        assert_eq!(err.to_string(), "foo: hello");
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(ExamplePortError::gone(), ExamplePortError::Gone);
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ExamplePortError::baz("hello", 42_u32);
        assert_eq!(err.to_string(), "baz: hello (42)");
    }

    #[test]
    fn variants_report_their_declared_kind() {
        assert_eq!(ExamplePortError::gone().kind(), ExampleKind::Missing);
        assert_eq!(ExamplePortError::foo("x").kind(), ExampleKind::Broken);
        assert_eq!(ExamplePortError::baz("x", 1_u32).kind(), ExampleKind::Broken);
    }
}
