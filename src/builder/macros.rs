//! Macros for ergonomic state and event declaration.

/// Declare a tagged enum together with its companion tag enum and the
/// `Tagged` implementation.
///
/// Variants may be unit-like or carry named fields. The enum derives
/// `Clone`, `PartialEq`, `Debug` and serde's `Serialize`/`Deserialize`; the
/// tag enum is `Copy + Eq + Hash`.
///
/// # Example
///
/// ```
/// use statecraft::tagged_enum;
/// use statecraft::core::Tagged;
///
/// tagged_enum! {
///     pub enum Reading: ReadingTag {
///         Idle { value: u32 },
///         High,
///         Medium,
///         Low,
///     }
/// }
///
/// let state = Reading::Idle { value: 75 };
/// assert_eq!(state.tag(), ReadingTag::Idle);
/// assert_eq!(state.name(), "Idle");
/// ```
#[macro_export]
macro_rules! tagged_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $tag:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $({ $($field:ident : $fty:ty),* $(,)? })?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $({ $($field: $fty),* })?
            ),*
        }

        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $tag {
            $($variant),*
        }

        impl $crate::core::Tagged for $name {
            type Tag = $tag;

            fn tag(&self) -> $tag {
                match self {
                    $(Self::$variant { .. } => $tag::$variant),*
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => stringify!($variant)),*
                }
            }
        }
    };
}
