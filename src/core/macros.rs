//! Macros for declaring enum state types.

/// Generate a `State` implementation for a plain enum.
///
/// The enum gets the derives `State` needs (`Clone`, `Eq`, `Hash`, `Debug`,
/// serde) and each variant's name becomes its state name.
///
/// # Example
///
/// ```
/// use declarative_fsm::core::State;
/// use declarative_fsm::state_enum;
///
/// state_enum! {
///     pub enum Light {
///         Green,
///         Yellow,
///         Red,
///         Off,
///     }
///     final: [Off]
/// }
///
/// assert_eq!(Light::Yellow.name(), "Yellow");
/// assert!(Light::Off.is_final());
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }
    };
}
