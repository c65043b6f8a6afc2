//! Arena handles
//!
//! Bindings reference each other through these indices into the arenas of
//! the [`LookupEnvironment`](crate::LookupEnvironment); a handle is only
//! meaningful within the session that created it.

use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Arena index
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                $name(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

arena_id!(
    /// A type binding
    BindingId,
    "b"
);
arena_id!(
    /// A method binding
    MethodId,
    "m"
);
arena_id!(
    /// A field binding
    FieldId,
    "f"
);
arena_id!(
    /// A type variable binding
    TypeVarId,
    "v"
);
arena_id!(
    /// An interned type
    TypeId,
    "t"
);
arena_id!(
    /// A capture variable created by capture conversion
    CaptureId,
    "c"
);
arena_id!(
    /// A compilation unit scope
    UnitId,
    "u"
);
arena_id!(
    /// A resolved callin or callout binding
    MappingId,
    "mm"
);
