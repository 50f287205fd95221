use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identifier.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }

            /// Store-assigned identifiers start at 1; anything else never
            /// came out of the persistence layer.
            pub fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type! {
    /// Identifier of a user row (buyer or seller).
    UserId
}

id_type! {
    /// Identifier of a product listing.
    ProductId
}

id_type! {
    /// Identifier of an order. Assigned by the store on insert, which is why
    /// a freshly built order carries `Option<OrderId>` until persisted.
    OrderId
}
