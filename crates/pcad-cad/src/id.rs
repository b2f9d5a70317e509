//! Identifier newtypes
//!
//! Everything in a document refers to everything else by one of these ids,
//! never by pointer.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Operation in a part studio's feature tree
    OpId
);
uuid_id!(
    /// Sketch owned by a sketch operation
    SketchId
);
uuid_id!(
    /// Datum or construction plane
    PlaneId
);
uuid_id!(
    /// Point, line, circle or arc inside a sketch
    PrimitiveId
);
uuid_id!(
    /// Part studio inside a document
    PartStudioId
);
