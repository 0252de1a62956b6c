//! Map type used for the message handler tables.
//!
//! `hashbrown` is the default; the `std-hash` feature swaps in the standard
//! library map.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::HashMap;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::HashMap;
}
