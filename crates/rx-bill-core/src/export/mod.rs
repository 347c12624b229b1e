//! Bill export for downstream billing systems.

mod bill;

pub use bill::*;
