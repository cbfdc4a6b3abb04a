//! Category presentation helpers.

mod color;

pub use color::{CategoryColorTable, ColorPair, Theme};
