//! XM file parser
//!
//! - `read` - Decoding XM bytes into an [`XmModule`](crate::XmModule)
//! - `tests` - Parser tests over synthesized files

mod read;

#[cfg(test)]
mod tests;

pub use read::{get_instrument_names, parse_xm};
