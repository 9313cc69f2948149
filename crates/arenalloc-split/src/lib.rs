#![cfg_attr(not(test), no_std)]

pub mod header;
pub mod split;

#[cfg(test)]
mod tests;

pub use header::Header;
pub use split::{
  Blocks,
  Split,
  SplitError,
  SplitResult,
};
