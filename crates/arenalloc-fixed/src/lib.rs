#![cfg_attr(not(test), no_std)]

pub mod fixed;


pub use fixed::{
  Fixed,
  FixedError,
  FixedRegions,
  FixedResult,
};
