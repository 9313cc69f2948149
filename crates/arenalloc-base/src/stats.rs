use alloc::vec::Vec;
use core::fmt;

use getset::Getters;

use crate::region::{
  Region,
  RegionState,
};

/// Snapshot of an allocator's regions, sizes in bytes, in arena order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters)]
pub struct Statistics {
  #[getset(get = "pub")]
  allocated: Vec<usize>,
  #[getset(get = "pub")]
  free: Vec<usize>,
}

impl Statistics {
  pub fn collect<I>(regions: I) -> Self
  where
    I: IntoIterator<Item = Region>,
  {
    let mut stats = Self::default();
    for region in regions {
      match region.state() {
        RegionState::Allocated => stats.allocated.push(region.size()),
        RegionState::Free => stats.free.push(region.size()),
      }
    }
    stats
  }

  #[inline]
  pub fn count_allocated(&self) -> usize {
    self.allocated.len()
  }

  #[inline]
  pub fn count_free(&self) -> usize {
    self.free.len()
  }

  pub fn total_allocated(&self) -> usize {
    self.allocated.iter().sum()
  }

  pub fn total_free(&self) -> usize {
    self.free.iter().sum()
  }

  pub fn mean_allocated(&self) -> Option<f64> {
    mean(&self.allocated)
  }

  pub fn mean_free(&self) -> Option<f64> {
    mean(&self.free)
  }
}

fn mean(sizes: &[usize]) -> Option<f64> {
  if sizes.is_empty() {
    return None;
  }
  let sum: usize = sizes.iter().sum();
  Some(sum as f64 / sizes.len() as f64)
}

fn write_section(f: &mut fmt::Formatter<'_>, label: &str, sizes: &[usize]) -> fmt::Result {
  writeln!(f, "number of {} regions = {}", label, sizes.len())?;
  let Some(avg) = mean(sizes) else {
    return Ok(());
  };

  write!(f, "sizes:")?;
  for size in sizes {
    write!(f, " {}", size)?;
  }
  writeln!(f)?;
  writeln!(f, "mean size = {:.6}", avg)
}

impl fmt::Display for Statistics {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_section(f, "allocated", &self.allocated)?;
    write_section(f, "free", &self.free)
  }
}
