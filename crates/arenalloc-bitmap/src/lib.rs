#![cfg_attr(not(test), no_std)]

use core::cmp;


#[derive(Debug, PartialEq)]
pub enum BitmapError {
  InsufficientSize { have: usize, need: usize },
  OutOfBounds { index: usize, size: usize },
  EmptyRange,
}

pub type BitmapResult<T> = Result<T, BitmapError>;

pub type BitmapWord = u8;

const WORD_BITS: usize = BitmapWord::BITS as usize;

/// Bit `i` lives in byte `i / 8` at position `i % 8`, least significant
/// bit first, so a run may straddle two or more bytes of the store.
#[derive(Debug)]
pub struct Bitmap<'slice> {
  store: &'slice mut [BitmapWord],
  bits: usize,
}

impl<'slice> Bitmap<'slice> {
  #[inline(always)]
  pub const fn words(fields: usize) -> usize {
    fields.div_ceil(WORD_BITS)
  }

  #[inline(always)]
  pub const fn available(&self) -> usize {
    self.store.len() * WORD_BITS
  }

  #[inline(always)]
  pub fn store(&self) -> &[BitmapWord] {
    &*self.store
  }

  #[inline(always)]
  pub const fn bits(&self) -> usize {
    self.bits
  }

  const fn position(&self, index: usize) -> BitmapResult<(usize, usize)> {
    if index >= self.bits {
      return Err(BitmapError::OutOfBounds {
        index,
        size: self.bits,
      });
    }
    Ok((index / WORD_BITS, index % WORD_BITS))
  }

  const fn check_range(&self, start: usize, width: usize) -> BitmapResult<usize> {
    if width == 0 {
      return Err(BitmapError::EmptyRange);
    }
    match start.checked_add(width) {
      Some(end) if end <= self.bits => Ok(end),
      _ => Err(BitmapError::OutOfBounds {
        index: start.saturating_add(width - 1),
        size: self.bits,
      }),
    }
  }

  /// Per-byte masks covering bits `start..end`.
  fn masks(start: usize, end: usize) -> impl Iterator<Item = (usize, BitmapWord)> {
    (start / WORD_BITS..end.div_ceil(WORD_BITS)).map(move |word| {
      let base = word * WORD_BITS;
      let lo = cmp::max(start, base) - base;
      let hi = cmp::min(end, base + WORD_BITS) - base;
      let mask = (((1u16 << (hi - lo)) - 1) << lo) as BitmapWord;
      (word, mask)
    })
  }

  /// Wraps `store` as-is, keeping whatever bits it already holds.
  pub fn new(store: &'slice mut [BitmapWord], bits: usize) -> BitmapResult<Self> {
    let available = store.len() * WORD_BITS;
    if bits > available {
      return Err(BitmapError::InsufficientSize {
        have: available,
        need: bits,
      });
    }
    Ok(Self { store, bits })
  }

  pub fn zero(store: &'slice mut [BitmapWord], bits: usize) -> BitmapResult<Self> {
    let mut bitmap = Self::new(store, bits)?;
    bitmap.clear_all();
    Ok(bitmap)
  }

  #[inline]
  pub fn set(&mut self, index: usize) -> BitmapResult<()> {
    let (word, bit) = self.position(index)?;
    self.store[word] |= 1 << bit;
    Ok(())
  }

  #[inline]
  pub fn clear(&mut self, index: usize) -> BitmapResult<()> {
    let (word, bit) = self.position(index)?;
    self.store[word] &= !(1 << bit);
    Ok(())
  }

  #[inline]
  pub fn get(&self, index: usize) -> BitmapResult<bool> {
    let (word, bit) = self.position(index)?;
    Ok(self.store[word] & (1 << bit) != 0)
  }

  /// True if any bit of `start..start + width` is set.
  pub fn test_range(&self, start: usize, width: usize) -> BitmapResult<bool> {
    let end = self.check_range(start, width)?;
    Ok(Self::masks(start, end).any(|(word, mask)| self.store[word] & mask != 0))
  }

  pub fn set_range(&mut self, start: usize, width: usize) -> BitmapResult<()> {
    let end = self.check_range(start, width)?;
    for (word, mask) in Self::masks(start, end) {
      self.store[word] |= mask;
    }
    Ok(())
  }

  pub fn clear_range(&mut self, start: usize, width: usize) -> BitmapResult<()> {
    let end = self.check_range(start, width)?;
    for (word, mask) in Self::masks(start, end) {
      self.store[word] &= !mask;
    }
    Ok(())
  }

  /// Lowest index starting `width` consecutive clear bits.
  ///
  /// Starts are tried in ascending order, so for every byte the positions
  /// wholly inside it come before those crossing into the next byte.
  pub fn find_clear_run(&self, width: usize) -> Option<usize> {
    if width == 0 || width > self.bits {
      return None;
    }

    let mut start = 0;
    while start + width <= self.bits {
      let word = start / WORD_BITS;
      if start % WORD_BITS == 0 && self.store[word] == BitmapWord::MAX {
        start += WORD_BITS;
        continue;
      }
      if let Ok(false) = self.test_range(start, width) {
        return Some(start);
      }
      start += 1;
    }
    None
  }

  pub fn clear_all(&mut self) {
    self.store.fill(0);
  }

  pub fn set_all(&mut self) {
    let full_words = self.bits / WORD_BITS;
    self.store[..full_words].fill(BitmapWord::MAX);

    let remaining = self.bits % WORD_BITS;
    if remaining > 0 {
      self.store[full_words] = BitmapWord::MAX >> (WORD_BITS - remaining);
    }
  }

  pub fn count_set(&self) -> usize {
    self.store.iter().map(|word| word.count_ones() as usize).sum()
  }

  #[inline]
  pub fn is_clear(&self) -> bool {
    self.store.iter().all(|word| *word == 0)
  }
}
