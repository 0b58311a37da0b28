//! Block-wise transfer descriptors (Block1 / Block2 option values).

/// Largest block number the 20-bit field can carry.
pub const MAX_NUM: u32 = 1_048_575;

/// Block sizes the 3-bit size exponent can express.
pub const VALID_SIZES: [u16; 7] = [16, 32, 64, 128, 256, 512, 1024];

/// A block descriptor violated a field invariant.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum BlockError {
  /// Block number exceeds [`MAX_NUM`].
  NumTooLarge(u32),
  /// Size is not a power of two in `[16, 1024]`.
  InvalidSize(u16),
}

/// Three items of information carried by a Block1 or Block2 option
/// value:
/// * the relative number of the block ([`Block::num`]) within the
///   body, counted in blocks of the given size
/// * whether more blocks follow ([`Block::more`])
/// * the block size ([`Block::size`])
///
/// The packed wire value is `num << 4 | more << 3 | exponent` where
/// `size == 2^(exponent + 4)`; a packed value of `0` means block 0,
/// no more, size 16.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Block {
  num: u32,
  more: bool,
  size: u16,
}

impl Block {
  /// A validated block descriptor.
  pub fn new(num: u32, more: bool, size: u16) -> Result<Block, BlockError> {
    if num > MAX_NUM {
      return Err(BlockError::NumTooLarge(num));
    }
    if !VALID_SIZES.contains(&size) {
      return Err(BlockError::InvalidSize(size));
    }
    Ok(Block { num, more, size })
  }

  /// Decode the packed option value.
  pub fn from_value(value: u32) -> Result<Block, BlockError> {
    if value == 0 {
      Ok(Block { num: 0, more: false, size: 16 })
    } else {
      Block::new(value >> 4, value & 0b1000 == 0b1000, 16 << (value & 0b111))
    }
  }

  /// The packed option value.
  pub fn value(&self) -> u32 {
    self.num << 4 | u32::from(self.more) << 3 | (crate::num::bits_up_to(u32::from(self.size)) - 4)
  }

  /// Block number within the body.
  pub fn num(&self) -> u32 {
    self.num
  }

  /// Do more blocks follow this one?
  pub fn more(&self) -> bool {
    self.more
  }

  /// Block size in bytes.
  pub fn size(&self) -> u16 {
    self.size
  }

  /// Move to block `num`, keeping more and size.
  pub fn set_num(&mut self, num: u32) -> Result<(), BlockError> {
    if num > MAX_NUM {
      return Err(BlockError::NumTooLarge(num));
    }
    self.num = num;
    Ok(())
  }

  /// Flip the more flag.
  pub fn set_more(&mut self, more: bool) {
    self.more = more;
  }

  /// The slice of `data` this block covers. `None` when the block
  /// starts past the end of the data; the final block may be shorter
  /// than [`Block::size`].
  pub fn chunk<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
    let start = self.num as usize * self.size as usize;
    if start > data.len() {
      None
    } else {
      Some(&data[start..data.len().min(start + self.size as usize)])
    }
  }

  /// How many blocks of this size `data` splits into; empty data has
  /// zero blocks.
  pub fn chunk_count(&self, data: &[u8]) -> usize {
    if data.is_empty() {
      0
    } else {
      (data.len() + self.size as usize - 1) / self.size as usize
    }
  }

  /// Does `data` extend past the end of this block?
  pub fn is_more(&self, data: &[u8]) -> bool {
    if data.is_empty() {
      false
    } else {
      data.len() > (self.num as usize + 1) * self.size as usize
    }
  }

  /// Is this the final block of `data`? Empty data has only final
  /// blocks.
  pub fn is_last(&self, data: &[u8]) -> bool {
    data.is_empty() || self.num as usize == self.chunk_count(data) - 1
  }

  /// Does `body` actually contain a block at this number?
  pub fn included_by(&self, body: &[u8]) -> bool {
    (self.num == 0 && body.is_empty()) || (self.num as usize) < self.chunk_count(body)
  }

  /// Split `data` into `size`-byte slices, the last possibly shorter.
  pub fn chunkify(data: &[u8], size: u16) -> Vec<&[u8]> {
    data.chunks(size as usize).collect()
  }
}
