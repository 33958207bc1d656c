//! disassembly listings: fetch a run of instructions from some memory, decode them, and write one
//! line per instruction.
//!
//! ```
//! use yaxpeax_arm32::listing::{Image, Listing};
//! use yaxpeax_arm32::Mode;
//!
//! let image = Image::new(0x8000, vec![0x00, 0x00, 0xa0, 0xe1]);
//! let mut out = Vec::new();
//! let next = Listing::new(0x8000, Mode::Arm, 1).write_to(&image, &mut out).unwrap();
//! assert_eq!(next, 0x8004);
//! assert_eq!(out, b"0x00008000 0xe1a00000    NOP\r\n");
//! ```

use std::io;
use std::path::Path;

use num_traits::Num;
use thiserror::Error;

use crate::{decode_arm32, decode_thumb16, Instruction, Mode};

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("no {width}-byte word mapped at {address:#010x}")]
    OutOfRange { address: u32, width: u8 },
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// where instruction words come from. reads are little-endian.
pub trait Memory {
    fn read_word(&self, address: u32) -> Result<u32, ListingError>;
    fn read_halfword(&self, address: u32) -> Result<u16, ListingError>;
}

/// a flat byte image mapped at `base`.
#[derive(Debug, Clone)]
pub struct Image {
    base: u32,
    bytes: Vec<u8>,
}

impl Image {
    pub fn new(base: u32, bytes: Vec<u8>) -> Image {
        Image { base, bytes }
    }

    /// map the contents of the file at `path` at `base`.
    pub fn from_file<P: AsRef<Path>>(base: u32, path: P) -> Result<Image, ListingError> {
        let bytes = std::fs::read(path)?;
        log::debug!("mapped {} bytes at {:#010x}", bytes.len(), base);
        Ok(Image::new(base, bytes))
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn read<const N: usize>(&self, address: u32) -> Result<[u8; N], ListingError> {
        let out_of_range = || ListingError::OutOfRange { address, width: N as u8 };
        let start = address.checked_sub(self.base).ok_or_else(out_of_range)? as usize;
        let end = start.checked_add(N).ok_or_else(out_of_range)?;
        let bytes = self.bytes.get(start..end).ok_or_else(out_of_range)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        Ok(buf)
    }
}

impl Memory for Image {
    fn read_word(&self, address: u32) -> Result<u32, ListingError> {
        self.read::<4>(address).map(u32::from_le_bytes)
    }

    fn read_halfword(&self, address: u32) -> Result<u16, ListingError> {
        self.read::<2>(address).map(u16::from_le_bytes)
    }
}

/// fetch and decode the instruction at `address`.
pub fn fetch<M: Memory + ?Sized>(memory: &M, mode: Mode, address: u32) -> Result<Instruction, ListingError> {
    match mode {
        Mode::Arm => memory.read_word(address).map(|word| decode_arm32(word, address)),
        Mode::Thumb => memory.read_halfword(address).map(|half| decode_thumb16(half, address)),
    }
}

/// `count` consecutive instructions starting at `start`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Listing {
    pub start: u32,
    pub mode: Mode,
    pub count: u32,
}

impl Listing {
    pub fn new(start: u32, mode: Mode, count: u32) -> Listing {
        Listing { start, mode, count }
    }

    /// write each instruction's text followed by `\r\n`. returns the address after the last
    /// instruction written. the first fetch that fails ends the listing with that error; lines
    /// before it have already been written.
    pub fn write_to<M: Memory + ?Sized, W: io::Write>(&self, memory: &M, out: &mut W) -> Result<u32, ListingError> {
        log::debug!(
            "listing {} {:?} instruction(s) from {:#010x}",
            self.count, self.mode, self.start
        );

        let mut address = self.start;
        for _ in 0..self.count {
            let inst = match fetch(memory, self.mode, address) {
                Ok(inst) => inst,
                Err(e) => {
                    log::warn!("stopping listing at {:#010x}: {}", address, e);
                    return Err(e);
                }
            };
            log::trace!("{:#010x}: {:#x} ({})", address, inst.opcode(), inst.kind());
            out.write_all(inst.text().as_bytes())?;
            out.write_all(b"\r\n")?;
            address = address.wrapping_add(inst.size() as u32);
        }
        out.flush()?;
        Ok(address)
    }
}

/// parse an unsigned number the way C's `strtoul(s, NULL, 0)` picks a radix: `0x`/`0X` for hex, a
/// leading `0` for octal, decimal otherwise. unlike strtoul, trailing junk is an error.
pub fn parse_number<T: Num>(s: &str) -> Result<T, ListingError> {
    let trimmed = s.trim();
    let (digits, radix) = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        (hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (&trimmed[1..], 8)
    } else {
        (trimmed, 10)
    };
    // from_str_radix tolerates a leading sign, strtoul semantics here do not
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return Err(ListingError::InvalidNumber(s.to_string()));
    }
    T::from_str_radix(digits, radix).map_err(|_| ListingError::InvalidNumber(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_pick_their_radix() {
        assert_eq!(parse_number::<u32>("0x8000").unwrap(), 0x8000);
        assert_eq!(parse_number::<u32>("0XfF").unwrap(), 0xff);
        assert_eq!(parse_number::<u32>("010").unwrap(), 8);
        assert_eq!(parse_number::<u32>("0").unwrap(), 0);
        assert_eq!(parse_number::<u32>("42").unwrap(), 42);
        assert_eq!(parse_number::<u32>("0xffffffff").unwrap(), u32::MAX);
    }

    #[test]
    fn bad_numbers() {
        assert!(parse_number::<u32>("").is_err());
        assert!(parse_number::<u32>("0x").is_err());
        assert!(parse_number::<u32>("08").is_err());
        assert!(parse_number::<u32>("12abc").is_err());
        assert!(parse_number::<u32>("0x-1").is_err());
        assert!(parse_number::<u32>("0x100000000").is_err());
    }

    #[test]
    fn image_reads_are_bounded() {
        let image = Image::new(0x100, vec![0x78, 0x56, 0x34, 0x12, 0xbc, 0x9a]);
        assert_eq!(image.read_word(0x100).unwrap(), 0x1234_5678);
        assert_eq!(image.read_halfword(0x104).unwrap(), 0x9abc);
        assert!(matches!(
            image.read_word(0x104),
            Err(ListingError::OutOfRange { address: 0x104, width: 4 })
        ));
        assert!(matches!(
            image.read_halfword(0xfe),
            Err(ListingError::OutOfRange { address: 0xfe, width: 2 })
        ));
    }
}
