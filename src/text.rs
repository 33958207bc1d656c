use core::fmt;

/// the most text an instruction's rendering can hold.
pub const TEXT_CAPACITY: usize = 127;

/// condition field mnemonics. `AL` is implied and never printed.
pub(crate) const CONDITIONS: [&str; 16] = [
    "EQ", "NE", "CS", "CC", "MI", "PL", "VS", "VC",
    "HI", "LS", "GE", "LT", "GT", "LE", "", "NV",
];

/// the condition suffix of an ARM opcode.
pub(crate) fn cond(opcode: u32) -> &'static str {
    CONDITIONS[(opcode >> 28) as usize]
}

/// fixed-capacity rendering of an instruction.
///
/// writes that would run past [`TEXT_CAPACITY`] are cut off at the last character that fits; the
/// buffer itself is never overrun, so no rendering can disturb anything beside it.
#[derive(Copy, Clone)]
pub struct InstText {
    buf: [u8; TEXT_CAPACITY + 1],
    len: u8,
}

impl InstText {
    pub const fn new() -> InstText {
        InstText { buf: [0; TEXT_CAPACITY + 1], len: 0 }
    }

    pub fn as_str(&self) -> &str {
        // only whole characters are ever copied in
        core::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn push_fmt(&mut self, args: fmt::Arguments) {
        // `write_str` below cannot fail, and the formatted values are integers and strs
        let _ = fmt::write(self, args);
    }
}

impl Default for InstText {
    fn default() -> InstText {
        InstText::new()
    }
}

impl fmt::Write for InstText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let len = self.len as usize;
        let mut take = s.len().min(TEXT_CAPACITY - len);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[len..len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take as u8;
        Ok(())
    }
}

impl PartialEq for InstText {
    fn eq(&self, other: &InstText) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for InstText {}

impl fmt::Debug for InstText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for InstText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// a register set rendered as `{r0, r1, r14}`, lowest register first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegList(pub u16);

impl fmt::Display for RegList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for reg in 0..16 {
            if self.0 & (1 << reg) == 0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "r{}", reg)?;
        }
        f.write_str("}")
    }
}

/// hex in C's alternate form (`%#x`): `0x` only in front of nonzero values, at least `digits`
/// digits, zero-padded out to `width` characters including any prefix. `0x1004` at width 8 is
/// `0x001004`, and zero at width 8 is `00000000`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct AltHex {
    value: u32,
    width: usize,
    digits: usize,
}

impl AltHex {
    /// `%#x`
    pub(crate) const fn new(value: u32) -> AltHex {
        AltHex { value, width: 0, digits: 1 }
    }

    /// `%#0<width>x`
    pub(crate) const fn padded(value: u32, width: usize) -> AltHex {
        AltHex { value, width, digits: 1 }
    }

    /// `%#<n>.<n>x`
    pub(crate) const fn digits(value: u32, digits: usize) -> AltHex {
        AltHex { value, width: digits, digits }
    }
}

impl fmt::Display for AltHex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let prefix = if self.value == 0 { "" } else { "0x" };
        let digits = self.digits.max(self.width.saturating_sub(prefix.len()));
        write!(f, "{}{:0digits$x}", prefix, self.value, digits = digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn text_truncates_at_capacity() {
        let mut text = InstText::new();
        for _ in 0..20 {
            write!(text, "0123456789").unwrap();
        }
        assert_eq!(text.len(), TEXT_CAPACITY);
        assert!(text.as_str().starts_with("0123456789"));
        assert!(text.as_str().ends_with("0123456"));
    }

    #[test]
    fn text_never_splits_characters() {
        let mut text = InstText::new();
        for _ in 0..(TEXT_CAPACITY - 1) {
            text.write_str("x").unwrap();
        }
        text.write_str("é").unwrap();
        assert_eq!(text.len(), TEXT_CAPACITY - 1);
        text.write_str("y").unwrap();
        assert_eq!(text.len(), TEXT_CAPACITY);
    }

    #[test]
    fn register_lists() {
        assert_eq!(RegList(0x0003).to_string(), "{r0, r1}");
        assert_eq!(RegList(0x0000).to_string(), "{}");
        assert_eq!(RegList(0x8001).to_string(), "{r0, r15}");
        assert_eq!(RegList(0xffff).to_string(), "{r0, r1, r2, r3, r4, r5, r6, r7, r8, r9, r10, r11, r12, r13, r14, r15}");
    }

    #[test]
    fn alternate_hex() {
        assert_eq!(AltHex::padded(0x1004, 8).to_string(), "0x001004");
        assert_eq!(AltHex::padded(0xffff_f000, 8).to_string(), "0xfffff000");
        assert_eq!(AltHex::padded(0, 8).to_string(), "00000000");
        assert_eq!(AltHex::padded(1, 2).to_string(), "0x1");
        assert_eq!(AltHex::padded(0, 2).to_string(), "00");
        assert_eq!(AltHex::digits(5, 2).to_string(), "0x05");
        assert_eq!(AltHex::digits(0, 2).to_string(), "00");
        assert_eq!(AltHex::digits(0x11, 6).to_string(), "0x000011");
        assert_eq!(AltHex::digits(0, 6).to_string(), "000000");
        assert_eq!(AltHex::new(0).to_string(), "0");
        assert_eq!(AltHex::new(0x3fc).to_string(), "0x3fc");
    }

    #[test]
    fn condition_table() {
        assert_eq!(cond(0x0000_0000), "EQ");
        assert_eq!(cond(0xe000_0000), "");
        assert_eq!(cond(0xf000_0000), "NV");
        assert_eq!(cond(0xd000_0000), "LE");
    }
}
