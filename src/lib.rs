//! decoders for 32-bit ARM (A32, through ARMv6) and 16-bit Thumb encodings.
//!
//! decoding is total: every 32-bit or 16-bit word produces an [`Instruction`], with encodings that
//! are not recognized reported as [`Kind::Undefined`] rather than an error. the only errors on the
//! `yaxpeax_arch::Decoder` path come from running out of input.
//!
//! ```
//! let inst = yaxpeax_arm32::decode_arm32(0xe1a00000, 0x8000);
//! assert_eq!(inst.assembly(), "NOP");
//! assert_eq!(inst.size(), 4);
//! ```

use core::fmt;

use num_traits::PrimInt;
use yaxpeax_arch::{AddressDiff, Arch, Decoder, LengthedInstruction, Reader, StandardDecodeError};

/// append formatted text to an instruction's rendering. the text buffer is bounded, so this never
/// fails and never writes past capacity.
macro_rules! render {
    ($inst:expr, $($arg:tt)*) => {
        $inst.text.push_fmt(format_args!($($arg)*))
    };
}

mod arm;
mod text;
mod thumb;
pub mod listing;

pub use arm::decode_arm32;
pub use text::{InstText, RegList, TEXT_CAPACITY};
pub use thumb::decode_thumb16;

#[derive(Debug)]
pub struct ARM;

impl Arch for ARM {
    type Address = u32;
    type Word = u8;
    type Instruction = Instruction;
    type DecodeError = StandardDecodeError;
    type Decoder = InstDecoder;
    type Operand = Operands;
}

/// which instruction set a word should be decoded as.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Arm,
    Thumb,
}

impl Mode {
    /// the width, in bytes, of one instruction word in this mode.
    pub fn word_size(&self) -> u8 {
        match self {
            Mode::Arm => 4,
            Mode::Thumb => 2,
        }
    }
}

/// decode `word` at `address` in the given mode. in thumb mode only the low 16 bits of `word` are
/// used.
pub fn decode(mode: Mode, word: u32, address: u32) -> Instruction {
    match mode {
        Mode::Arm => decode_arm32(word, address),
        Mode::Thumb => decode_thumb16(word as u16, address),
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Instruction {
    pub(crate) kind: Kind,
    pub(crate) opcode: u32,
    pub(crate) size: u8,
    pub(crate) address: u32,
    pub(crate) operands: Operands,
    pub(crate) text: InstText,
    // where the assembly follows the address and opcode columns
    pub(crate) asm_start: u8,
}

impl Instruction {
    /// start an ARM instruction: the address and opcode columns are rendered immediately.
    pub(crate) fn arm(opcode: u32, address: u32, kind: Kind) -> Instruction {
        let mut inst = Instruction::blank(opcode, address, 4, kind);
        render!(inst, "0x{:08x} 0x{:08x}    ", address, opcode);
        inst.asm_start = inst.text.len() as u8;
        inst
    }

    /// start a Thumb instruction: the address and opcode columns are rendered immediately.
    pub(crate) fn thumb(opcode: u16, address: u32, kind: Kind) -> Instruction {
        let mut inst = Instruction::blank(opcode as u32, address, 2, kind);
        render!(inst, "0x{:08x} 0x{:04x}    ", address, opcode);
        inst.asm_start = inst.text.len() as u8;
        inst
    }

    fn blank(opcode: u32, address: u32, size: u8, kind: Kind) -> Instruction {
        Instruction {
            kind,
            opcode,
            size,
            address,
            operands: Operands::None,
            text: InstText::new(),
            asm_start: 0,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// the raw instruction word, exactly as decoded. thumb words occupy the low 16 bits.
    pub fn opcode(&self) -> u32 {
        self.opcode
    }

    /// 4 for ARM instructions, 2 for Thumb instructions.
    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn operands(&self) -> &Operands {
        &self.operands
    }

    /// the full rendering: address column, opcode column, then assembly.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// just the assembly, without the address and opcode columns.
    pub fn assembly(&self) -> &str {
        self.text.as_str().get(self.asm_start as usize..).unwrap_or("")
    }
}

impl Default for Instruction {
    fn default() -> Instruction {
        Instruction::blank(0, 0, 4, Kind::Undefined)
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("kind", &self.kind)
            .field("opcode", &format_args!("{:#x}", self.opcode))
            .field("size", &self.size)
            .field("address", &format_args!("{:#010x}", self.address))
            .field("operands", &self.operands)
            .field("text", &self.text.as_str())
            .finish()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl LengthedInstruction for Instruction {
    type Unit = AddressDiff<<ARM as Arch>::Address>;
    fn min_size() -> Self::Unit {
        AddressDiff::from_const(2)
    }
    fn len(&self) -> Self::Unit {
        AddressDiff::from_const(self.size as u32)
    }
}

impl yaxpeax_arch::Instruction for Instruction {
    fn well_defined(&self) -> bool {
        self.kind != Kind::Undefined
    }
}

/// the class of a decoded instruction.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    // branches
    B,
    BL,
    BX,
    BXJ,
    BLX,
    /// first half of a thumb `BL`/`BLX` pair. carries the high part of the offset only.
    BlPrefix,
    CBZ,
    CBNZ,

    // data processing
    AND,
    EOR,
    SUB,
    RSB,
    ADD,
    ADC,
    SBC,
    RSC,
    TST,
    TEQ,
    CMP,
    CMN,
    ORR,
    MOV,
    BIC,
    MVN,

    // loads and stores
    LDR,
    LDRB,
    LDRT,
    LDRBT,
    LDRH,
    LDRSB,
    LDRSH,
    LDRD,
    LDM,
    STR,
    STRB,
    STRT,
    STRBT,
    STRH,
    STRD,
    STM,
    PLD,

    // status register access and processor state
    MRS,
    MSR,
    SRS,
    RFE,
    CPS,
    SETEND,

    // multiplies
    MUL,
    MLA,
    SMULL,
    SMLAL,
    UMULL,
    UMLAL,
    UMAAL,

    CLZ,

    // exception generating
    BKPT,
    SWI,

    // coprocessor
    CDP,
    LDC,
    STC,
    MCR,
    MRC,
    MCRR,
    MRRC,

    // semaphore
    SWP,
    SWPB,

    // enhanced DSP
    QADD,
    QDADD,
    QSUB,
    QDSUB,
    SMLAxy,
    SMLALxy,
    SMLAWy,
    SMULxy,
    SMULWy,

    // ARMv6 media
    ParallelAddSub,
    Pack,
    Saturate,
    Extend,
    DualMultiply,
    MostSignificantMultiply,
    ByteReverse,
    Select,
    SumAbsoluteDifference,

    // thumb-only
    Hint,
    IfThen,

    Undefined,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::BlPrefix => f.write_str("bl prefix"),
            Kind::ParallelAddSub => f.write_str("parallel add/subtract"),
            Kind::Pack => f.write_str("halfword pack"),
            Kind::Saturate => f.write_str("saturate"),
            Kind::Extend => f.write_str("extend"),
            Kind::DualMultiply => f.write_str("dual multiply"),
            Kind::MostSignificantMultiply => f.write_str("most significant word multiply"),
            Kind::ByteReverse => f.write_str("byte reverse"),
            Kind::Select => f.write_str("select bytes"),
            Kind::SumAbsoluteDifference => f.write_str("sum of absolute differences"),
            Kind::Hint => f.write_str("hint"),
            Kind::IfThen => f.write_str("if-then"),
            Kind::Undefined => f.write_str("undefined"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operands {
    None,
    Branch(BranchOperands),
    DataProcessing(DataProcOperands),
    LoadStore(LoadStoreOperands),
    LoadStoreMultiple(LoadStoreMultipleOperands),
}

/// operands of branches: `reg` for branch-to-register forms, `target` when the destination is
/// known from the instruction alone.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BranchOperands {
    pub reg: Option<u8>,
    pub target: Option<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DataProcOperands {
    /// `None` for comparisons, which only set flags.
    pub rd: Option<u8>,
    /// `None` for moves, which have no first source operand.
    pub rn: Option<u8>,
    pub s: bool,
    pub shifter: ShifterOperand,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShifterOperand {
    Immediate(u32),
    ImmediateShift { rm: u8, shift: Shift, amount: u8 },
    RegisterShift { rm: u8, shift: Shift, rs: u8 },
}

impl fmt::Display for ShifterOperand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShifterOperand::Immediate(imm) => write!(f, "#0x{:x}", imm),
            ShifterOperand::ImmediateShift { rm, shift, amount } => {
                write!(f, "r{}", rm)?;
                shift_suffix(f, *shift, *amount)
            }
            ShifterOperand::RegisterShift { rm, shift, rs } => {
                write!(f, "r{}, {} r{}", rm, shift, rs)
            }
        }
    }
}

/// `, <shift> #<amount>`, nothing for a shift of `LSL #0`, and `, RRX` for RRX.
fn shift_suffix(f: &mut fmt::Formatter, shift: Shift, amount: u8) -> fmt::Result {
    match (shift, amount) {
        (Shift::LSL, 0) => Ok(()),
        (Shift::RRX, _) => f.write_str(", RRX"),
        (shift, amount) => write!(f, ", {} #0x{:x}", shift, amount),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shift {
    LSL,
    LSR,
    ASR,
    ROR,
    RRX,
}

impl Shift {
    /// the shift named by a two-bit shift type field, for shifts by register.
    pub(crate) fn from_bits(ty: u32) -> Shift {
        [Shift::LSL, Shift::LSR, Shift::ASR, Shift::ROR][(ty & 0b11) as usize]
    }

    /// decode a shift type and five-bit immediate amount. LSR and ASR encode a shift by 32 as 0,
    /// and ROR by 0 is RRX.
    pub(crate) fn decode_immediate(ty: u32, amount: u32) -> (Shift, u8) {
        let amount = (amount & 0b1_1111) as u8;
        match (ty & 0b11, amount) {
            (0b01, 0) => (Shift::LSR, 32),
            (0b10, 0) => (Shift::ASR, 32),
            (0b11, 0) => (Shift::RRX, 0),
            (ty, amount) => (Shift::from_bits(ty), amount),
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Shift::LSL => "LSL",
            Shift::LSR => "LSR",
            Shift::ASR => "ASR",
            Shift::ROR => "ROR",
            Shift::RRX => "RRX",
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadStoreOperands {
    pub rd: u8,
    pub rn: u8,
    /// offset is added when set, subtracted otherwise.
    pub up: bool,
    pub index: IndexMode,
    pub offset: Offset,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexMode {
    /// `[rN, <offset>]`
    Offset,
    /// `[rN, <offset>]!`
    PreIndexed,
    /// `[rN], <offset>`
    PostIndexed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Offset {
    Immediate(u32),
    Register { rm: u8, shift: Shift, amount: u8 },
}

/// an offset with its sign, as it appears inside or after the brackets of an address.
pub(crate) struct SignedOffset {
    pub(crate) offset: Offset,
    pub(crate) up: bool,
}

impl fmt::Display for SignedOffset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.up { "" } else { "-" };
        match self.offset {
            Offset::Immediate(imm) => write!(f, "#{}0x{:x}", sign, imm),
            Offset::Register { rm, shift, amount } => {
                write!(f, "{}r{}", sign, rm)?;
                shift_suffix(f, shift, amount)
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadStoreMultipleOperands {
    pub rn: u8,
    /// bit `n` set means `rN` is transferred.
    pub registers: u16,
    pub mode: AddressingMode,
    pub writeback: bool,
    /// the `^` form: user-mode registers, or SPSR restore for loads including pc.
    pub user: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressingMode {
    IA,
    IB,
    DA,
    DB,
}

impl AddressingMode {
    pub(crate) fn from_pu(p: bool, u: bool) -> AddressingMode {
        match (p, u) {
            (false, true) => AddressingMode::IA,
            (true, true) => AddressingMode::IB,
            (false, false) => AddressingMode::DA,
            (true, false) => AddressingMode::DB,
        }
    }

    /// the mnemonic suffix. `IA` is the default and is not printed.
    pub(crate) fn suffix(&self) -> &'static str {
        match self {
            AddressingMode::IA => "",
            AddressingMode::IB => "IB",
            AddressingMode::DA => "DA",
            AddressingMode::DB => "DB",
        }
    }
}

/// rotate right; rotating by 0 (or any multiple of 32) leaves `value` unchanged.
pub(crate) fn ror(value: u32, places: u32) -> u32 {
    value.rotate_right(places)
}

/// sign-extend the low `bits` bits of `value`.
pub(crate) fn sign_extend(value: u32, bits: u32) -> i32 {
    debug_assert!(bits > 0 && bits <= 32);
    ((value << (32 - bits)) as i32) >> (32 - bits)
}

/// one entry of a decode table: words where `word & mask == value` are handled by `handler`.
/// tables are searched in order and the first match wins, so more specific entries must precede
/// the general ones they carve out of.
pub(crate) struct Rule<W: 'static> {
    pub(crate) mask: W,
    pub(crate) value: W,
    pub(crate) handler: fn(W, u32) -> Instruction,
    pub(crate) name: &'static str,
}

impl<W: PrimInt + 'static> Rule<W> {
    pub(crate) const fn new(mask: W, value: W, handler: fn(W, u32) -> Instruction, name: &'static str) -> Rule<W> {
        Rule { mask, value, handler, name }
    }

    pub(crate) fn matches(&self, word: W) -> bool {
        word & self.mask == self.value
    }
}

impl<W: fmt::LowerHex + 'static> fmt::Debug for Rule<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (& {:#x} == {:#x})", self.name, self.mask, self.value)
    }
}

pub(crate) fn first_match<W: PrimInt + 'static>(rules: &'static [Rule<W>], word: W) -> Option<&'static Rule<W>> {
    rules.iter().find(|rule| rule.matches(word))
}

pub(crate) fn dispatch<W: PrimInt + 'static>(rules: &'static [Rule<W>], word: W, address: u32) -> Option<Instruction> {
    first_match(rules, word).map(|rule| (rule.handler)(word, address))
}

/// a decoder for one instruction set. addresses of decoded instructions are `base` plus the
/// reader's offset, which matters for anything pc-relative.
#[derive(Debug, Copy, Clone)]
pub struct InstDecoder {
    mode: Mode,
    base: u32,
}

impl Default for InstDecoder {
    fn default() -> Self {
        InstDecoder::arm()
    }
}

impl InstDecoder {
    pub fn arm() -> Self {
        InstDecoder { mode: Mode::Arm, base: 0 }
    }

    pub fn thumb() -> Self {
        InstDecoder { mode: Mode::Thumb, base: 0 }
    }

    pub fn with_base(self, base: u32) -> Self {
        InstDecoder { base, ..self }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl Decoder<ARM> for InstDecoder {
    fn decode_into<T: Reader<<ARM as Arch>::Address, <ARM as Arch>::Word>>(&self, inst: &mut Instruction, words: &mut T) -> Result<(), <ARM as Arch>::DecodeError> {
        let address = self.base.wrapping_add(words.total_offset());
        match self.mode {
            Mode::Arm => {
                let mut buf = [0u8; 4];
                words.next_n(&mut buf).ok().ok_or(StandardDecodeError::ExhaustedInput)?;
                *inst = decode_arm32(u32::from_le_bytes(buf), address);
            }
            Mode::Thumb => {
                let mut buf = [0u8; 2];
                words.next_n(&mut buf).ok().ok_or(StandardDecodeError::ExhaustedInput)?;
                *inst = decode_thumb16(u16::from_le_bytes(buf), address);
            }
        }
        Ok(())
    }
}

#[test]
fn immediate_shifts_decode_right() {
    assert_eq!(Shift::decode_immediate(0b00, 0), (Shift::LSL, 0));
    assert_eq!(Shift::decode_immediate(0b01, 0), (Shift::LSR, 32));
    assert_eq!(Shift::decode_immediate(0b10, 0), (Shift::ASR, 32));
    assert_eq!(Shift::decode_immediate(0b11, 0), (Shift::RRX, 0));
    assert_eq!(Shift::decode_immediate(0b11, 4), (Shift::ROR, 4));
    assert_eq!(Shift::decode_immediate(0b01, 31), (Shift::LSR, 31));
}

#[test]
fn sign_extension() {
    assert_eq!(sign_extend(0x00ff_fffe, 24), -2);
    assert_eq!(sign_extend(0x007f_ffff, 24), 0x7f_ffff);
    assert_eq!(sign_extend(0x400, 11), -1024);
    assert_eq!(sign_extend(0x80, 8), -128);
    assert_eq!(ror(0xff, 8), 0xff00_0000);
    assert_eq!(ror(0x12, 0), 0x12);
}
