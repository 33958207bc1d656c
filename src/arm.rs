//! A32 decoding. the encoding space is split first on the condition field and bits [27:25], then
//! each group narrows further on whatever residual bits distinguish its members.

use crate::text::{cond, AltHex, RegList};
use crate::{
    dispatch, ror, sign_extend, AddressingMode, BranchOperands, DataProcOperands, IndexMode,
    Instruction, Kind, LoadStoreMultipleOperands, LoadStoreOperands, Offset, Operands, Rule,
    Shift, ShifterOperand, SignedOffset,
};

/// decode one ARM instruction word located at `address`.
pub fn decode_arm32(opcode: u32, address: u32) -> Instruction {
    let table = if opcode >> 28 == 0b1111 {
        UNCONDITIONAL
    } else {
        CONDITIONAL
    };
    match dispatch(table, opcode, address) {
        Some(inst) => inst,
        None => unreachable!("arm decode tables cover every opcode, but not {:#010x}", opcode),
    }
}

/// condition field `0b1111`.
static UNCONDITIONAL: &[Rule<u32>] = &[
    Rule::new(0x0800_0000, 0x0000_0000, preload, "pld"),
    Rule::new(0x0e00_0000, 0x0800_0000, return_state, "srs/rfe"),
    Rule::new(0x0e00_0000, 0x0a00_0000, blx_immediate, "blx (immediate)"),
    Rule::new(0x0e00_0000, 0x0c00_0000, coprocessor_load_store, "ldc2/stc2/mcrr2/mrrc2"),
    Rule::new(0x0f00_0000, 0x0e00_0000, coprocessor, "cdp2/mcr2/mrc2"),
    Rule::new(0x0f00_0000, 0x0f00_0000, undefined, "undefined"),
];

/// every other condition, by bits [27:25] and the bits that split each group.
static CONDITIONAL: &[Rule<u32>] = &[
    // 000
    Rule::new(0x0e00_0090, 0x0000_0090, multiply_or_extra_load_store, "multiplies, extra load/store"),
    Rule::new(0x0f90_0000, 0x0100_0000, miscellaneous, "miscellaneous"),
    Rule::new(0x0e00_0000, 0x0000_0000, data_processing, "data processing (register)"),
    // 001
    Rule::new(0x0fb0_0000, 0x0300_0000, undefined, "undefined"),
    Rule::new(0x0fb0_0000, 0x0320_0000, status_register, "msr (immediate)"),
    Rule::new(0x0e00_0000, 0x0200_0000, data_processing, "data processing (immediate)"),
    // 010
    Rule::new(0x0e00_0000, 0x0400_0000, load_store, "load/store (immediate offset)"),
    // 011
    Rule::new(0x0e00_0010, 0x0600_0000, load_store, "load/store (register offset)"),
    Rule::new(0x0ff0_00f0, 0x07f0_00f0, undefined, "architecturally undefined"),
    Rule::new(0x0e00_0000, 0x0600_0000, media, "media"),
    // 100
    Rule::new(0x0e00_0000, 0x0800_0000, load_store_multiple, "load/store multiple"),
    // 101
    Rule::new(0x0e00_0000, 0x0a00_0000, branch, "b/bl"),
    // 110
    Rule::new(0x0e00_0000, 0x0c00_0000, coprocessor_load_store, "ldc/stc/mcrr/mrrc"),
    // 111
    Rule::new(0x0f00_0000, 0x0f00_0000, software_interrupt, "svc"),
    Rule::new(0x0f00_0000, 0x0e00_0000, coprocessor, "cdp/mcr/mrc"),
];

/// bits [27:25] = 000 with bits 7 and 4 both set.
static MULTIPLY_EXTRA: &[Rule<u32>] = &[
    Rule::new(0x0fc0_00f0, 0x0000_0090, multiply, "mul/mla"),
    Rule::new(0x0ff0_00f0, 0x0040_0090, multiply_accumulate_accumulate, "umaal"),
    Rule::new(0x0f80_00f0, 0x0080_0090, multiply_long, "umull/umlal/smull/smlal"),
    Rule::new(0x0fb0_00f0, 0x0100_0090, swap, "swp/swpb"),
    // the rest of the 1001 space (exclusives, etc.) is not decoded
    Rule::new(0x0000_0060, 0x0000_0000, undefined, "undefined"),
    Rule::new(0x0000_0000, 0x0000_0000, extra_load_store, "ldrh/strh/ldrsb/ldrsh/ldrd/strd"),
];

/// bits [27:23] = 00010 with bit 20 clear, the compare opcodes without `S`.
static MISCELLANEOUS: &[Rule<u32>] = &[
    Rule::new(0x0000_00f0, 0x0000_0000, status_register, "mrs/msr (register)"),
    Rule::new(0x0060_00f0, 0x0020_0010, branch_exchange, "bx"),
    Rule::new(0x0060_00f0, 0x0020_0020, branch_exchange, "bxj"),
    Rule::new(0x0060_00f0, 0x0060_0010, count_leading_zeros, "clz"),
    Rule::new(0x0060_00f0, 0x0020_0030, branch_exchange, "blx (register)"),
    Rule::new(0x0000_00f0, 0x0000_0050, saturating_add_sub, "qadd/qsub/qdadd/qdsub"),
    Rule::new(0x0060_00f0, 0x0020_0070, breakpoint, "bkpt"),
    Rule::new(0x0000_0090, 0x0000_0080, dsp_multiply, "smla<x><y>/smlaw<y>/smul<x><y>/smulw<y>/smlal<x><y>"),
    Rule::new(0x0000_0000, 0x0000_0000, undefined, "undefined"),
];

/// bits [27:25] = 011 with bit 4 set. several of these overlap, so order matters.
static MEDIA: &[Rule<u32>] = &[
    Rule::new(0x0180_0000, 0x0000_0000, parallel_add_sub, "parallel add/subtract"),
    Rule::new(0x01f0_0020, 0x0080_0000, pack_halfword, "pkhbt/pkhtb"),
    Rule::new(0x01a0_0020, 0x00a0_0000, saturate, "ssat/usat"),
    Rule::new(0x0180_00f0, 0x0080_0070, extend, "sign/zero extend"),
    Rule::new(0x01f0_0080, 0x0100_0000, dual_multiply, "smlad/smlsd/smuad/smusd"),
    Rule::new(0x01f0_0000, 0x0140_0000, dual_multiply_long, "smlald/smlsld"),
    Rule::new(0x01f0_0000, 0x0150_0000, most_significant_multiply, "smmla/smmls/smmul"),
    Rule::new(0x01b0_00f0, 0x00a0_0030, saturate_halfwords, "ssat16/usat16"),
    Rule::new(0x01f0_00f0, 0x00b0_0030, byte_reverse, "rev"),
    Rule::new(0x01f0_00f0, 0x00b0_00b0, byte_reverse, "rev16"),
    Rule::new(0x01f0_00f0, 0x00f0_00b0, byte_reverse, "revsh"),
    Rule::new(0x01f0_00f0, 0x0080_00b0, select_bytes, "sel"),
    Rule::new(0x01f0_00f0, 0x0180_0010, sum_absolute_differences, "usad8/usada8"),
    Rule::new(0x0000_0000, 0x0000_0000, undefined, "undefined"),
];

fn select(table: &'static [Rule<u32>], opcode: u32, address: u32) -> Instruction {
    dispatch(table, opcode, address).unwrap_or_else(|| undefined(opcode, address))
}

fn reg(opcode: u32, lsb: u32) -> u8 {
    ((opcode >> lsb) & 0xf) as u8
}

fn bit(opcode: u32, n: u32) -> bool {
    opcode & (1 << n) != 0
}

/// coprocessor instructions in the unconditional space are the `2` forms.
fn cp_cond(opcode: u32) -> &'static str {
    if opcode >> 28 == 0b1111 {
        "2"
    } else {
        cond(opcode)
    }
}

fn undefined(opcode: u32, address: u32) -> Instruction {
    let mut inst = Instruction::arm(opcode, address, Kind::Undefined);
    render!(inst, "UNDEFINED INSTRUCTION");
    inst
}

fn preload(opcode: u32, address: u32) -> Instruction {
    if opcode & 0x0d70_f000 != 0x0550_f000 {
        return undefined(opcode, address);
    }
    let mut inst = Instruction::arm(opcode, address, Kind::PLD);
    let offset = SignedOffset { offset: word_offset(opcode), up: bit(opcode, 23) };
    render!(inst, "PLD [r{}, {}]", reg(opcode, 16), offset);
    inst
}

fn return_state(opcode: u32, address: u32) -> Instruction {
    let wback = if bit(opcode, 21) { "!" } else { "" };
    let mode = AddressingMode::from_pu(bit(opcode, 24), bit(opcode, 23)).suffix();

    match opcode & 0x0e50_0000 {
        0x0840_0000 => {
            let mut inst = Instruction::arm(opcode, address, Kind::SRS);
            render!(inst, "SRS{} SP{}, #{}", mode, wback, opcode & 0x1f);
            inst
        }
        0x0810_0000 => {
            let mut inst = Instruction::arm(opcode, address, Kind::RFE);
            render!(inst, "RFE{} r{}{}", mode, reg(opcode, 16), wback);
            inst
        }
        _ => undefined(opcode, address),
    }
}

fn blx_immediate(opcode: u32, address: u32) -> Instruction {
    let mut offset = sign_extend(opcode & 0x00ff_ffff, 24) << 2;
    // H selects the odd halfword
    if bit(opcode, 24) {
        offset |= 0b10;
    }
    let target = address.wrapping_add(8).wrapping_add(offset as u32);

    let mut inst = Instruction::arm(opcode, address, Kind::BLX);
    inst.operands = Operands::Branch(BranchOperands { reg: None, target: Some(target) });
    render!(inst, "BLX 0x{:08x}", target);
    inst
}

fn branch(opcode: u32, address: u32) -> Instruction {
    let link = bit(opcode, 24);
    let offset = sign_extend(opcode & 0x00ff_ffff, 24) << 2;
    let target = address.wrapping_add(8).wrapping_add(offset as u32);

    let mut inst = Instruction::arm(opcode, address, if link { Kind::BL } else { Kind::B });
    inst.operands = Operands::Branch(BranchOperands { reg: None, target: Some(target) });
    render!(inst, "B{}{} 0x{:08x}", if link { "L" } else { "" }, cond(opcode), target);
    inst
}

fn software_interrupt(opcode: u32, address: u32) -> Instruction {
    let mut inst = Instruction::arm(opcode, address, Kind::SWI);
    render!(inst, "SVC{} {}", cond(opcode), AltHex::digits(opcode & 0x00ff_ffff, 6));
    inst
}

/// coprocessor loads and stores, and the two-register transfers that share their space.
fn coprocessor_load_store(opcode: u32, address: u32) -> Instruction {
    let cp_num = (opcode >> 8) & 0xf;

    if opcode & 0x0fe0_0000 == 0x0c40_0000 {
        let (kind, mnemonic) = if bit(opcode, 20) {
            (Kind::MRRC, "MRRC")
        } else {
            (Kind::MCRR, "MCRR")
        };
        let mut inst = Instruction::arm(opcode, address, kind);
        render!(
            inst,
            "{}{} p{}, {:x}, r{}, r{}, c{}",
            mnemonic, cp_cond(opcode), cp_num, (opcode >> 4) & 0xf,
            reg(opcode, 12), reg(opcode, 16), reg(opcode, 0)
        );
        return inst;
    }

    // unindexed with U clear is not an addressing mode
    if opcode & 0x01a0_0000 == 0 {
        return undefined(opcode, address);
    }

    let (kind, mnemonic) = if bit(opcode, 20) {
        (Kind::LDC, "LDC")
    } else {
        (Kind::STC, "STC")
    };
    let crd = reg(opcode, 12);
    let rn = reg(opcode, 16);
    let imm8 = opcode & 0xff;
    let offset = imm8 << 2;
    let sign = if bit(opcode, 23) { "" } else { "-" };
    let long = if bit(opcode, 22) { "L" } else { "" };

    let mut inst = Instruction::arm(opcode, address, kind);
    render!(inst, "{}{}{} p{}, c{}, ", mnemonic, cp_cond(opcode), long, cp_num, crd);
    match opcode & 0x0120_0000 {
        0x0100_0000 => render!(inst, "[r{}, #{}{}]", rn, sign, offset),
        0x0120_0000 => render!(inst, "[r{}, #{}{}]!", rn, sign, offset),
        0x0020_0000 => render!(inst, "[r{}], #{}{}", rn, sign, offset),
        // unindexed: the immediate is passed to the coprocessor as-is
        _ => render!(inst, "[r{}], {{{}}}", rn, imm8),
    }
    inst
}

/// coprocessor data processing (bit 4 clear) and register transfers (bit 4 set).
fn coprocessor(opcode: u32, address: u32) -> Instruction {
    let cp_num = (opcode >> 8) & 0xf;
    let crd_rd = reg(opcode, 12);
    let crn = reg(opcode, 16);
    let crm = reg(opcode, 0);
    let opcode_2 = (opcode >> 5) & 0x7;

    if bit(opcode, 4) {
        let (kind, mnemonic) = if bit(opcode, 20) {
            (Kind::MRC, "MRC")
        } else {
            (Kind::MCR, "MCR")
        };
        let opcode_1 = (opcode >> 21) & 0x7;
        let mut inst = Instruction::arm(opcode, address, kind);
        render!(
            inst,
            "{}{} p{}, 0x{:02x}, r{}, c{}, c{}, 0x{:02x}",
            mnemonic, cp_cond(opcode), cp_num, opcode_1, crd_rd, crn, crm, opcode_2
        );
        inst
    } else {
        let opcode_1 = (opcode >> 20) & 0xf;
        let mut inst = Instruction::arm(opcode, address, Kind::CDP);
        render!(
            inst,
            "CDP{} p{}, 0x{:02x}, c{}, c{}, c{}, 0x{:02x}",
            cp_cond(opcode), cp_num, opcode_1, crd_rd, crn, crm, opcode_2
        );
        inst
    }
}

/// the offset of a word or byte load/store: a 12-bit immediate, or a register shifted by an
/// immediate.
fn word_offset(opcode: u32) -> Offset {
    if bit(opcode, 25) {
        let (shift, amount) = Shift::decode_immediate(opcode >> 5, opcode >> 7);
        Offset::Register { rm: reg(opcode, 0), shift, amount }
    } else {
        Offset::Immediate(opcode & 0xfff)
    }
}

fn index_mode(opcode: u32) -> IndexMode {
    match (bit(opcode, 24), bit(opcode, 21)) {
        (true, false) => IndexMode::Offset,
        (true, true) => IndexMode::PreIndexed,
        (false, _) => IndexMode::PostIndexed,
    }
}

/// render `rD, <address>` for a load or store. with `omit_zero`, a zero immediate offset leaves
/// just the base register.
fn render_address(inst: &mut Instruction, operands: &LoadStoreOperands, omit_zero: bool) {
    let offset = SignedOffset { offset: operands.offset, up: operands.up };
    if omit_zero && operands.offset == Offset::Immediate(0) {
        match operands.index {
            IndexMode::Offset | IndexMode::PostIndexed => render!(inst, "r{}, [r{}]", operands.rd, operands.rn),
            IndexMode::PreIndexed => render!(inst, "r{}, [r{}]!", operands.rd, operands.rn),
        }
        return;
    }
    match operands.index {
        IndexMode::Offset => render!(inst, "r{}, [r{}, {}]", operands.rd, operands.rn, offset),
        IndexMode::PreIndexed => render!(inst, "r{}, [r{}, {}]!", operands.rd, operands.rn, offset),
        IndexMode::PostIndexed => render!(inst, "r{}, [r{}], {}", operands.rd, operands.rn, offset),
    }
}

/// LDR, STR, LDRB, STRB and their user-mode `T` forms.
fn load_store(opcode: u32, address: u32) -> Instruction {
    let load = bit(opcode, 20);
    let byte = bit(opcode, 22);
    // post-indexed with writeback requested means the user-mode translation variant
    let translate = !bit(opcode, 24) && bit(opcode, 21);

    let (kind, suffix) = match (load, byte, translate) {
        (true, false, false) => (Kind::LDR, ""),
        (true, false, true) => (Kind::LDRT, "T"),
        (true, true, false) => (Kind::LDRB, "B"),
        (true, true, true) => (Kind::LDRBT, "BT"),
        (false, false, false) => (Kind::STR, ""),
        (false, false, true) => (Kind::STRT, "T"),
        (false, true, false) => (Kind::STRB, "B"),
        (false, true, true) => (Kind::STRBT, "BT"),
    };

    let operands = LoadStoreOperands {
        rd: reg(opcode, 12),
        rn: reg(opcode, 16),
        up: bit(opcode, 23),
        index: index_mode(opcode),
        offset: word_offset(opcode),
    };

    let mut inst = Instruction::arm(opcode, address, kind);
    inst.operands = Operands::LoadStore(operands);
    render!(inst, "{}{}{} ", if load { "LDR" } else { "STR" }, cond(opcode), suffix);
    render_address(&mut inst, &operands, true);
    inst
}

/// halfword, signed byte/halfword and doubleword transfers.
fn extra_load_store(opcode: u32, address: u32) -> Instruction {
    let load = bit(opcode, 20);
    let signed = bit(opcode, 6);
    let half = bit(opcode, 5);

    let (kind, operation, suffix) = match (signed, load, half) {
        (true, true, true) => (Kind::LDRSH, "LDR", "SH"),
        (true, true, false) => (Kind::LDRSB, "LDR", "SB"),
        // there are no signed stores; those encodings are the doubleword transfers
        (true, false, true) => (Kind::STRD, "STR", "D"),
        (true, false, false) => (Kind::LDRD, "LDR", "D"),
        (false, true, _) => (Kind::LDRH, "LDR", "H"),
        (false, false, _) => (Kind::STRH, "STR", "H"),
    };

    let offset = if bit(opcode, 22) {
        Offset::Immediate(((opcode >> 4) & 0xf0) | (opcode & 0xf))
    } else {
        Offset::Register { rm: reg(opcode, 0), shift: Shift::LSL, amount: 0 }
    };

    let operands = LoadStoreOperands {
        rd: reg(opcode, 12),
        rn: reg(opcode, 16),
        up: bit(opcode, 23),
        index: index_mode(opcode),
        offset,
    };

    let mut inst = Instruction::arm(opcode, address, kind);
    inst.operands = Operands::LoadStore(operands);
    render!(inst, "{}{}{} ", operation, cond(opcode), suffix);
    render_address(&mut inst, &operands, false);
    inst
}

fn load_store_multiple(opcode: u32, address: u32) -> Instruction {
    let load = bit(opcode, 20);
    let operands = LoadStoreMultipleOperands {
        rn: reg(opcode, 16),
        registers: (opcode & 0xffff) as u16,
        mode: AddressingMode::from_pu(bit(opcode, 24), bit(opcode, 23)),
        writeback: bit(opcode, 21),
        user: bit(opcode, 22),
    };

    let (kind, mnemonic) = if load { (Kind::LDM, "LDM") } else { (Kind::STM, "STM") };
    let mut inst = Instruction::arm(opcode, address, kind);
    inst.operands = Operands::LoadStoreMultiple(operands);
    render!(
        inst,
        "{}{}{} r{}{}, {}{}",
        mnemonic,
        operands.mode.suffix(),
        cond(opcode),
        operands.rn,
        if operands.writeback { "!" } else { "" },
        RegList(operands.registers),
        if operands.user { "^" } else { "" }
    );
    inst
}

fn multiply_or_extra_load_store(opcode: u32, address: u32) -> Instruction {
    select(MULTIPLY_EXTRA, opcode, address)
}

fn multiply(opcode: u32, address: u32) -> Instruction {
    let rd = reg(opcode, 16);
    let rn = reg(opcode, 12);
    let rs = reg(opcode, 8);
    let rm = reg(opcode, 0);
    let s = if bit(opcode, 20) { "S" } else { "" };

    if bit(opcode, 21) {
        let mut inst = Instruction::arm(opcode, address, Kind::MLA);
        render!(inst, "MLA{}{} r{}, r{}, r{}, r{}", cond(opcode), s, rd, rm, rs, rn);
        inst
    } else {
        let mut inst = Instruction::arm(opcode, address, Kind::MUL);
        render!(inst, "MUL{}{} r{}, r{}, r{}", cond(opcode), s, rd, rm, rs);
        inst
    }
}

fn multiply_long(opcode: u32, address: u32) -> Instruction {
    let (kind, mnemonic) = match (opcode >> 21) & 0b11 {
        0b00 => (Kind::UMULL, "UMULL"),
        0b01 => (Kind::UMLAL, "UMLAL"),
        0b10 => (Kind::SMULL, "SMULL"),
        _ => (Kind::SMLAL, "SMLAL"),
    };
    let rd_lo = reg(opcode, 12);
    let rd_hi = reg(opcode, 16);
    let s = if bit(opcode, 20) { "S" } else { "" };

    let mut inst = Instruction::arm(opcode, address, kind);
    render!(
        inst,
        "{}{}{} r{}, r{}, r{}, r{}",
        mnemonic, cond(opcode), s, rd_lo, rd_hi, reg(opcode, 0), reg(opcode, 8)
    );
    inst
}

/// UMAAL adds both halves of the destination pair into the 64-bit product.
fn multiply_accumulate_accumulate(opcode: u32, address: u32) -> Instruction {
    let mut inst = Instruction::arm(opcode, address, Kind::UMAAL);
    render!(
        inst,
        "UMAAL{} r{}, r{}, r{}, r{}",
        cond(opcode), reg(opcode, 12), reg(opcode, 16), reg(opcode, 0), reg(opcode, 8)
    );
    inst
}

fn swap(opcode: u32, address: u32) -> Instruction {
    let (kind, mnemonic) = if bit(opcode, 22) {
        (Kind::SWPB, "SWPB")
    } else {
        (Kind::SWP, "SWP")
    };
    let mut inst = Instruction::arm(opcode, address, kind);
    render!(
        inst,
        "{}{} r{}, r{}, [r{}]",
        mnemonic, cond(opcode), reg(opcode, 12), reg(opcode, 0), reg(opcode, 16)
    );
    inst
}

fn miscellaneous(opcode: u32, address: u32) -> Instruction {
    select(MISCELLANEOUS, opcode, address)
}

/// MRS, and MSR from a register or a rotated immediate.
fn status_register(opcode: u32, address: u32) -> Instruction {
    let psr = if bit(opcode, 22) { "SPSR" } else { "CPSR" };

    if !bit(opcode, 21) {
        let mut inst = Instruction::arm(opcode, address, Kind::MRS);
        render!(inst, "MRS{} r{}, {}", cond(opcode), reg(opcode, 12), psr);
        return inst;
    }

    let mut inst = Instruction::arm(opcode, address, Kind::MSR);
    render!(
        inst,
        "MSR{} {}_{}{}{}{}, ",
        cond(opcode),
        psr,
        if bit(opcode, 16) { "c" } else { "" },
        if bit(opcode, 17) { "x" } else { "" },
        if bit(opcode, 18) { "s" } else { "" },
        if bit(opcode, 19) { "f" } else { "" }
    );
    if bit(opcode, 25) {
        let immediate = ror(opcode & 0xff, ((opcode >> 8) & 0xf) * 2);
        render!(inst, "0x{:08x}", immediate);
    } else {
        render!(inst, "r{}", reg(opcode, 0));
    }
    inst
}

/// BX, BXJ and BLX (register).
fn branch_exchange(opcode: u32, address: u32) -> Instruction {
    let rm = reg(opcode, 0);
    let (kind, mnemonic) = match (opcode >> 4) & 0xf {
        0b0001 => (Kind::BX, "BX"),
        0b0010 => (Kind::BXJ, "BXJ"),
        _ => (Kind::BLX, "BLX"),
    };
    let mut inst = Instruction::arm(opcode, address, kind);
    inst.operands = Operands::Branch(BranchOperands { reg: Some(rm), target: None });
    render!(inst, "{}{} r{}", mnemonic, cond(opcode), rm);
    inst
}

fn count_leading_zeros(opcode: u32, address: u32) -> Instruction {
    let mut inst = Instruction::arm(opcode, address, Kind::CLZ);
    render!(inst, "CLZ{} r{}, r{}", cond(opcode), reg(opcode, 12), reg(opcode, 0));
    inst
}

fn saturating_add_sub(opcode: u32, address: u32) -> Instruction {
    let (kind, mnemonic) = match (opcode >> 21) & 0b11 {
        0b00 => (Kind::QADD, "QADD"),
        0b01 => (Kind::QSUB, "QSUB"),
        0b10 => (Kind::QDADD, "QDADD"),
        _ => (Kind::QDSUB, "QDSUB"),
    };
    let mut inst = Instruction::arm(opcode, address, kind);
    render!(
        inst,
        "{}{} r{}, r{}, r{}",
        mnemonic, cond(opcode), reg(opcode, 12), reg(opcode, 0), reg(opcode, 16)
    );
    inst
}

fn breakpoint(opcode: u32, address: u32) -> Instruction {
    let immediate = ((opcode & 0x000f_ff00) >> 4) | (opcode & 0xf);
    let mut inst = Instruction::arm(opcode, address, Kind::BKPT);
    render!(inst, "BKPT 0x{:04x}", immediate);
    inst
}

/// the enhanced DSP halfword multiplies. `x` picks the half of rm, `y` the half of rs.
fn dsp_multiply(opcode: u32, address: u32) -> Instruction {
    let x = if bit(opcode, 5) { "T" } else { "B" };
    let y = if bit(opcode, 6) { "T" } else { "B" };
    let rd = reg(opcode, 16);
    let rn = reg(opcode, 12);
    let rs = reg(opcode, 8);
    let rm = reg(opcode, 0);
    let c = cond(opcode);

    match (opcode >> 21) & 0b11 {
        0b00 => {
            let mut inst = Instruction::arm(opcode, address, Kind::SMLAxy);
            render!(inst, "SMLA{}{}{} r{}, r{}, r{}, r{}", x, y, c, rd, rm, rs, rn);
            inst
        }
        0b01 if !bit(opcode, 5) => {
            let mut inst = Instruction::arm(opcode, address, Kind::SMLAWy);
            render!(inst, "SMLAW{}{} r{}, r{}, r{}, r{}", y, c, rd, rm, rs, rn);
            inst
        }
        0b01 => {
            let mut inst = Instruction::arm(opcode, address, Kind::SMULWy);
            render!(inst, "SMULW{}{} r{}, r{}, r{}", y, c, rd, rm, rs);
            inst
        }
        0b10 => {
            let mut inst = Instruction::arm(opcode, address, Kind::SMLALxy);
            render!(inst, "SMLAL{}{}{} r{}, r{}, r{}, r{}", x, y, c, rn, rd, rm, rs);
            inst
        }
        _ => {
            let mut inst = Instruction::arm(opcode, address, Kind::SMULxy);
            render!(inst, "SMUL{}{}{} r{}, r{}, r{}", x, y, c, rd, rm, rs);
            inst
        }
    }
}

const DATA_PROCESSING: [(Kind, &str); 16] = [
    (Kind::AND, "AND"), (Kind::EOR, "EOR"), (Kind::SUB, "SUB"), (Kind::RSB, "RSB"),
    (Kind::ADD, "ADD"), (Kind::ADC, "ADC"), (Kind::SBC, "SBC"), (Kind::RSC, "RSC"),
    (Kind::TST, "TST"), (Kind::TEQ, "TEQ"), (Kind::CMP, "CMP"), (Kind::CMN, "CMN"),
    (Kind::ORR, "ORR"), (Kind::MOV, "MOV"), (Kind::BIC, "BIC"), (Kind::MVN, "MVN"),
];

fn shifter_operand(opcode: u32) -> ShifterOperand {
    if bit(opcode, 25) {
        ShifterOperand::Immediate(ror(opcode & 0xff, ((opcode >> 8) & 0xf) * 2))
    } else if !bit(opcode, 4) {
        let (shift, amount) = Shift::decode_immediate(opcode >> 5, opcode >> 7);
        ShifterOperand::ImmediateShift { rm: reg(opcode, 0), shift, amount }
    } else {
        ShifterOperand::RegisterShift {
            rm: reg(opcode, 0),
            shift: Shift::from_bits(opcode >> 5),
            rs: reg(opcode, 8),
        }
    }
}

fn data_processing(opcode: u32, address: u32) -> Instruction {
    let op = ((opcode >> 21) & 0xf) as usize;
    let (kind, mnemonic) = DATA_PROCESSING[op];
    let set_flags = bit(opcode, 20);
    let s = if set_flags { "S" } else { "" };
    let rd = reg(opcode, 12);
    let rn = reg(opcode, 16);
    let shifter = shifter_operand(opcode);

    let mut inst = Instruction::arm(opcode, address, kind);
    let mut operands = DataProcOperands { rd: Some(rd), rn: Some(rn), s: set_flags, shifter };

    match kind {
        Kind::TST | Kind::TEQ | Kind::CMP | Kind::CMN => {
            operands.rd = None;
            render!(inst, "{}{} r{}, {}", mnemonic, cond(opcode), rn, shifter);
        }
        Kind::MOV | Kind::MVN => {
            operands.rn = None;
            if opcode == 0xe1a0_0000 {
                // MOV r0, r0
                render!(inst, "NOP");
            } else {
                render!(inst, "{}{}{} r{}, {}", mnemonic, cond(opcode), s, rd, shifter);
            }
        }
        _ => {
            render!(inst, "{}{}{} r{}, r{}, {}", mnemonic, cond(opcode), s, rd, rn, shifter);
        }
    }
    inst.operands = Operands::DataProcessing(operands);
    inst
}

fn media(opcode: u32, address: u32) -> Instruction {
    select(MEDIA, opcode, address)
}

fn parallel_add_sub(opcode: u32, address: u32) -> Instruction {
    let prefix = match (opcode >> 20) & 0x7 {
        1 => "S",
        2 => "Q",
        3 => "SH",
        5 => "U",
        6 => "UQ",
        7 => "UH",
        _ => return undefined(opcode, address),
    };
    let op = match (opcode >> 5) & 0x7 {
        0 => "ADD16",
        1 => "ADDSUBX",
        2 => "SUBADDX",
        3 => "SUB16",
        4 => "ADD8",
        7 => "SUB8",
        _ => return undefined(opcode, address),
    };
    let mut inst = Instruction::arm(opcode, address, Kind::ParallelAddSub);
    render!(
        inst,
        "{}{}{} r{}, r{}, r{}",
        prefix, op, cond(opcode), reg(opcode, 12), reg(opcode, 16), reg(opcode, 0)
    );
    inst
}

fn pack_halfword(opcode: u32, address: u32) -> Instruction {
    let mut imm = (opcode >> 7) & 0x1f;
    let (ty, shift) = if bit(opcode, 6) {
        if imm == 0 {
            imm = 32;
        }
        ("TB", "ASR")
    } else {
        ("BT", "LSL")
    };
    let mut inst = Instruction::arm(opcode, address, Kind::Pack);
    render!(
        inst,
        "PKH{}{} r{}, r{}, r{}, {} #{}",
        ty, cond(opcode), reg(opcode, 12), reg(opcode, 16), reg(opcode, 0), shift, imm
    );
    inst
}

fn saturate(opcode: u32, address: u32) -> Instruction {
    let unsigned = bit(opcode, 22);
    let mut imm = (opcode >> 7) & 0x1f;
    let shift = if bit(opcode, 6) {
        if imm == 0 {
            imm = 32;
        }
        "ASR"
    } else {
        "LSL"
    };
    // SSAT saturates to sat_imm + 1 bits, USAT to sat_imm bits
    let sat = ((opcode >> 16) & 0x1f) + if unsigned { 0 } else { 1 };
    let mut inst = Instruction::arm(opcode, address, Kind::Saturate);
    render!(
        inst,
        "{}SAT{} r{}, #{}, r{}, {} #{}",
        if unsigned { 'U' } else { 'S' }, cond(opcode), reg(opcode, 12), sat, reg(opcode, 0), shift, imm
    );
    inst
}

fn saturate_halfwords(opcode: u32, address: u32) -> Instruction {
    let unsigned = bit(opcode, 22);
    let sat = ((opcode >> 16) & 0xf) + if unsigned { 0 } else { 1 };
    let mut inst = Instruction::arm(opcode, address, Kind::Saturate);
    render!(
        inst,
        "{}SAT16{} r{}, #{}, r{}",
        if unsigned { 'U' } else { 'S' }, cond(opcode), reg(opcode, 12), sat, reg(opcode, 0)
    );
    inst
}

/// SXTB/UXTH/... and the accumulating SXTAB/UXTAH/... forms, with an optional rotation.
fn extend(opcode: u32, address: u32) -> Instruction {
    let ty = match (opcode >> 20) & 0x3 {
        0 => "B16",
        2 => "B",
        3 => "H",
        _ => return undefined(opcode, address),
    };
    let rot = match (opcode >> 10) & 0x3 {
        0 => "",
        1 => ", ROR #8",
        2 => ", ROR #16",
        _ => ", ROR #24",
    };
    let u = if bit(opcode, 22) { 'U' } else { 'S' };
    let rd = reg(opcode, 12);
    let rn = reg(opcode, 16);
    let rm = reg(opcode, 0);

    let mut inst = Instruction::arm(opcode, address, Kind::Extend);
    if rn == 0xf {
        render!(inst, "{}XT{}{} r{}, r{}{}", u, ty, cond(opcode), rd, rm, rot);
    } else {
        render!(inst, "{}XTA{}{} r{}, r{}, r{}{}", u, ty, cond(opcode), rd, rn, rm, rot);
    }
    inst
}

fn dual_multiply(opcode: u32, address: u32) -> Instruction {
    let op = if bit(opcode, 6) { 'S' } else { 'A' };
    let x = if bit(opcode, 5) { "X" } else { "" };
    let ra = reg(opcode, 12);
    let mut inst = Instruction::arm(opcode, address, Kind::DualMultiply);
    if ra == 0xf {
        render!(
            inst,
            "SMU{}D{}{} r{}, r{}, r{}",
            op, x, cond(opcode), reg(opcode, 16), reg(opcode, 0), reg(opcode, 8)
        );
    } else {
        render!(
            inst,
            "SML{}D{}{} r{}, r{}, r{}, r{}",
            op, x, cond(opcode), reg(opcode, 16), reg(opcode, 0), reg(opcode, 8), ra
        );
    }
    inst
}

fn dual_multiply_long(opcode: u32, address: u32) -> Instruction {
    let mut inst = Instruction::arm(opcode, address, Kind::DualMultiply);
    render!(
        inst,
        "SML{}LD{}{} r{}, r{}, r{}, r{}",
        if bit(opcode, 6) { 'S' } else { 'A' },
        if bit(opcode, 5) { "X" } else { "" },
        cond(opcode),
        reg(opcode, 12),
        reg(opcode, 16),
        reg(opcode, 0),
        reg(opcode, 8)
    );
    inst
}

fn most_significant_multiply(opcode: u32, address: u32) -> Instruction {
    let ra = reg(opcode, 12);
    let round = if bit(opcode, 5) { "R" } else { "" };
    let subtract = match (opcode >> 6) & 0b11 {
        0b00 => false,
        0b11 if ra != 0xf => true,
        _ => return undefined(opcode, address),
    };

    let mut inst = Instruction::arm(opcode, address, Kind::MostSignificantMultiply);
    if ra == 0xf {
        render!(
            inst,
            "SMMUL{}{} r{}, r{}, r{}",
            round, cond(opcode), reg(opcode, 16), reg(opcode, 0), reg(opcode, 8)
        );
    } else {
        render!(
            inst,
            "SMML{}{}{} r{}, r{}, r{}, r{}",
            if subtract { 'S' } else { 'A' }, round, cond(opcode),
            reg(opcode, 16), reg(opcode, 0), reg(opcode, 8), ra
        );
    }
    inst
}

fn byte_reverse(opcode: u32, address: u32) -> Instruction {
    let mnemonic = match opcode & 0x01f0_00f0 {
        0x00b0_0030 => "REV",
        0x00b0_00b0 => "REV16",
        _ => "REVSH",
    };
    let mut inst = Instruction::arm(opcode, address, Kind::ByteReverse);
    render!(inst, "{}{} r{}, r{}", mnemonic, cond(opcode), reg(opcode, 12), reg(opcode, 0));
    inst
}

fn select_bytes(opcode: u32, address: u32) -> Instruction {
    let mut inst = Instruction::arm(opcode, address, Kind::Select);
    render!(
        inst,
        "SEL{} r{}, r{}, r{}",
        cond(opcode), reg(opcode, 12), reg(opcode, 16), reg(opcode, 0)
    );
    inst
}

fn sum_absolute_differences(opcode: u32, address: u32) -> Instruction {
    let ra = reg(opcode, 12);
    let mut inst = Instruction::arm(opcode, address, Kind::SumAbsoluteDifference);
    if ra == 0xf {
        render!(
            inst,
            "USAD8{} r{}, r{}, r{}",
            cond(opcode), reg(opcode, 16), reg(opcode, 0), reg(opcode, 8)
        );
    } else {
        render!(
            inst,
            "USADA8{} r{}, r{}, r{}, r{}",
            cond(opcode), reg(opcode, 16), reg(opcode, 0), reg(opcode, 8), ra
        );
    }
    inst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first_match;

    fn rule_name(table: &'static [Rule<u32>], opcode: u32) -> &'static str {
        first_match(table, opcode).map(|rule| rule.name).unwrap_or("<none>")
    }

    #[test]
    fn top_level_tables_are_exhaustive() {
        // the top-level masks only look at bits [27:20] and [7:4]
        for hi in 0..0x100u32 {
            for lo in 0..0x10u32 {
                let body = (hi << 20) | (lo << 4);
                assert!(first_match(CONDITIONAL, 0xe000_0000 | body).is_some(), "{:#010x}", body);
                assert!(first_match(UNCONDITIONAL, 0xf000_0000 | body).is_some(), "{:#010x}", body);
            }
        }
    }

    #[test]
    fn conditional_entries() {
        assert_eq!(rule_name(CONDITIONAL, 0xe0000091), "multiplies, extra load/store");
        assert_eq!(rule_name(CONDITIONAL, 0xe12fff1e), "miscellaneous");
        assert_eq!(rule_name(CONDITIONAL, 0xe0811002), "data processing (register)");
        assert_eq!(rule_name(CONDITIONAL, 0xe3000000), "undefined");
        assert_eq!(rule_name(CONDITIONAL, 0xe328f00f), "msr (immediate)");
        assert_eq!(rule_name(CONDITIONAL, 0xe3a00001), "data processing (immediate)");
        assert_eq!(rule_name(CONDITIONAL, 0xe5912004), "load/store (immediate offset)");
        assert_eq!(rule_name(CONDITIONAL, 0xe7912003), "load/store (register offset)");
        assert_eq!(rule_name(CONDITIONAL, 0xe7f000f0), "architecturally undefined");
        assert_eq!(rule_name(CONDITIONAL, 0xe6bf0f30), "media");
        assert_eq!(rule_name(CONDITIONAL, 0xe8bd8010), "load/store multiple");
        assert_eq!(rule_name(CONDITIONAL, 0xeafffffe), "b/bl");
        assert_eq!(rule_name(CONDITIONAL, 0xed9f0a00), "ldc/stc/mcrr/mrrc");
        assert_eq!(rule_name(CONDITIONAL, 0xef000000), "svc");
        assert_eq!(rule_name(CONDITIONAL, 0xee110f10), "cdp/mcr/mrc");
    }

    #[test]
    fn unconditional_entries() {
        assert_eq!(rule_name(UNCONDITIONAL, 0xf5d1f000), "pld");
        assert_eq!(rule_name(UNCONDITIONAL, 0xf8bd0a00), "srs/rfe");
        assert_eq!(rule_name(UNCONDITIONAL, 0xfa000000), "blx (immediate)");
        assert_eq!(rule_name(UNCONDITIONAL, 0xfc400000), "ldc2/stc2/mcrr2/mrrc2");
        assert_eq!(rule_name(UNCONDITIONAL, 0xfe000000), "cdp2/mcr2/mrc2");
        assert_eq!(rule_name(UNCONDITIONAL, 0xff000000), "undefined");
    }

    #[test]
    fn multiply_extra_entries() {
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe0010392), "mul/mla");
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe0810392), "umull/umlal/smull/smlal");
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe0203291), "mul/mla");
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe0432291), "umaal");
        // bits 22:21 = 11 is not a plain multiply
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe0632291), "undefined");
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe0532291), "undefined");
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe1020091), "swp/swpb");
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe1910f9f), "undefined");
        assert_eq!(rule_name(MULTIPLY_EXTRA, 0xe1d010b2), "ldrh/strh/ldrsb/ldrsh/ldrd/strd");
    }

    #[test]
    fn miscellaneous_entries() {
        assert_eq!(rule_name(MISCELLANEOUS, 0xe10f0000), "mrs/msr (register)");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe12fff1e), "bx");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe12fff20), "bxj");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe16f0f11), "clz");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe12fff33), "blx (register)");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe1020051), "qadd/qsub/qdadd/qdsub");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe1200070), "bkpt");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe1000281), "smla<x><y>/smlaw<y>/smul<x><y>/smulw<y>/smlal<x><y>");
        assert_eq!(rule_name(MISCELLANEOUS, 0xe1000010), "undefined");
    }

    #[test]
    fn media_entries() {
        assert_eq!(rule_name(MEDIA, 0xe6112f11), "parallel add/subtract");
        assert_eq!(rule_name(MEDIA, 0xe6810012), "pkhbt/pkhtb");
        assert_eq!(rule_name(MEDIA, 0xe6a00011), "ssat/usat");
        assert_eq!(rule_name(MEDIA, 0xe6af0071), "sign/zero extend");
        assert_eq!(rule_name(MEDIA, 0xe7000211), "smlad/smlsd/smuad/smusd");
        assert_eq!(rule_name(MEDIA, 0xe7410213), "smlald/smlsld");
        assert_eq!(rule_name(MEDIA, 0xe750f211), "smmla/smmls/smmul");
        assert_eq!(rule_name(MEDIA, 0xe6a10f31), "ssat16/usat16");
        assert_eq!(rule_name(MEDIA, 0xe6bf0f31), "rev");
        assert_eq!(rule_name(MEDIA, 0xe6bf0fb1), "rev16");
        assert_eq!(rule_name(MEDIA, 0xe6ff0fb1), "revsh");
        assert_eq!(rule_name(MEDIA, 0xe6810fb2), "sel");
        assert_eq!(rule_name(MEDIA, 0xe781f211), "usad8/usada8");
        assert_eq!(rule_name(MEDIA, 0xe7c00010), "undefined");
    }
}
