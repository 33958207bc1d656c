//! 16-bit Thumb decoding. 32-bit Thumb-2 encodings are not reassembled: each halfword of a
//! `BL`/`BLX` pair decodes on its own.

use crate::text::{AltHex, RegList, CONDITIONS};
use crate::{
    dispatch, sign_extend, AddressingMode, BranchOperands, DataProcOperands, IndexMode,
    Instruction, Kind, LoadStoreMultipleOperands, LoadStoreOperands, Offset, Operands, Rule,
    Shift, ShifterOperand,
};

/// decode one Thumb halfword located at `address`.
pub fn decode_thumb16(opcode: u16, address: u32) -> Instruction {
    match dispatch(TOP, opcode, address) {
        Some(inst) => inst,
        None => unreachable!("thumb decode table covers every opcode, but not {:#06x}", opcode),
    }
}

static TOP: &[Rule<u16>] = &[
    Rule::new(0xf800, 0x1800, add_sub, "adds/subs (register, immediate)"),
    Rule::new(0xe000, 0x0000, shift_immediate, "lsls/lsrs/asrs (immediate)"),
    Rule::new(0xe000, 0x2000, data_processing_immediate, "movs/cmp/adds/subs (8-bit immediate)"),
    Rule::new(0xf800, 0x4000, data_processing, "data processing, high registers, bx/blx"),
    Rule::new(0xf800, 0x4800, load_literal, "ldr (literal)"),
    Rule::new(0xf000, 0x5000, load_store_register, "load/store (register offset)"),
    Rule::new(0xe000, 0x6000, load_store_immediate, "load/store word/byte (immediate offset)"),
    Rule::new(0xf000, 0x8000, load_store_immediate, "load/store halfword (immediate offset)"),
    Rule::new(0xf000, 0x9000, load_store_stack, "load/store (sp-relative)"),
    Rule::new(0xf000, 0xa000, add_sp_pc, "add (sp/pc plus immediate)"),
    Rule::new(0xf000, 0xb000, miscellaneous, "miscellaneous"),
    Rule::new(0xf000, 0xc000, load_store_multiple, "ldm/stm"),
    Rule::new(0xf000, 0xd000, conditional_branch, "b<cond>/svc"),
    Rule::new(0xf801, 0xe801, undefined, "undefined"),
    Rule::new(0xe000, 0xe000, branch, "b/bl/blx"),
];

/// `1011 xxxx xxxx xxxx`, mostly split on bits [11:8].
static MISCELLANEOUS: &[Rule<u16>] = &[
    Rule::new(0x0f00, 0x0000, adjust_stack, "add/sub sp"),
    Rule::new(0x0500, 0x0100, compare_and_branch, "cbz/cbnz"),
    Rule::new(0x0f00, 0x0200, extend, "sxth/sxtb/uxth/uxtb"),
    Rule::new(0x0600, 0x0400, load_store_multiple, "push/pop"),
    Rule::new(0x0f00, 0x0600, change_processor_state, "cps/setend"),
    Rule::new(0x0fc0, 0x0a80, undefined, "undefined"),
    Rule::new(0x0f00, 0x0a00, byte_reverse, "rev/rev16/revsh"),
    Rule::new(0x0f00, 0x0e00, breakpoint, "bkpt"),
    Rule::new(0x0f0f, 0x0f00, hint, "hints"),
    Rule::new(0x0f00, 0x0f00, if_then, "it"),
    Rule::new(0x0000, 0x0000, undefined, "undefined"),
];

fn low_reg(opcode: u16, lsb: u16) -> u8 {
    ((opcode >> lsb) & 0x7) as u8
}

fn bit(opcode: u16, n: u16) -> bool {
    opcode & (1 << n) != 0
}

fn undefined(opcode: u16, address: u32) -> Instruction {
    let mut inst = Instruction::thumb(opcode, address, Kind::Undefined);
    render!(inst, "UNDEFINED INSTRUCTION");
    inst
}

fn branch_to(inst: &mut Instruction, target: u32) {
    inst.operands = Operands::Branch(BranchOperands { reg: None, target: Some(target) });
}

/// the branch group, by bits [12:11]: B, the BLX suffix, the BL/BLX prefix, and the BL suffix.
fn branch(opcode: u16, address: u32) -> Instruction {
    let imm11 = (opcode & 0x7ff) as u32;
    match (opcode >> 11) & 0b11 {
        0b00 => {
            let target = address.wrapping_add(4).wrapping_add((sign_extend(imm11, 11) << 1) as u32);
            let mut inst = Instruction::thumb(opcode, address, Kind::B);
            branch_to(&mut inst, target);
            render!(inst, "B {}", AltHex::padded(target, 8));
            inst
        }
        0b01 => {
            let target = address.wrapping_add(4).wrapping_add(imm11 << 1) & !0b11;
            let mut inst = Instruction::thumb(opcode, address, Kind::BLX);
            branch_to(&mut inst, target);
            render!(inst, "BLX {}", AltHex::padded(target, 8));
            inst
        }
        0b10 => {
            // only the high part of the offset; the target is not known from this halfword
            let high = (sign_extend(imm11, 11) as u32) << 12;
            let mut inst = Instruction::thumb(opcode, address, Kind::BlPrefix);
            inst.operands = Operands::Branch(BranchOperands { reg: None, target: None });
            render!(inst, "prefix {}", AltHex::padded(high, 8));
            inst
        }
        _ => {
            let target = address.wrapping_add(4).wrapping_add(imm11 << 1);
            let mut inst = Instruction::thumb(opcode, address, Kind::BL);
            branch_to(&mut inst, target);
            render!(inst, "BL {}", AltHex::padded(target, 8));
            inst
        }
    }
}

fn conditional_branch(opcode: u16, address: u32) -> Instruction {
    let imm8 = (opcode & 0xff) as u32;
    match (opcode >> 8) & 0xf {
        0xe => undefined(opcode, address),
        0xf => {
            let mut inst = Instruction::thumb(opcode, address, Kind::SWI);
            render!(inst, "SVC {}", AltHex::padded(imm8, 2));
            inst
        }
        cond => {
            let target = address.wrapping_add(4).wrapping_add((sign_extend(imm8, 8) << 1) as u32);
            let mut inst = Instruction::thumb(opcode, address, Kind::B);
            branch_to(&mut inst, target);
            render!(inst, "B{} {}", CONDITIONS[cond as usize], AltHex::padded(target, 8));
            inst
        }
    }
}

fn add_sub(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 0);
    let rn = low_reg(opcode, 3);
    let rm_imm = low_reg(opcode, 6);
    let (kind, mnemonic) = if bit(opcode, 9) {
        (Kind::SUB, "SUBS")
    } else {
        (Kind::ADD, "ADDS")
    };

    let mut inst = Instruction::thumb(opcode, address, kind);
    let shifter = if bit(opcode, 10) {
        render!(inst, "{} r{}, r{}, #{}", mnemonic, rd, rn, rm_imm);
        ShifterOperand::Immediate(rm_imm as u32)
    } else {
        render!(inst, "{} r{}, r{}, r{}", mnemonic, rd, rn, rm_imm);
        ShifterOperand::ImmediateShift { rm: rm_imm, shift: Shift::LSL, amount: 0 }
    };
    inst.operands = Operands::DataProcessing(DataProcOperands {
        rd: Some(rd),
        rn: Some(rn),
        s: true,
        shifter,
    });
    inst
}

fn shift_immediate(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 0);
    let rm = low_reg(opcode, 3);
    let ty = ((opcode >> 11) & 0b11) as u32;
    // ty 0b11 is add/sub, matched before this
    let (shift, amount) = Shift::decode_immediate(ty, ((opcode >> 6) & 0x1f) as u32);

    let mut inst = Instruction::thumb(opcode, address, Kind::MOV);
    inst.operands = Operands::DataProcessing(DataProcOperands {
        rd: Some(rd),
        rn: None,
        s: true,
        shifter: ShifterOperand::ImmediateShift { rm, shift, amount },
    });
    render!(inst, "{}S r{}, r{}, #{}", shift, rd, rm, AltHex::digits(amount as u32, 2));
    inst
}

fn data_processing_immediate(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 8);
    let imm8 = (opcode & 0xff) as u32;
    let (kind, mnemonic) = match (opcode >> 11) & 0b11 {
        0b00 => (Kind::MOV, "MOVS"),
        0b01 => (Kind::CMP, "CMP"),
        0b10 => (Kind::ADD, "ADDS"),
        _ => (Kind::SUB, "SUBS"),
    };

    let mut inst = Instruction::thumb(opcode, address, kind);
    inst.operands = Operands::DataProcessing(DataProcOperands {
        rd: if kind == Kind::CMP { None } else { Some(rd) },
        rn: if kind == Kind::MOV { None } else { Some(rd) },
        s: true,
        shifter: ShifterOperand::Immediate(imm8),
    });
    render!(inst, "{} r{}, #{}", mnemonic, rd, AltHex::digits(imm8, 2));
    inst
}

/// the two-register ALU operations.
const ALU: [(Kind, &str); 16] = [
    (Kind::AND, "ANDS"), (Kind::EOR, "EORS"), (Kind::MOV, "LSLS"), (Kind::MOV, "LSRS"),
    (Kind::MOV, "ASRS"), (Kind::ADC, "ADCS"), (Kind::SBC, "SBCS"), (Kind::MOV, "RORS"),
    (Kind::TST, "TST"), (Kind::RSB, "RSBS"), (Kind::CMP, "CMP"), (Kind::CMN, "CMN"),
    (Kind::ORR, "ORRS"), (Kind::MUL, "MULS"), (Kind::BIC, "BICS"), (Kind::MVN, "MVNS"),
];

/// `010000` ALU operations on low registers, and `010001` ADD/CMP/MOV on any registers plus
/// BX/BLX.
fn data_processing(opcode: u16, address: u32) -> Instruction {
    let mut rd = low_reg(opcode, 0);
    let mut rm = low_reg(opcode, 3);

    if !bit(opcode, 10) {
        let op = ((opcode >> 6) & 0xf) as usize;
        let (kind, mnemonic) = ALU[op];
        let unshifted = ShifterOperand::ImmediateShift { rm, shift: Shift::LSL, amount: 0 };
        let operands = match op {
            // register-controlled shifts shift rd by rm
            0x2 | 0x3 | 0x4 | 0x7 => {
                let shift = match op {
                    0x2 => Shift::LSL,
                    0x3 => Shift::LSR,
                    0x4 => Shift::ASR,
                    _ => Shift::ROR,
                };
                DataProcOperands {
                    rd: Some(rd),
                    rn: None,
                    s: true,
                    shifter: ShifterOperand::RegisterShift { rm: rd, shift, rs: rm },
                }
            }
            0x8 | 0xa | 0xb => DataProcOperands { rd: None, rn: Some(rd), s: true, shifter: unshifted },
            0x9 => DataProcOperands { rd: Some(rd), rn: Some(rm), s: true, shifter: ShifterOperand::Immediate(0) },
            0xf => DataProcOperands { rd: Some(rd), rn: None, s: true, shifter: unshifted },
            _ => DataProcOperands { rd: Some(rd), rn: Some(rd), s: true, shifter: unshifted },
        };

        let mut inst = Instruction::thumb(opcode, address, kind);
        inst.operands = Operands::DataProcessing(operands);
        if op == 0x9 {
            render!(inst, "{} r{}, r{}, #0", mnemonic, rd, rm);
        } else {
            render!(inst, "{} r{}, r{}", mnemonic, rd, rm);
        }
        return inst;
    }

    // high registers
    let h1 = bit(opcode, 7);
    if h1 {
        rd |= 0b1000;
    }
    if bit(opcode, 6) {
        rm |= 0b1000;
    }

    let (kind, mnemonic) = match (opcode >> 8) & 0b11 {
        0b00 => (Kind::ADD, "ADD"),
        0b01 => (Kind::CMP, "CMP"),
        0b10 => (Kind::MOV, "MOV"),
        _ => {
            if opcode & 0x7 != 0 {
                return undefined(opcode, address);
            }
            let (kind, mnemonic) = if h1 { (Kind::BLX, "BLX") } else { (Kind::BX, "BX") };
            let mut inst = Instruction::thumb(opcode, address, kind);
            inst.operands = Operands::Branch(BranchOperands { reg: Some(rm), target: None });
            render!(inst, "{} r{}", mnemonic, rm);
            return inst;
        }
    };

    let mut inst = Instruction::thumb(opcode, address, kind);
    inst.operands = Operands::DataProcessing(DataProcOperands {
        rd: if kind == Kind::CMP { None } else { Some(rd) },
        rn: if kind == Kind::MOV { None } else { Some(rd) },
        // high-register forms leave the flags alone, except CMP
        s: kind == Kind::CMP,
        shifter: ShifterOperand::ImmediateShift { rm, shift: Shift::LSL, amount: 0 },
    });
    if kind == Kind::MOV && rd == rm {
        render!(inst, "NOP ; (MOV r{}, r{})", rd, rm);
    } else {
        render!(inst, "{} r{}, r{}", mnemonic, rd, rm);
    }
    inst
}

fn load_store_operands(rd: u8, rn: u8, offset: Offset) -> Operands {
    Operands::LoadStore(LoadStoreOperands { rd, rn, up: true, index: IndexMode::Offset, offset })
}

fn load_literal(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 8);
    let offset = ((opcode & 0xff) as u32) * 4;
    // the pc reads as this instruction plus 4, word-aligned
    let literal = (address.wrapping_add(4) & !0b11).wrapping_add(offset);

    let mut inst = Instruction::thumb(opcode, address, Kind::LDR);
    inst.operands = load_store_operands(rd, 15, Offset::Immediate(offset));
    render!(inst, "LDR r{}, [pc, #{}] ; {}", rd, AltHex::new(offset), AltHex::padded(literal, 8));
    inst
}

fn load_store_register(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 0);
    let rn = low_reg(opcode, 3);
    let rm = low_reg(opcode, 6);
    let (kind, mnemonic) = match (opcode >> 9) & 0x7 {
        0 => (Kind::STR, "STR"),
        1 => (Kind::STRH, "STRH"),
        2 => (Kind::STRB, "STRB"),
        3 => (Kind::LDRSB, "LDRSB"),
        4 => (Kind::LDR, "LDR"),
        5 => (Kind::LDRH, "LDRH"),
        6 => (Kind::LDRB, "LDRB"),
        _ => (Kind::LDRSH, "LDRSH"),
    };

    let mut inst = Instruction::thumb(opcode, address, kind);
    inst.operands = load_store_operands(rd, rn, Offset::Register { rm, shift: Shift::LSL, amount: 0 });
    render!(inst, "{} r{}, [r{}, r{}]", mnemonic, rd, rn, rm);
    inst
}

/// word and byte (`011B L...`) and halfword (`1000 L...`) transfers with a scaled 5-bit offset.
fn load_store_immediate(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 0);
    let rn = low_reg(opcode, 3);
    let imm5 = ((opcode >> 6) & 0x1f) as u32;
    let load = bit(opcode, 11);

    let (kind, suffix, offset) = if opcode & 0xf000 == 0x8000 {
        (if load { Kind::LDRH } else { Kind::STRH }, "H", imm5 << 1)
    } else if bit(opcode, 12) {
        (if load { Kind::LDRB } else { Kind::STRB }, "B", imm5)
    } else {
        (if load { Kind::LDR } else { Kind::STR }, "", imm5 << 2)
    };

    let mut inst = Instruction::thumb(opcode, address, kind);
    inst.operands = load_store_operands(rd, rn, Offset::Immediate(offset));
    render!(
        inst,
        "{}{} r{}, [r{}, #{}]",
        if load { "LDR" } else { "STR" }, suffix, rd, rn, AltHex::new(offset)
    );
    inst
}

fn load_store_stack(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 8);
    let offset = ((opcode & 0xff) as u32) * 4;
    let (kind, mnemonic) = if bit(opcode, 11) { (Kind::LDR, "LDR") } else { (Kind::STR, "STR") };

    let mut inst = Instruction::thumb(opcode, address, kind);
    inst.operands = load_store_operands(rd, 13, Offset::Immediate(offset));
    render!(inst, "{} r{}, [SP, #{}]", mnemonic, rd, AltHex::new(offset));
    inst
}

fn add_sp_pc(opcode: u16, address: u32) -> Instruction {
    let rd = low_reg(opcode, 8);
    let imm = ((opcode & 0xff) as u32) * 4;
    let (rn, name) = if bit(opcode, 11) { (13, "SP") } else { (15, "PC") };

    let mut inst = Instruction::thumb(opcode, address, Kind::ADD);
    inst.operands = Operands::DataProcessing(DataProcOperands {
        rd: Some(rd),
        rn: Some(rn),
        s: false,
        shifter: ShifterOperand::Immediate(imm),
    });
    render!(inst, "ADD r{}, {}, #{}", rd, name, AltHex::new(imm));
    inst
}

fn miscellaneous(opcode: u16, address: u32) -> Instruction {
    dispatch(MISCELLANEOUS, opcode, address).unwrap_or_else(|| undefined(opcode, address))
}

fn adjust_stack(opcode: u16, address: u32) -> Instruction {
    let imm = ((opcode & 0x7f) as u32) * 4;
    let (kind, mnemonic) = if bit(opcode, 7) { (Kind::SUB, "SUB") } else { (Kind::ADD, "ADD") };

    let mut inst = Instruction::thumb(opcode, address, kind);
    inst.operands = Operands::DataProcessing(DataProcOperands {
        rd: Some(13),
        rn: Some(13),
        s: false,
        shifter: ShifterOperand::Immediate(imm),
    });
    render!(inst, "{} SP, #{}", mnemonic, AltHex::new(imm));
    inst
}

fn compare_and_branch(opcode: u16, address: u32) -> Instruction {
    // i:imm5, in halfwords
    let offset = (((opcode >> 3) & 0x1f) | ((opcode & 0x0200) >> 4)) as u32;
    let target = address.wrapping_add(4).wrapping_add(offset << 1);
    let nonzero = bit(opcode, 11);

    let mut inst = Instruction::thumb(opcode, address, if nonzero { Kind::CBNZ } else { Kind::CBZ });
    branch_to(&mut inst, target);
    render!(inst, "CB{}Z r{}, {}", if nonzero { "N" } else { "" }, low_reg(opcode, 0), AltHex::padded(target, 8));
    inst
}

fn extend(opcode: u16, address: u32) -> Instruction {
    let mut inst = Instruction::thumb(opcode, address, Kind::Extend);
    render!(
        inst,
        "{}XT{} r{}, r{}",
        if bit(opcode, 7) { 'U' } else { 'S' },
        if bit(opcode, 6) { 'B' } else { 'H' },
        low_reg(opcode, 0),
        low_reg(opcode, 3)
    );
    inst
}

/// LDM/STM with a low base register, and PUSH/POP which are full-descending on sp. `R` adds lr
/// to a push and pc to a pop.
fn load_store_multiple(opcode: u16, address: u32) -> Instruction {
    let load = bit(opcode, 11);
    let mut registers = opcode & 0xff;

    if opcode & 0xf000 == 0xc000 {
        let rn = low_reg(opcode, 8);
        // a load that includes the base register does not write it back
        let writeback = !(load && registers & (1 << rn) != 0);
        let (kind, mnemonic) = if load { (Kind::LDM, "LDM") } else { (Kind::STM, "STM") };

        let mut inst = Instruction::thumb(opcode, address, kind);
        inst.operands = Operands::LoadStoreMultiple(LoadStoreMultipleOperands {
            rn,
            registers,
            mode: AddressingMode::IA,
            writeback,
            user: false,
        });
        render!(
            inst,
            "{} r{}{}, {}",
            mnemonic, rn, if writeback { "!" } else { "" }, RegList(registers)
        );
        return inst;
    }

    let (kind, mnemonic, mode) = if load {
        if bit(opcode, 8) {
            registers |= 1 << 15;
        }
        (Kind::LDM, "POP", AddressingMode::IA)
    } else {
        if bit(opcode, 8) {
            registers |= 1 << 14;
        }
        (Kind::STM, "PUSH", AddressingMode::DB)
    };

    let mut inst = Instruction::thumb(opcode, address, kind);
    inst.operands = Operands::LoadStoreMultiple(LoadStoreMultipleOperands {
        rn: 13,
        registers,
        mode,
        writeback: true,
        user: false,
    });
    render!(inst, "{} {}", mnemonic, RegList(registers));
    inst
}

fn change_processor_state(opcode: u16, address: u32) -> Instruction {
    if opcode & 0x0ff0 == 0x0650 {
        let mut inst = Instruction::thumb(opcode, address, Kind::SETEND);
        render!(inst, "SETEND {}", if bit(opcode, 3) { "BE" } else { "LE" });
        return inst;
    }
    if opcode & 0x0fe0 != 0x0660 {
        return undefined(opcode, address);
    }

    let mut inst = Instruction::thumb(opcode, address, Kind::CPS);
    render!(
        inst,
        "CPSI{} {}{}{}",
        if bit(opcode, 4) { 'D' } else { 'E' },
        if bit(opcode, 2) { "A" } else { "" },
        if bit(opcode, 1) { "I" } else { "" },
        if bit(opcode, 0) { "F" } else { "" }
    );
    inst
}

fn byte_reverse(opcode: u16, address: u32) -> Instruction {
    let suffix = match (opcode >> 6) & 0b11 {
        0b00 => "",
        0b01 => "16",
        // 0b10 is matched as undefined before this
        _ => "SH",
    };
    let mut inst = Instruction::thumb(opcode, address, Kind::ByteReverse);
    render!(inst, "REV{} r{}, r{}", suffix, low_reg(opcode, 0), low_reg(opcode, 3));
    inst
}

fn breakpoint(opcode: u16, address: u32) -> Instruction {
    let mut inst = Instruction::thumb(opcode, address, Kind::BKPT);
    render!(inst, "BKPT {}", AltHex::padded((opcode & 0xff) as u32, 2));
    inst
}

fn hint(opcode: u16, address: u32) -> Instruction {
    let name = match (opcode >> 4) & 0xf {
        0 => "NOP",
        1 => "YIELD",
        2 => "WFE",
        3 => "WFI",
        4 => "SEV",
        _ => "HINT (UNRECOGNIZED)",
    };
    let mut inst = Instruction::thumb(opcode, address, Kind::Hint);
    render!(inst, "{}", name);
    inst
}

/// `IT{x{y{z}}} <firstcond>`. each mask bit above the terminating 1 is `T` when it equals the low
/// bit of firstcond, `E` otherwise.
fn if_then(opcode: u16, address: u32) -> Instruction {
    let firstcond = ((opcode >> 4) & 0xf) as usize;
    let mask = opcode & 0xf;
    let then = (firstcond & 1) as u16;

    let slot = |n: u16| -> &'static str {
        // slot n exists when the terminating bit is below it
        if mask & ((1 << n) - 1) == 0 {
            ""
        } else if (mask >> n) & 1 == then {
            "T"
        } else {
            "E"
        }
    };
    let cond = match CONDITIONS[firstcond] {
        "" => "AL",
        cond => cond,
    };

    let mut inst = Instruction::thumb(opcode, address, Kind::IfThen);
    render!(inst, "IT{}{}{} {}", slot(3), slot(2), slot(1), cond);
    inst
}
