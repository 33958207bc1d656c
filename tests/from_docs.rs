use pretty_assertions::assert_eq;
use yaxpeax_arch::Decoder;

use yaxpeax_arm32::InstDecoder;

// encodings are worked out by hand from the ARM architecture reference manual (ARMv6 edition,
// A3/A4 for ARM and A6/A7 for Thumb). every instruction is decoded at 0x8000.

const BASE: u32 = 0x8000;

fn test_display(decoder: InstDecoder, bytes: &[u8], text: &str) {
    let inst = decoder.with_base(BASE).decode(&mut yaxpeax_arch::U8Reader::new(bytes)).expect("decode succeeds");
    let rendered = format!("{}", inst);
    assert_eq!(rendered, text);
}

fn test_arm(word: u32, asm: &str) {
    let text = format!("0x{:08x} 0x{:08x}    {}", BASE, word, asm);
    test_display(InstDecoder::arm(), &word.to_le_bytes(), &text);
}

fn test_thumb(half: u16, asm: &str) {
    let text = format!("0x{:08x} 0x{:04x}    {}", BASE, half, asm);
    test_display(InstDecoder::thumb(), &half.to_le_bytes(), &text);
}

#[test]
fn arm_data_processing() {
    test_arm(0xe1a00000, "NOP");
    test_arm(0xe3a00001, "MOV r0, #0x1");
    test_arm(0xe0811002, "ADD r1, r1, r2");
    test_arm(0xe0900001, "ADDS r0, r0, r1");
    test_arm(0xe2811c01, "ADD r1, r1, #0x100");
    test_arm(0xe3520000, "CMP r2, #0x0");
    test_arm(0xe1a01102, "MOV r1, r2, LSL #0x2");
    test_arm(0xe1a00062, "MOV r0, r2, RRX");
    test_arm(0xe1a00312, "MOV r0, r2, LSL r3");
    test_arm(0xe1a00022, "MOV r0, r2, LSR #0x20");
    test_arm(0x01a00001, "MOVEQ r0, r1");
    test_arm(0x10811002, "ADDNE r1, r1, r2");
}

#[test]
fn arm_branches() {
    test_arm(0xeafffffe, "B 0x00008000");
    test_arm(0xeb000000, "BL 0x00008008");
    test_arm(0x0a000010, "BEQ 0x00008048");
    test_arm(0xfa000000, "BLX 0x00008008");
    test_arm(0xfb000000, "BLX 0x0000800a");
    test_arm(0xe12fff1e, "BX r14");
    test_arm(0xe12fff33, "BLX r3");
    test_arm(0xe12fff20, "BXJ r0");
}

#[test]
fn arm_load_store() {
    test_arm(0xe5912004, "LDR r2, [r1, #0x4]");
    test_arm(0xe5912000, "LDR r2, [r1]");
    test_arm(0xe5312004, "LDR r2, [r1, #-0x4]!");
    test_arm(0xe4912004, "LDR r2, [r1], #0x4");
    test_arm(0xe4b12004, "LDRT r2, [r1], #0x4");
    test_arm(0xe5c12000, "STRB r2, [r1]");
    test_arm(0xe7912103, "LDR r2, [r1, r3, LSL #0x2]");
    test_arm(0xe1d010b2, "LDRH r1, [r0, #0x2]");
    test_arm(0xe19120b3, "LDRH r2, [r1, r3]");
    test_arm(0xe1c020f0, "STRD r2, [r0, #0x0]");
    test_arm(0xe8bd8010, "LDM r13!, {r4, r15}");
    test_arm(0xe92d4010, "STMDB r13!, {r4, r14}");
    test_arm(0xe8d00003, "LDM r0, {r0, r1}^");
    test_arm(0xf5d1f010, "PLD [r1, #0x10]");
}

#[test]
fn arm_multiplies() {
    test_arm(0xe0000291, "MUL r0, r1, r2");
    test_arm(0xe0203291, "MLA r0, r1, r2, r3");
    test_arm(0xe0810392, "UMULL r0, r1, r2, r3");
    test_arm(0xe0c10392, "SMULL r0, r1, r2, r3");
    test_arm(0xe1000281, "SMLABB r0, r1, r2, r0");
    test_arm(0xe1600281, "SMULBB r0, r1, r2");
    test_arm(0xe16002a1, "SMULTB r0, r1, r2");
    test_arm(0xe12002a1, "SMULWB r0, r1, r2");
    test_arm(0xe1203281, "SMLAWB r0, r1, r2, r3");
    test_arm(0xe1410382, "SMLALBB r0, r1, r2, r3");
    test_arm(0xe0432291, "UMAAL r2, r3, r1, r2");
    test_arm(0x00432291, "UMAALEQ r2, r3, r1, r2");
}

#[test]
fn arm_miscellaneous() {
    test_arm(0xe1020091, "SWP r0, r1, [r2]");
    test_arm(0xe1420091, "SWPB r0, r1, [r2]");
    test_arm(0xe10f0000, "MRS r0, CPSR");
    test_arm(0xe129f000, "MSR CPSR_cf, r0");
    test_arm(0xe328f00f, "MSR CPSR_f, 0x0000000f");
    test_arm(0xe321f4ff, "MSR CPSR_c, 0xff000000");
    test_arm(0xe16f0f11, "CLZ r0, r1");
    test_arm(0xe1020051, "QADD r0, r1, r2");
    test_arm(0xe1620051, "QDSUB r0, r1, r2");
    test_arm(0xe1212374, "BKPT 0x1234");
    test_arm(0xef000011, "SVC 0x000011");
    test_arm(0x0f000001, "SVCEQ 0x000001");
    test_arm(0xef000000, "SVC 000000");
    test_arm(0xf96d0513, "SRSDB SP!, #19");
    test_arm(0xf8bd0a00, "RFE r13!");
}

#[test]
fn arm_coprocessor() {
    test_arm(0xee070f15, "MCR p15, 0x00, r0, c7, c5, 0x00");
    test_arm(0xee110f10, "MRC p15, 0x00, r0, c1, c0, 0x00");
    test_arm(0xfe070f15, "MCR2 p15, 0x00, r0, c7, c5, 0x00");
    test_arm(0xee012003, "CDP p0, 0x00, c2, c1, c3, 0x00");
    test_arm(0xed9f0a02, "LDC p10, c0, [r15, #8]");
    test_arm(0xed201a04, "STC p10, c1, [r0, #-16]!");
    test_arm(0xec900a05, "LDC p10, c0, [r0], {5}");
    test_arm(0xec410b12, "MCRR p11, 1, r0, r1, c2");
    test_arm(0xec510b12, "MRRC p11, 1, r0, r1, c2");
}

#[test]
fn arm_media() {
    test_arm(0xe6bf0f31, "REV r0, r1");
    test_arm(0xe6bf0fb1, "REV16 r0, r1");
    test_arm(0xe6ff0fb1, "REVSH r0, r1");
    test_arm(0xe6810fb2, "SEL r0, r1, r2");
    test_arm(0xe6ef0071, "UXTB r0, r1");
    test_arm(0xe6bf0071, "SXTH r0, r1");
    test_arm(0xe6e10472, "UXTAB r0, r1, r2, ROR #8");
    test_arm(0xe6110f12, "SADD16 r0, r1, r2");
    test_arm(0xe6610ff2, "UQSUB8 r0, r1, r2");
    test_arm(0xe6810212, "PKHBT r0, r1, r2, LSL #4");
    test_arm(0xe6a70011, "SSAT r0, #8, r1, LSL #0");
    test_arm(0xe6e70011, "USAT r0, #7, r1, LSL #0");
    test_arm(0xe6a70f31, "SSAT16 r0, #8, r1");
    test_arm(0xe700f211, "SMUAD r0, r1, r2");
    test_arm(0xe7003211, "SMLAD r0, r1, r2, r3");
    test_arm(0xe750f211, "SMMUL r0, r1, r2");
    test_arm(0xe75032d1, "SMMLS r0, r1, r2, r3");
    test_arm(0xe780f211, "USAD8 r0, r1, r2");
}

#[test]
fn arm_undefined() {
    test_arm(0xe7f000f0, "UNDEFINED INSTRUCTION");
    test_arm(0xe3000000, "UNDEFINED INSTRUCTION");
    test_arm(0xff000000, "UNDEFINED INSTRUCTION");
    test_arm(0xe1000010, "UNDEFINED INSTRUCTION");
    // bits 22:21 = 11 in the multiply space, MLS from later architectures
    test_arm(0xe0632291, "UNDEFINED INSTRUCTION");
    // coprocessor load/store with P, U and W all clear
    test_arm(0xec000000, "UNDEFINED INSTRUCTION");
    test_arm(0xfc100000, "UNDEFINED INSTRUCTION");
}

#[test]
fn thumb_arithmetic() {
    test_thumb(0x0088, "LSLS r0, r1, #0x02");
    test_thumb(0x0008, "LSLS r0, r1, #00");
    test_thumb(0x0808, "LSRS r0, r1, #0x20");
    test_thumb(0x1888, "ADDS r0, r1, r2");
    test_thumb(0x1e48, "SUBS r0, r1, #1");
    test_thumb(0x2001, "MOVS r0, #0x01");
    test_thumb(0x2000, "MOVS r0, #00");
    test_thumb(0x2aff, "CMP r2, #0xff");
    test_thumb(0x4008, "ANDS r0, r1");
    test_thumb(0x4248, "RSBS r0, r1, #0");
    test_thumb(0x4348, "MULS r0, r1");
    test_thumb(0x4468, "ADD r0, r13");
    test_thumb(0x46c0, "NOP ; (MOV r8, r8)");
    test_thumb(0xa801, "ADD r0, SP, #0x4");
    test_thumb(0xa001, "ADD r0, PC, #0x4");
    test_thumb(0xb082, "SUB SP, #0x8");
    test_thumb(0xb002, "ADD SP, #0x8");
    test_thumb(0xb2c8, "UXTB r0, r1");
    test_thumb(0xb208, "SXTH r0, r1");
    test_thumb(0xba08, "REV r0, r1");
    test_thumb(0xba48, "REV16 r0, r1");
    test_thumb(0xbac8, "REVSH r0, r1");
}

#[test]
fn thumb_load_store() {
    test_thumb(0x4801, "LDR r0, [pc, #0x4] ; 0x008008");
    test_thumb(0x5888, "LDR r0, [r1, r2]");
    test_thumb(0x6848, "LDR r0, [r1, #0x4]");
    test_thumb(0x7008, "STRB r0, [r1, #0]");
    test_thumb(0x8848, "LDRH r0, [r1, #0x2]");
    test_thumb(0x9801, "LDR r0, [SP, #0x4]");
    test_thumb(0xb510, "PUSH {r4, r14}");
    test_thumb(0xbd10, "POP {r4, r15}");
    test_thumb(0xc803, "LDM r0, {r0, r1}");
    test_thumb(0xc90c, "LDM r1!, {r2, r3}");
    test_thumb(0xc003, "STM r0!, {r0, r1}");
}

#[test]
fn thumb_branches() {
    test_thumb(0x4770, "BX r14");
    test_thumb(0x4780, "BLX r0");
    test_thumb(0xd0fe, "BEQ 0x008000");
    test_thumb(0xdf05, "SVC 0x5");
    test_thumb(0xe7fe, "B 0x008000");
    test_thumb(0xf000, "prefix 00000000");
    test_thumb(0xf7ff, "prefix 0xfffff000");
    test_thumb(0xf800, "BL 0x008004");
    test_thumb(0xf801, "BL 0x008006");
    test_thumb(0xe800, "BLX 0x008004");
    test_thumb(0xb108, "CBZ r0, 0x008006");
    test_thumb(0xb909, "CBNZ r1, 0x008006");
    test_thumb(0xbb08, "CBNZ r0, 0x008046");
}

#[test]
fn thumb_miscellaneous() {
    test_thumb(0xb662, "CPSIE I");
    test_thumb(0xb672, "CPSID I");
    test_thumb(0xb658, "SETEND BE");
    test_thumb(0xb650, "SETEND LE");
    test_thumb(0xbe01, "BKPT 0x1");
    test_thumb(0xdf00, "SVC 00");
    test_thumb(0xbf00, "NOP");
    test_thumb(0xbf10, "YIELD");
    test_thumb(0xbf20, "WFE");
    test_thumb(0xbf30, "WFI");
    test_thumb(0xbf40, "SEV");
    test_thumb(0xbf50, "HINT (UNRECOGNIZED)");
    test_thumb(0xbf0c, "ITE EQ");
}

#[test]
fn thumb_undefined() {
    test_thumb(0x4771, "UNDEFINED INSTRUCTION");
    test_thumb(0xde00, "UNDEFINED INSTRUCTION");
    test_thumb(0xe801, "UNDEFINED INSTRUCTION");
    test_thumb(0xba88, "UNDEFINED INSTRUCTION");
    test_thumb(0xb800, "UNDEFINED INSTRUCTION");
}
