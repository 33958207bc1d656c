#![no_main]
use libfuzzer_sys::fuzz_target;

use yaxpeax_arch::Decoder;

use std::fmt::Write;

fuzz_target!(|data: &[u8]| {

    let decoders = [
        yaxpeax_arm32::InstDecoder::arm(),
        yaxpeax_arm32::InstDecoder::thumb(),
    ];

    let mut inst = yaxpeax_arm32::Instruction::default();

    for decoder in decoders {
        let mut words = yaxpeax_arch::U8Reader::new(data);
        // decode as much of the input as there is, in both modes
        while let Ok(()) = decoder.decode_into(&mut inst, &mut words) {
            write!(&mut String::new(), "{}", inst).expect("formatting does not panic either");
            assert!(inst.text().len() <= yaxpeax_arm32::TEXT_CAPACITY);
        }
    }
});
