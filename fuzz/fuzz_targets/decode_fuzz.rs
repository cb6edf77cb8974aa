#![no_main]
use bvdf::appinfo::{self, DecodeOptions, MAGIC_V27, MAGIC_V28, MAGIC_V29};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz the decoder with arbitrary bytes.
    // The decoder must never panic; it may only return errors.
    let _ = appinfo::decode(data);

    // Random bytes almost never hit a valid magic, so also try each revision
    // with the input as the body.
    if let Some((&selector, body)) = data.split_first() {
        let magic = [MAGIC_V27, MAGIC_V28, MAGIC_V29][usize::from(selector % 3)];
        let mut buf = magic.to_le_bytes().to_vec();
        buf.extend_from_slice(body);
        let _ = appinfo::decode_with(&buf, &DecodeOptions { max_depth: Some(64) });
    }
});
