#![no_main]
use libfuzzer_sys::fuzz_target;
use parsers::php::tokenize;

fuzz_target!(|data: &[u8]| {
    let source = String::from_utf8_lossy(data);
    let lexed = tokenize(&source);
    let mut cursor = 0;
    for tok in &lexed.tokens {
        assert!(tok.offset >= cursor);
        assert_eq!(&source[tok.offset..tok.end()], tok.text);
        cursor = tok.end();
    }
});
