#![no_main]
use ir::FileIR;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(fir) = parsers::parse_source("fuzz.php", data, None) {
        check(&fir);
    }
});

fn check(fir: &FileIR) {
    for hook in &fir.hooks {
        assert!(hook.hook_name.starts_with("wp_ajax_"));
    }
    for decl in &fir.declarations {
        assert!(decl.body.end <= fir.tokens.len());
        assert!(decl.span.start <= decl.body.start && decl.span.end <= fir.tokens.len());
        let _ = fir.text(decl.body);
        let _ = fir.text(decl.span);
    }
}
