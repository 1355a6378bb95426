//! Tokenizer fuzz target: feed arbitrary text to every tokenizer entry point.
//! None of them may panic; each returns Ok or a TokenizeError.
//! Build with: cargo fuzz run tokenizer_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use diagramproto::{Field, PestTokenizer, Tokenizer};
#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let t = PestTokenizer;
    let _ = t.diagram(s);
    let _ = t.field_title(s);
    let _ = t.control_fields(s);
    let mut field = Field::new("F");
    let _ = t.field_body(&mut field, s);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run tokenizer_fuzz");
}
