#![no_main]
use libfuzzer_sys::fuzz_target;
use pez::html::{load_reader, LoadOptions};
use pez::output::{print_result, PrintOptions};
use pez::xpath::EvaluationContext;

fuzz_target!(|data: &[u8]| {
    // Loading arbitrary bytes and printing the whole tree should never panic.
    if let Ok(tree) = load_reader(data, "fuzz", &LoadOptions::default()) {
        if let Ok(result) = EvaluationContext::new(&tree).evaluate("//*") {
            let _ = print_result(&result, &mut std::io::sink(), &PrintOptions::default());
        }
    }
});
