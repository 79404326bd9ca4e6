#![no_main]
use libfuzzer_sys::fuzz_target;
use pez::html::{load_reader, LoadOptions};
use pez::{EvaluationContext, NamespaceTable};

const PAGE: &[u8] = br#"<div xmlns:x="urn:x"><p class="a">text</p><x:item>one</x:item></div>"#;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    // First line is a namespace list, the rest an expression.
    let (namespaces, expression) = input.split_once('\n').unwrap_or(("", input));
    let Ok(table) = NamespaceTable::parse(namespaces) else {
        return;
    };
    if let Ok(tree) = load_reader(PAGE, "fuzz", &LoadOptions::default()) {
        let _ = EvaluationContext::new(&tree)
            .with_namespaces(&table)
            .evaluate(expression);
    }
});
