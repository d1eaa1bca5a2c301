use std::io::{self, Read};

use vtraffic_script::Script;

fn main() {
    let mut data = Vec::new();
    if io::stdin().read_to_end(&mut data).is_err() {
        return;
    }
    let text = String::from_utf8_lossy(&data);

    let Ok(parsed) = Script::parse_with_report(&text) else {
        return;
    };
    let _ = Script::parse(&parsed.script.to_text());
}
