use std::io::{self, Read};

use vtraffic_wire::{scan_link_buffer, LinkScan};

fn main() {
    let mut data = Vec::new();
    if io::stdin().read_to_end(&mut data).is_err() {
        return;
    }
    let mut pending = String::from_utf8_lossy(&data).into_owned();

    loop {
        let consumed = match scan_link_buffer(&pending) {
            LinkScan::Position { position, consumed } => {
                assert!(position.latitude().is_finite() && position.longitude().is_finite());
                consumed
            }
            LinkScan::Malformed { consumed } => consumed,
            LinkScan::Incomplete { discard } if discard > 0 => discard,
            LinkScan::Incomplete { .. } | LinkScan::NotFound => break,
        };
        assert!(consumed > 0 && consumed <= pending.len());
        pending.drain(..consumed);
    }
}
