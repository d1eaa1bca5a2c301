use std::io::{self, Read};

use vtraffic_wire::{decode_traffic_line, encode_legacy_traffic, encode_traffic, TrafficFormat};

fn main() {
    let mut data = Vec::new();
    if io::stdin().read_to_end(&mut data).is_err() {
        return;
    }
    let text = String::from_utf8_lossy(&data);

    for line in text.lines() {
        let Ok((format, report)) = decode_traffic_line(line) else {
            continue;
        };
        let encoded = match format {
            TrafficFormat::RealTraffic => encode_traffic(&report),
            TrafficFormat::Legacy => encode_legacy_traffic(&report),
        };
        let _ = decode_traffic_line(&encoded);
    }
}
