use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vtraffic_core::LatLon;
use vtraffic_wire::{
    decode_traffic_line, encode_legacy_traffic, encode_traffic, scan_link_buffer, TrafficReport,
};

fn fleet() -> Vec<TrafficReport> {
    (0..50)
        .map(|index| TrafficReport {
            hex_id: format!("{:06}", 1_000 + index),
            position: LatLon::new(47.0 + f64::from(index) * 0.01, 8.0 + f64::from(index) * 0.02)
                .expect("valid position"),
            altitude_ft: 3_000.0 + f64::from(index) * 500.0,
            vertical_rate_fpm: if index % 3 == 0 { -800.0 } else { 0.0 },
            airborne: true,
            track_degrees: f64::from(index * 7 % 360),
            ground_speed_kt: 180.0 + f64::from(index),
            callsign: format!("SWR{:04}", 1_000 + index),
            aircraft_type: "A320".to_owned(),
            tail: format!("VX-{:04}", 1_000 + index),
            origin: "TRASA".to_owned(),
            destination: "GERSA".to_owned(),
            timestamp: 1_700_000_000 + i64::from(index),
        })
        .collect()
}

fn bench_traffic_encode(criterion: &mut Criterion) {
    let reports = fleet();
    let lines: Vec<String> = reports.iter().map(encode_traffic).collect();
    let link_text = "noise;Qs121=6747;289;5.449771266137578;37988724;501908;0.6564195830703577;-2.1443275933742236\n";

    let mut group = criterion.benchmark_group("traffic_encode");
    group.bench_function("encode_fleet_rttfc", |bench| {
        bench.iter(|| {
            for report in &reports {
                black_box(encode_traffic(report));
            }
        });
    });
    group.bench_function("encode_fleet_aitfc", |bench| {
        bench.iter(|| {
            for report in &reports {
                black_box(encode_legacy_traffic(report));
            }
        });
    });
    group.bench_function("decode_fleet", |bench| {
        bench.iter(|| {
            for line in &lines {
                black_box(decode_traffic_line(line).expect("line decodes"));
            }
        });
    });
    group.bench_function("scan_link_message", |bench| {
        bench.iter(|| black_box(scan_link_buffer(black_box(link_text))));
    });
    group.finish();
}

criterion_group!(benches, bench_traffic_encode);
criterion_main!(benches);
