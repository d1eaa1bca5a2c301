use vtraffic_core::LatLon;
use vtraffic_wire::{
    decode_legacy_traffic, decode_traffic, decode_traffic_line, encode_legacy_traffic,
    encode_traffic, TrafficDecodeError, TrafficFormat, TrafficReport,
};

fn approx_equal(left: f64, right: f64, tolerance: f64) {
    assert!(
        (left - right).abs() <= tolerance,
        "left={left} right={right} tolerance={tolerance}"
    );
}

fn fleet() -> Vec<TrafficReport> {
    let aircraft = [
        ("000001", 47.4647, 8.5492, 1_450.4, 700.0, 92.04, 68.26, "YYY0001", "C172"),
        ("009999", 37.6153, -122.3899, 36_999.6, -1_250.0, 359.96, 481.94, "UAL9999", "B77W"),
        ("004203", -33.9461, 151.1772, 24_000.0, 0.0, 0.0, 300.0, "QFA4203", "A333"),
        ("000815", 64.1300, -21.9406, 5.2, 10.0, 180.54, 130.04, "ICE0815", "DH8D"),
    ];
    aircraft
        .into_iter()
        .enumerate()
        .map(|(index, (hex, lat, lon, alt, vs, trk, gs, callsign, kind))| TrafficReport {
            hex_id: hex.to_owned(),
            position: LatLon::new(lat, lon).expect("valid position"),
            altitude_ft: alt,
            vertical_rate_fpm: vs,
            airborne: true,
            track_degrees: trk,
            ground_speed_kt: gs,
            callsign: callsign.to_owned(),
            aircraft_type: kind.to_owned(),
            tail: format!("VX-{}", &hex[2..]),
            origin: "MSG_SPOS".to_owned(),
            destination: "MSG_EPOS".to_owned(),
            timestamp: 1_600_000_000 + index as i64 * 37,
        })
        .collect()
}

fn assert_same_within_precision(decoded: &TrafficReport, original: &TrafficReport) {
    assert_eq!(decoded.hex_id, original.hex_id);
    assert_eq!(decoded.callsign, original.callsign);
    assert_eq!(decoded.aircraft_type, original.aircraft_type);
    assert_eq!(decoded.tail, original.tail);
    assert_eq!(decoded.origin, original.origin);
    assert_eq!(decoded.destination, original.destination);
    assert_eq!(decoded.timestamp, original.timestamp);
    assert!(decoded.airborne);

    approx_equal(decoded.position.latitude(), original.position.latitude(), 1e-7);
    approx_equal(decoded.position.longitude(), original.position.longitude(), 1e-7);
    approx_equal(decoded.altitude_ft, original.altitude_ft, 0.5);
    approx_equal(decoded.vertical_rate_fpm, original.vertical_rate_fpm, 0.5);
    approx_equal(decoded.track_degrees, original.track_degrees, 0.05);
    approx_equal(decoded.ground_speed_kt, original.ground_speed_kt, 0.05);
}

#[test]
fn both_formats_decode_what_they_encode() {
    for report in fleet() {
        let decoded = decode_traffic(&encode_traffic(&report)).expect("RTTFC decodes");
        assert_same_within_precision(&decoded, &report);

        let decoded =
            decode_legacy_traffic(&encode_legacy_traffic(&report)).expect("AITFC decodes");
        assert_same_within_precision(&decoded, &report);
    }
}

#[test]
fn line_decoder_dispatches_on_tag() {
    let report = fleet().remove(1);

    let (format, _) = decode_traffic_line(&encode_traffic(&report)).expect("RTTFC line");
    assert_eq!(format, TrafficFormat::RealTraffic);

    let (format, _) = decode_traffic_line(&encode_legacy_traffic(&report)).expect("AITFC line");
    assert_eq!(format, TrafficFormat::Legacy);

    assert!(matches!(
        decode_traffic_line("XXTFC,1,2,3"),
        Err(TrafficDecodeError::UnexpectedTag { .. })
    ));
    assert!(matches!(
        decode_traffic_line(""),
        Err(TrafficDecodeError::UnexpectedTag { .. })
    ));
}

#[test]
fn recorded_lines_with_fractional_timestamps_are_accepted() {
    let line = "AITFC,4b1806,47.4512345,8.5612345,3500,-640,1,275.3,142.0,SWR15T,A20N,HB-JDB,LSZH,LSGG,1600000123.75\r\n";
    let report = decode_legacy_traffic(line).expect("recorded line decodes");
    assert_eq!(report.timestamp, 1_600_000_123);
    assert_eq!(report.destination, "LSGG");
    approx_equal(report.track_degrees, 275.3, 1e-9);
}

#[test]
fn negative_timestamps_and_out_of_range_positions_are_rejected() {
    let line = encode_legacy_traffic(&fleet()[0]).replace(",1600000000", ",-12");
    assert_eq!(
        decode_legacy_traffic(&line),
        Err(TrafficDecodeError::NonPositiveTimestamp(-12))
    );

    let line = encode_legacy_traffic(&fleet()[0]).replace(",47.4647000,", ",97.0,");
    assert!(matches!(
        decode_legacy_traffic(&line),
        Err(TrafficDecodeError::InvalidPosition(_))
    ));
}
