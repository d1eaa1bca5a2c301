use vtraffic_sim::VirtualAircraft;
use vtraffic_wire::TrafficReport;

/// What the plugin is told about one live aircraft.
#[must_use]
pub fn traffic_report(aircraft: &VirtualAircraft) -> TrafficReport {
    let identity = aircraft.identity();
    let telemetry = aircraft.telemetry();
    TrafficReport {
        hex_id: identity.hex_id.clone(),
        position: telemetry.position,
        altitude_ft: telemetry.altitude_ft,
        vertical_rate_fpm: telemetry.vertical_rate_fpm,
        airborne: telemetry.airborne,
        track_degrees: telemetry.track_degrees,
        ground_speed_kt: telemetry.ground_speed_kt,
        callsign: identity.callsign.clone(),
        aircraft_type: identity.aircraft_type.clone(),
        tail: identity.tail.clone(),
        origin: identity.origin.clone(),
        destination: identity.destination.clone(),
        timestamp: i64::try_from(telemetry.timestamp.unix_seconds()).unwrap_or(i64::MAX),
    }
}
