use std::io::{self, Read};
use std::time::Duration;

use vtraffic_config::TrafficConfig;

fn main() {
    let mut data = Vec::new();
    let _ = io::stdin().read_to_end(&mut data);

    let mut config = TrafficConfig::default();

    if let Some(value) = as_u16(&data, 0) {
        config.link.link_port = value;
    }
    if let Some(value) = as_u16(&data, 2) {
        config.link.traffic_port = value;
    }
    if let Some(value) = as_u16(&data, 4) {
        config.link.weather_port = value;
    }
    if let Some(value) = as_u16(&data, 6) {
        config.link.position_queue_capacity = usize::from(value);
    }
    if let Some(value) = as_u16(&data, 8) {
        config.pool.total_aircraft = usize::from(value);
    }
    if let Some(value) = as_u16(&data, 10) {
        config.pool.vfr_aircraft = usize::from(value);
    }
    if let Some(value) = as_u16(&data, 12) {
        config.pool.range_nm = f64::from(value) / 4.0;
    }

    if let Some(value) = as_u16(&data, 14) {
        config.link.read_timeout = Duration::from_millis(u64::from(value));
    }
    if let Some(value) = as_u16(&data, 16) {
        config.link.min_position_interval = Duration::from_millis(u64::from(value));
    }
    if let Some(value) = as_u16(&data, 18) {
        config.pool.step_length = Duration::from_millis(u64::from(value));
    }

    let _ = config.validate();
}

fn as_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}
