use std::time::Duration;

use crate::{ConfigError, TrafficConfig};

pub(crate) fn validate(config: &TrafficConfig) -> Result<(), ConfigError> {
    config.pool.pool_config().validate()?;
    require_nonzero("pool.step_length", config.pool.step_length)?;
    require_nonzero("link.read_timeout", config.link.read_timeout)?;

    if config.link.position_queue_capacity == 0 {
        return Err(ConfigError::ZeroQueueCapacity);
    }

    let udp_ports = [
        ("link.traffic_port", config.link.traffic_port),
        ("link.legacy_traffic_port", config.link.legacy_traffic_port),
        ("link.weather_port", config.link.weather_port),
    ];
    for (index, &(first, port)) in udp_ports.iter().enumerate() {
        if let Some(&(second, _)) = udp_ports[index + 1..]
            .iter()
            .find(|&&(_, other)| other == port)
        {
            return Err(ConfigError::DuplicatePort {
                port,
                first,
                second,
            });
        }
    }

    for (field, value) in [
        ("data.airways_file", &config.data.airways_file),
        ("data.runways_file", &config.data.runways_file),
        ("data.scripts_dir", &config.data.scripts_dir),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::EmptyPath { field });
        }
    }

    Ok(())
}

fn require_nonzero(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vtraffic_sim::PoolError;

    use crate::{ConfigError, TrafficConfig};

    #[test]
    fn rejects_more_vfr_than_total() {
        let mut config = TrafficConfig::default();
        config.pool.total_aircraft = 3;
        config.pool.vfr_aircraft = 4;

        let error = config.validate().expect_err("vfr above total must fail");
        assert!(matches!(
            error,
            ConfigError::InvalidPool(PoolError::VfrExceedsTotal { vfr: 4, total: 3 })
        ));
    }

    #[test]
    fn rejects_zero_step_and_timeout() {
        let mut config = TrafficConfig::default();
        config.pool.step_length = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration {
                field: "pool.step_length"
            })
        ));

        let mut config = TrafficConfig::default();
        config.link.read_timeout = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration {
                field: "link.read_timeout"
            })
        ));
    }

    #[test]
    fn rejects_shared_udp_ports() {
        let mut config = TrafficConfig::default();
        config.link.weather_port = config.link.traffic_port;

        match config.validate().expect_err("duplicate port must fail") {
            ConfigError::DuplicatePort {
                port,
                first,
                second,
            } => {
                assert_eq!(port, 49005);
                assert_eq!(first, "link.traffic_port");
                assert_eq!(second, "link.weather_port");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_range_and_empty_queue() {
        let mut config = TrafficConfig::default();
        config.pool.range_nm = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPool(PoolError::InvalidRange { .. }))
        ));

        let mut config = TrafficConfig::default();
        config.link.position_queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroQueueCapacity)
        ));
    }
}
