/// Weather the plugin is told about. Nothing is modelled; the defaults are
/// what every tick sends.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub icao: String,
    pub qnh_hpa: u32,
    pub metar: String,
    pub name: String,
    pub iata: String,
    pub distance_nm: u32,
}

impl Default for WeatherReport {
    fn default() -> Self {
        Self {
            icao: "LSZH".to_owned(),
            qnh_hpa: 1013,
            metar: String::new(),
            name: "ZURICH".to_owned(),
            iata: "ZRH".to_owned(),
            distance_nm: 10,
        }
    }
}

/// Renders the report in the exact spacing the plugin has always received.
#[must_use]
pub fn encode_weather(report: &WeatherReport) -> String {
    format!(
        "{{\"ICAO\": \"{}\",\"QNH\": {}, \"METAR\": \"{}\", \"NAME\": \"{}\", \"IATA\": \"{}\" , \"DISTNM\": {}}}",
        quoted(&report.icao),
        report.qnh_hpa,
        quoted(&report.metar),
        quoted(&report.name),
        quoted(&report.iata),
        report.distance_nm
    )
}

fn quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
