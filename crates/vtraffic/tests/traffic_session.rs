use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::time::{sleep, timeout};
use vtraffic::{SessionStats, TrafficHandler};
use vtraffic_config::TrafficConfig;
use vtraffic_core::LatLon;
use vtraffic_geo::distance_nm;
use vtraffic_log::{LogLevel, MemoryLogger};
use vtraffic_routes::{
    save_airways, save_runways, AirwayLayer, AirwaySegment, AirwayTable, RunwayRecord,
    RunwayTable, Waypoint,
};
use vtraffic_wire::{decode_legacy_traffic, decode_traffic};

const WAIT: Duration = Duration::from_secs(5);

fn position(latitude: f64, longitude: f64) -> LatLon {
    LatLon::new(latitude, longitude).expect("valid position")
}

fn waypoint(ident: &str, latitude: f64, longitude: f64) -> Waypoint {
    Waypoint::new(ident, "LS", position(latitude, longitude)).expect("valid waypoint")
}

fn write_tables(dir: &Path) {
    let tra = waypoint("TRA", 47.689444, 8.4375);
    let zue = waypoint("ZUE", 47.591667, 8.8175);
    let hoc = waypoint("HOC", 47.469722, 7.901111);

    let mut airways = AirwayTable::new();
    airways.insert(
        AirwaySegment::new(tra.clone(), zue, AirwayLayer::High, 24_500, 66_000, "UN871")
            .expect("valid segment"),
    );
    airways.insert(
        AirwaySegment::new(hoc, tra, AirwayLayer::Low, 3_000, 24_500, "A9-R34")
            .expect("valid segment"),
    );
    save_airways(&dir.join("my_awy.dat"), &airways).expect("save airways");

    let mut runways = RunwayTable::new();
    runways.insert(
        RunwayRecord::new(
            "LSZH",
            14,
            "",
            1_416.0,
            position(47.482, 8.535),
            position(47.463, 8.562),
        )
        .expect("valid runway"),
    );
    save_runways(&dir.join("my_rwy.dat"), &runways).expect("save runways");
}

fn link_message(latitude: f64, longitude: f64) -> String {
    format!(
        "Qs121=6747;289;5.449771266137578;37988724;501908;{};{}\n",
        latitude.to_radians(),
        longitude.to_radians()
    )
}

struct Plugin {
    host: TcpListener,
    traffic: UdpSocket,
    weather: UdpSocket,
}

impl Plugin {
    async fn start() -> Self {
        Self {
            host: TcpListener::bind("127.0.0.1:0").await.expect("bind host"),
            traffic: UdpSocket::bind("127.0.0.1:0").await.expect("bind traffic"),
            weather: UdpSocket::bind("127.0.0.1:0").await.expect("bind weather"),
        }
    }

    fn config(&self, data_dir: &Path) -> TrafficConfig {
        let mut config = TrafficConfig::default();
        config.data.dir = data_dir.to_path_buf();
        config.link.link_port = self.host.local_addr().expect("host address").port();
        config.link.traffic_port = self.traffic.local_addr().expect("traffic address").port();
        config.link.weather_port = self.weather.local_addr().expect("weather address").port();
        config.link.read_timeout = Duration::from_millis(200);
        config.pool.seed = Some(7);
        config
    }

    async fn accept(&self) -> TcpStream {
        let (stream, _) = timeout(WAIT, self.host.accept())
            .await
            .expect("handler should connect in time")
            .expect("accept");
        stream
    }
}

async fn receive(socket: &UdpSocket) -> String {
    let mut buffer = vec![0_u8; 2048];
    let (len, _) = timeout(WAIT, socket.recv_from(&mut buffer))
        .await
        .expect("datagram should arrive in time")
        .expect("receive datagram");
    String::from_utf8(buffer[..len].to_vec()).expect("datagrams are text")
}

async fn wait_for_stats(
    handler: &TrafficHandler,
    done: impl Fn(&SessionStats) -> bool,
) -> SessionStats {
    timeout(WAIT, async {
        loop {
            let stats = handler.stats();
            if done(&stats) {
                return stats;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("stats should settle in time")
}

#[tokio::test]
async fn one_host_position_drives_one_traffic_cycle() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tables(dir.path());
    let plugin = Plugin::start().await;
    let logger = Arc::new(MemoryLogger::new());

    let mut handler = TrafficHandler::new(plugin.config(dir.path()), logger.clone());
    assert!(handler.is_valid(), "{:?}", handler.error());
    assert!(logger.contains(LogLevel::Warn, "no VFR scripts"));

    assert!(
        handler
            .establish_link(IpAddr::V4(Ipv4Addr::LOCALHOST), 3, 0)
            .await
    );
    let mut host = plugin.accept().await;
    host.write_all(link_message(47.55, 8.6).as_bytes())
        .await
        .expect("send position");

    let weather = receive(&plugin.weather).await;
    assert!(weather.starts_with(r#"{"ICAO": "LSZH""#), "{weather}");

    let host_position = position(47.55, 8.6);
    for _ in 0..3 {
        let line = receive(&plugin.traffic).await;
        let report = decode_traffic(&line).expect("traffic line decodes");
        assert_eq!(report.hex_id.len(), 6);
        assert!(report.altitude_ft >= 3_000.0, "{line}");
        assert!(distance_nm(&host_position, &report.position) < 100.0, "{line}");
    }

    let stats = wait_for_stats(&handler, |stats| stats.ticks == 1).await;
    assert!(stats.running);
    assert_eq!(stats.live_aircraft, 3);
    assert_eq!(stats.ifr_aircraft, 3);
    assert_eq!(stats.vfr_aircraft, 0);
    assert_eq!(stats.datagrams_sent, 4);
    assert_eq!(stats.send_failures, 0);

    handler.remove_link().await;
    assert!(!handler.is_linked());
    assert!(handler.is_valid());
}

#[tokio::test]
async fn positions_inside_the_step_length_do_not_tick() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tables(dir.path());
    let plugin = Plugin::start().await;
    let mut config = plugin.config(dir.path());
    config.link.min_position_interval = Duration::ZERO;
    config.link.legacy_traffic = true;
    config.link.legacy_traffic_port = config.link.traffic_port;
    config.link.traffic_port = 1;

    let mut handler = TrafficHandler::new(config, vtraffic_log::noop());
    assert!(
        handler
            .establish_link(IpAddr::V4(Ipv4Addr::LOCALHOST), 2, 0)
            .await
    );
    let mut host = plugin.accept().await;
    let text = format!("{}{}", link_message(47.55, 8.6), link_message(47.56, 8.61));
    host.write_all(text.as_bytes()).await.expect("send positions");

    let line = receive(&plugin.traffic).await;
    decode_legacy_traffic(&line).expect("legacy traffic line decodes");

    let stats = wait_for_stats(&handler, |stats| stats.positions == 2).await;
    assert_eq!(stats.ticks, 1);

    handler.remove_link().await;
    handler.remove_link().await;
}

#[tokio::test]
async fn host_closing_the_link_ends_the_session() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tables(dir.path());
    let plugin = Plugin::start().await;

    let mut handler = TrafficHandler::new(plugin.config(dir.path()), vtraffic_log::noop());
    assert!(
        handler
            .establish_link(IpAddr::V4(Ipv4Addr::LOCALHOST), 2, 1)
            .await
    );
    drop(plugin.accept().await);

    timeout(WAIT, handler.closed())
        .await
        .expect("session should end once the host is gone");
    assert!(!handler.stats().running);
    assert!(!handler.is_valid());
    assert!(handler
        .error()
        .expect("error message")
        .contains("closed by host"));

    handler.remove_link().await;
    assert!(handler.link_status().is_none());
}

#[tokio::test]
async fn unreachable_host_leaves_the_handler_invalid() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tables(dir.path());
    let plugin = Plugin::start().await;
    let config = plugin.config(dir.path());
    drop(plugin);

    let mut handler = TrafficHandler::new(config, vtraffic_log::noop());
    assert!(
        !handler
            .establish_link(IpAddr::V4(Ipv4Addr::LOCALHOST), 2, 0)
            .await
    );
    assert!(!handler.is_valid());
    assert!(!handler.is_linked());
    assert!(handler.error().expect("error message").contains("127.0.0.1"));
}
