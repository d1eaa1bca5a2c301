//! Orchestration of one traffic session.
//!
//! The host's position cadence drives the simulation: every position taken
//! from the link may trigger one pool cycle, throttled to the configured step
//! length. Failures are reported the way the plugin UI consumes them, as a
//! validity flag plus a message.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use vtraffic_config::TrafficConfig;
use vtraffic_log::{log_debug, log_error, log_info, log_warn, SharedLogger};
use vtraffic_net::{Broadcaster, LinkPosition, LinkPositions, LinkReceiver, LinkStatus};
use vtraffic_routes::RouteCatalog;
use vtraffic_script::{ScriptLibrary, ScriptLoadError};
use vtraffic_sim::{PoolConfig, TrafficPool};
use vtraffic_wire::{
    encode_legacy_traffic, encode_traffic, encode_weather, TrafficFormat, WeatherReport,
};

use crate::report::traffic_report;
use crate::HandlerError;

/// Counters of the running session, refreshed after every position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub running: bool,
    pub positions: u64,
    pub ticks: u64,
    pub live_aircraft: usize,
    pub ifr_aircraft: usize,
    pub vfr_aircraft: usize,
    pub datagrams_sent: u64,
    pub send_failures: u64,
}

pub struct TrafficHandler {
    config: TrafficConfig,
    catalog: Option<Arc<RouteCatalog>>,
    library: Arc<ScriptLibrary>,
    logger: SharedLogger,
    error: Option<String>,
    session: Option<Session>,
}

struct Session {
    link: LinkReceiver,
    stop: watch::Sender<bool>,
    stats: watch::Receiver<SessionStats>,
    task: JoinHandle<()>,
}

impl TrafficHandler {
    /// Loads the route tables and the VFR scripts named by `config.data`.
    ///
    /// Missing or empty route tables leave the handler invalid. A missing
    /// script folder only costs the VFR traffic.
    pub fn new(config: TrafficConfig, logger: SharedLogger) -> Self {
        let data = &config.data;
        let catalog = RouteCatalog::load(&data.dir, &data.airways_file, &data.runways_file);
        let library = load_library(&data.scripts_path(), &logger);

        match catalog {
            Ok((catalog, airways, runways)) => {
                log_info!(
                    logger,
                    "loaded {} airways ({} skipped) and {} runways ({} skipped)",
                    airways.accepted,
                    airways.skipped.len(),
                    runways.accepted,
                    runways.skipped.len()
                );
                Self::from_parts(config, Arc::new(catalog), Arc::new(library), logger)
            }
            Err(error) => {
                let error = HandlerError::Routes(error);
                log_error!(logger, "{error}");
                Self {
                    config,
                    catalog: None,
                    library: Arc::new(library),
                    logger,
                    error: Some(error.to_string()),
                    session: None,
                }
            }
        }
    }

    pub fn from_parts(
        config: TrafficConfig,
        catalog: Arc<RouteCatalog>,
        library: Arc<ScriptLibrary>,
        logger: SharedLogger,
    ) -> Self {
        Self {
            config,
            catalog: Some(catalog),
            library,
            logger,
            error: None,
            session: None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Message of the last failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.session.is_some()
    }

    /// State of the current link; `None` without one.
    #[must_use]
    pub fn link_status(&self) -> Option<LinkStatus> {
        self.session.as_ref().map(|session| session.link.status())
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.session
            .as_ref()
            .map(|session| *session.stats.borrow())
            .unwrap_or_default()
    }

    /// Replaces any current link with a new one to `host`.
    ///
    /// Returns false when any step fails; [`Self::error`] then names the
    /// deepest failure.
    pub async fn establish_link(
        &mut self,
        host: IpAddr,
        total_aircraft: usize,
        vfr_aircraft: usize,
    ) -> bool {
        self.remove_link().await;
        let Some(catalog) = self.catalog.clone() else {
            log_warn!(self.logger, "no route tables, refusing to link");
            return false;
        };

        self.config.link.host = host;
        self.config.pool.total_aircraft = total_aircraft;
        self.config.pool.vfr_aircraft = vfr_aircraft;

        match self.start_session(catalog).await {
            Ok(session) => {
                self.error = None;
                self.session = Some(session);
                true
            }
            Err(error) => {
                log_error!(self.logger, "cannot establish link: {error}");
                self.error = Some(error.to_string());
                false
            }
        }
    }

    /// Stops the session, disconnects and drops the pool. Calling it without
    /// a link is a no-op.
    pub async fn remove_link(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let _ = session.stop.send(true);
        session.link.disconnect().await;
        if let Err(error) = session.task.await {
            log_warn!(self.logger, "traffic session ended abnormally: {error}");
        }
        log_info!(self.logger, "link to {} removed", session.link.peer());
    }

    /// Waits until the session stops on its own, then records why.
    pub async fn closed(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let mut stats = session.stats.clone();
        // A dropped sender means the session task is gone as well.
        let _ = stats.wait_for(|stats| !stats.running).await;

        match session.link.status() {
            LinkStatus::Failed(reason) => {
                self.error = Some(format!("link to {} failed: {reason}", session.link.peer()));
            }
            LinkStatus::Closed => {
                self.error = Some(format!("link to {} closed by host", session.link.peer()));
            }
            LinkStatus::Connected | LinkStatus::Disconnected => {}
        }
    }

    async fn start_session(&self, catalog: Arc<RouteCatalog>) -> Result<Session, HandlerError> {
        self.config.validate()?;
        let link_settings = &self.config.link;

        let traffic = Broadcaster::bind(link_settings.traffic_addr()).await?;
        let weather = Broadcaster::bind(link_settings.weather_addr()).await?;
        let (link, positions) = LinkReceiver::connect(
            link_settings.link_addr(),
            link_settings.link_config(),
            self.logger.clone(),
        )
        .await?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let (stats_tx, stats_rx) = watch::channel(SessionStats {
            running: true,
            ..SessionStats::default()
        });

        let format = if link_settings.legacy_traffic {
            TrafficFormat::Legacy
        } else {
            TrafficFormat::RealTraffic
        };
        log_info!(
            self.logger,
            "sending {} traffic to {} and weather to {}",
            format.tag(),
            traffic.target(),
            weather.target()
        );

        let task = SessionTask {
            pool_config: self.config.pool.pool_config(),
            step_length: self.config.pool.step_length,
            seed: self.config.pool.seed,
            catalog,
            library: Arc::clone(&self.library),
            logger: self.logger.clone(),
            positions,
            stop: stop_rx,
            stats: stats_tx,
            traffic,
            weather,
            weather_report: WeatherReport::default(),
            format,
            pool: None,
            last_tick: None,
        };

        Ok(Session {
            link,
            stop: stop_tx,
            stats: stats_rx,
            task: tokio::spawn(task.run()),
        })
    }
}

fn load_library(dir: &Path, logger: &SharedLogger) -> ScriptLibrary {
    let library = match ScriptLibrary::load(dir) {
        Ok(library) => library,
        Err(error @ ScriptLoadError::FolderMissing { .. }) => {
            log_warn!(logger, "no VFR scripts: {error}");
            return ScriptLibrary::default();
        }
        Err(error) => {
            log_warn!(logger, "VFR scripts unavailable: {error}");
            return ScriptLibrary::default();
        }
    };

    for rejected in library.rejected() {
        log_warn!(
            logger,
            "rejected script {}: {}",
            rejected.path.display(),
            rejected.reason
        );
    }
    log_info!(logger, "loaded {} VFR scripts", library.len());
    library
}

/// Owns the pool; runs on its own task and reacts to link positions only.
struct SessionTask {
    pool_config: PoolConfig,
    step_length: Duration,
    seed: Option<u64>,
    catalog: Arc<RouteCatalog>,
    library: Arc<ScriptLibrary>,
    logger: SharedLogger,
    positions: LinkPositions,
    stop: watch::Receiver<bool>,
    stats: watch::Sender<SessionStats>,
    traffic: Broadcaster,
    weather: Broadcaster,
    weather_report: WeatherReport,
    format: TrafficFormat,
    pool: Option<TrafficPool<ChaCha8Rng>>,
    last_tick: Option<Instant>,
}

impl SessionTask {
    async fn run(mut self) {
        loop {
            if *self.stop.borrow() {
                break;
            }

            let update = tokio::select! {
                changed = self.stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                update = self.positions.recv() => update,
            };

            let Some(update) = update else {
                log_info!(self.logger, "link delivers no more positions");
                break;
            };
            if let Err(error) = self.on_position(update).await {
                log_error!(self.logger, "traffic session failed: {error}");
                break;
            }
        }

        self.stats.send_modify(|stats| stats.running = false);
        log_info!(self.logger, "traffic session stopped");
    }

    async fn on_position(&mut self, update: LinkPosition) -> Result<(), HandlerError> {
        self.stats.send_modify(|stats| stats.positions += 1);

        if self.pool.is_none() {
            let rng = match self.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            let pool = TrafficPool::new(
                self.pool_config,
                Arc::clone(&self.catalog),
                Arc::clone(&self.library),
                update.position,
                rng,
                self.logger.clone(),
            )?;
            log_info!(self.logger, "traffic pool started at {}", update.position);
            self.pool = Some(pool);
        }

        let due = self
            .last_tick
            .is_none_or(|last| last.elapsed() >= self.step_length);
        if !due {
            return Ok(());
        }
        self.last_tick = Some(Instant::now());
        self.tick(update).await;
        Ok(())
    }

    async fn tick(&mut self, update: LinkPosition) {
        let weather = encode_weather(&self.weather_report);
        self.send(&self.weather, &weather).await;

        let format = self.format;
        let Some(pool) = self.pool.as_mut() else {
            return;
        };
        pool.regenerate(update.received_at);
        pool.update(update.received_at);
        let lines: Vec<String> = pool
            .aircraft()
            .iter()
            .map(|aircraft| {
                let report = traffic_report(aircraft);
                match format {
                    TrafficFormat::RealTraffic => encode_traffic(&report),
                    TrafficFormat::Legacy => encode_legacy_traffic(&report),
                }
            })
            .collect();
        if pool.refresh_selection(update.position) {
            log_debug!(self.logger, "route selection moved to {}", update.position);
        }
        let (live, ifr, vfr) = (pool.len(), pool.ifr_count(), pool.vfr_count());

        for line in &lines {
            self.send(&self.traffic, line).await;
        }

        self.stats.send_modify(|stats| {
            stats.ticks += 1;
            stats.live_aircraft = live;
            stats.ifr_aircraft = ifr;
            stats.vfr_aircraft = vfr;
        });
    }

    async fn send(&self, broadcaster: &Broadcaster, payload: &str) {
        match broadcaster.send(payload).await {
            Ok(()) => self.stats.send_modify(|stats| stats.datagrams_sent += 1),
            Err(error) => {
                log_warn!(self.logger, "{error}");
                self.stats.send_modify(|stats| stats.send_failures += 1);
            }
        }
    }
}
