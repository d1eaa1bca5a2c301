use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use vtraffic::{convert_recording_file, ConvertOptions, TrafficHandler, VtrafficError};
use vtraffic_config::{json_schema, LogFormat, LoggingConfig, TrafficConfig};
use vtraffic_core::TimestampUtc;
use vtraffic_log::{SharedLogger, TracingLogger};
use vtraffic_routes::{load_runways, read_airways, read_runways, LoadReport, RunwayTable};
use vtraffic_script::{FlightKind, Script};
use vtraffic_sim::{
    anchor_script, simulate_script, PerformanceEnvelope, SimulatedTrack, SimulationSettings,
};

#[derive(Debug, Parser)]
#[command(
    name = "vtraffic",
    version,
    about = "Virtual traffic for a flight-simulator traffic plugin"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Link to the host simulator and serve traffic until Ctrl-C or link loss.
    Run(RunArgs),
    /// Fly one script offline and print its track as CSV.
    Simulate(SimulateArgs),
    /// Turn a recorded traffic log into a script next to it.
    Convert(ConvertArgs),
    Validate(ValidateArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Optional path to vtraffic YAML config")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Host simulator address; overrides link.host")]
    pub host: Option<IpAddr>,
    #[arg(long, help = "Total number of aircraft; overrides pool.total_aircraft")]
    pub aircraft: Option<usize>,
    #[arg(long, help = "Number of VFR aircraft; overrides pool.vfr_aircraft")]
    pub vfr: Option<usize>,
    #[arg(long, help = "Send AITFC lines to the legacy traffic port")]
    pub legacy: bool,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[arg(long, help = "Script file to fly")]
    pub script: PathBuf,
    #[arg(long, help = "Runway to start from, e.g. LSZH_RW14")]
    pub runway: Option<String>,
    #[arg(long, help = "Integration step in seconds")]
    pub step: Option<f64>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, help = "Output file path; defaults to stdout when omitted")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "Optional path to vtraffic YAML config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    #[arg(long, help = "Recorded AITFC/RTTFC log of one aircraft")]
    pub input: PathBuf,
    #[arg(long, help = "Fly recorded positions instead of relative legs")]
    pub absolute: bool,
    #[arg(long, help = "Keep messages flagged as on the ground")]
    pub ignore_airborne: bool,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValidationFormat {
    Script,
    Config,
    Airways,
    Runways,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long, value_enum)]
    pub format: ValidationFormat,
    #[arg(long, help = "Input file path; defaults to stdin when omitted")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ConfigCommand {
    /// Print the default configuration as YAML.
    Defaults,
    /// Print the JSON schema of the configuration document.
    Schema,
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    execute_command(cli.command)
}

fn execute_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Run(args) => run_link(args),
        Command::Simulate(args) => simulate(args),
        Command::Convert(args) => convert(args),
        Command::Validate(args) => {
            let text = read_input_text(args.input.as_deref())?;
            let summary = validate_text(&text, args.format)?;
            write_output_bytes(format!("{summary}\n").as_bytes(), None)
        }
        Command::Config(args) => {
            let text = render_config(args.command)?;
            write_output_bytes(text.as_bytes(), None)
        }
    }
}

fn run_link(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    init_tracing(config.logging);
    if args.legacy {
        config.link.legacy_traffic = true;
    }
    let host = args.host.unwrap_or(config.link.host);
    let total = args.aircraft.unwrap_or(config.pool.total_aircraft);
    let vfr = args.vfr.unwrap_or(config.pool.vfr_aircraft);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|source| CliError::Runtime { source })?;
    runtime.block_on(serve(config, host, total, vfr))
}

async fn serve(
    config: TrafficConfig,
    host: IpAddr,
    total: usize,
    vfr: usize,
) -> Result<(), CliError> {
    let mut handler = TrafficHandler::new(config, tracing_logger());
    if !handler.establish_link(host, total, vfr).await {
        return Err(CliError::Link(failure(&handler)));
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        () = handler.closed() => {}
    }

    let lost = handler.error().map(str::to_owned);
    handler.remove_link().await;
    match lost {
        Some(reason) => Err(CliError::LinkLost(reason)),
        None => Ok(()),
    }
}

fn failure(handler: &TrafficHandler) -> String {
    handler.error().unwrap_or("unknown failure").to_owned()
}

fn simulate(args: SimulateArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(config.logging);

    let script = Script::load(&args.script).map_err(VtrafficError::from)?;
    let runways = match script.descriptor().flight_kind {
        FlightKind::Runway | FlightKind::MsgRelative => {
            let path = config.data.dir.join(&config.data.runways_file);
            load_runways(&path).map_err(VtrafficError::from)?.0
        }
        FlightKind::Airway | FlightKind::MsgAbsolute => RunwayTable::new(),
    };

    let mut rng = seeded_rng(args.seed);
    let anchored = anchor_script(&script, &runways, args.runway.as_deref(), &mut rng)
        .map_err(VtrafficError::from)?;
    let settings = SimulationSettings {
        step_seconds: args
            .step
            .unwrap_or(SimulationSettings::default().step_seconds),
        ..SimulationSettings::default()
    };
    let track = fly(&anchored, settings)?;
    write_output_bytes(
        render_track_csv(&track, settings.start).as_bytes(),
        args.output.as_deref(),
    )
}

fn fly(script: &Script, settings: SimulationSettings) -> Result<SimulatedTrack, CliError> {
    let envelope = PerformanceEnvelope::for_aircraft_type(&script.descriptor().aircraft_type);
    simulate_script(script, envelope, settings, tracing_logger())
        .map_err(|error| CliError::Facade(error.into()))
}

/// One row per telemetry point, seconds counted from `start`.
#[must_use]
pub fn render_track_csv(track: &SimulatedTrack, start: TimestampUtc) -> String {
    let mut csv = String::from(
        "seconds,latitude,longitude,altitude_ft,vertical_rate_fpm,track_deg,ground_speed_kt,airborne\n",
    );
    for point in &track.points {
        // Writing into a String cannot fail.
        let _ = writeln!(
            csv,
            "{:.1},{:.6},{:.6},{:.0},{:.0},{:.1},{:.1},{}",
            point.timestamp.seconds_since(start),
            point.position.latitude(),
            point.position.longitude(),
            point.altitude_ft,
            point.vertical_rate_fpm,
            point.track_degrees,
            point.ground_speed_kt,
            u8::from(point.airborne)
        );
    }
    csv
}

fn convert(args: ConvertArgs) -> Result<(), CliError> {
    init_tracing(LoggingConfig::default());
    let options = ConvertOptions {
        absolute: args.absolute,
        ignore_airborne: args.ignore_airborne,
    };
    let mut rng = seeded_rng(args.seed);
    let (output, conversion) =
        convert_recording_file(&args.input, options, &mut rng).map_err(VtrafficError::from)?;

    let summary = format!(
        "converted {} messages ({} undecodable) into {} commands: {}\n",
        conversion.messages,
        conversion.undecodable,
        conversion.script.len(),
        output.display()
    );
    write_output_bytes(summary.as_bytes(), None)
}

/// Checks `text` as the given format and summarizes what was accepted.
pub fn validate_text(text: &str, format: ValidationFormat) -> Result<String, CliError> {
    ensure_non_empty(text)?;
    match format {
        ValidationFormat::Script => {
            let parsed = Script::parse_with_report(text).map_err(VtrafficError::from)?;
            let descriptor = parsed.script.descriptor();
            let mut summary = format!(
                "script ok: {} {} with {} commands",
                descriptor.aircraft_type,
                descriptor.flight_kind,
                parsed.script.len()
            );
            for skipped in &parsed.skipped {
                let _ = write!(
                    summary,
                    "\nline {}: skipped ({:?}): {}",
                    skipped.line, skipped.reason, skipped.text
                );
            }
            Ok(summary)
        }
        ValidationFormat::Config => {
            TrafficConfig::from_yaml(text).map_err(VtrafficError::from)?;
            Ok("config ok".to_owned())
        }
        ValidationFormat::Airways => {
            let (table, report) = read_airways(text.as_bytes()).map_err(VtrafficError::from)?;
            if table.is_empty() {
                return Err(CliError::EmptyTable { what: "airway" });
            }
            Ok(table_summary("airways", &report))
        }
        ValidationFormat::Runways => {
            let (table, report) = read_runways(text.as_bytes()).map_err(VtrafficError::from)?;
            if table.is_empty() {
                return Err(CliError::EmptyTable { what: "runway" });
            }
            Ok(table_summary("runways", &report))
        }
    }
}

fn table_summary(name: &str, report: &LoadReport) -> String {
    let mut summary = format!(
        "{name} ok: {} records, {} skipped",
        report.accepted,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        let _ = write!(summary, "\nline {}: {}", skipped.line, skipped.reason);
    }
    summary
}

pub fn render_config(command: ConfigCommand) -> Result<String, CliError> {
    match command {
        ConfigCommand::Defaults => TrafficConfig::default()
            .to_yaml()
            .map_err(|error| CliError::Facade(error.into())),
        ConfigCommand::Schema => {
            let mut text = serde_json::to_string_pretty(&json_schema())?;
            text.push('\n');
            Ok(text)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TrafficConfig, CliError> {
    match path {
        Some(path) => TrafficConfig::load(path).map_err(|error| CliError::Facade(error.into())),
        None => Ok(TrafficConfig::default()),
    }
}

fn init_tracing(logging: LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    // Only the first subscriber of the process is installed.
    let _ = match logging.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn tracing_logger() -> SharedLogger {
    Arc::new(TracingLogger::new())
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn ensure_non_empty(text: &str) -> Result<(), CliError> {
    if text.trim().is_empty() {
        return Err(CliError::EmptyInput);
    }

    Ok(())
}

fn read_input_text(input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::InputRead {
            path: path.display().to_string(),
            source,
        }),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| CliError::StdinRead { source })?;
            Ok(text)
        }
    }
}

fn write_output_bytes(payload: &[u8], output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, payload).map_err(|source| CliError::OutputWrite {
            path: path.display().to_string(),
            source,
        }),
        None => io::stdout()
            .write_all(payload)
            .map_err(|source| CliError::StdoutWrite { source }),
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Facade(#[from] VtrafficError),

    #[error("cannot establish link: {0}")]
    Link(String),

    #[error("link lost: {0}")]
    LinkLost(String),

    #[error("failed to start the async runtime: {source}")]
    Runtime { source: io::Error },

    #[error("{what} table holds no usable records")]
    EmptyTable { what: &'static str },

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read input file `{path}`: {source}")]
    InputRead { path: String, source: io::Error },

    #[error("failed to read stdin: {source}")]
    StdinRead { source: io::Error },

    #[error("input must not be empty")]
    EmptyInput,

    #[error("failed to write output file `{path}`: {source}")]
    OutputWrite { path: String, source: io::Error },

    #[error("failed to write stdout: {source}")]
    StdoutWrite { source: io::Error },
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        1
    }
}
