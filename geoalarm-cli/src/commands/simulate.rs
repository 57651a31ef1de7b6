//! Simulate command - replay a track against a destination.
//!
//! Feeds a recorded list of positions through a [`SimulatedPositionSource`]
//! and prints every snapshot in which the position or alarm state changed.
//! Stops when the track has been replayed or on Ctrl-C.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use tokio::sync::mpsc;

use geoalarm::alarm::{clamp_radius, AlarmState};
use geoalarm::config::ConfigFile;
use geoalarm::coord::{Coordinate, Location};
use geoalarm::position::{SimulatedPositionSource, DEFAULT_REPLAY_INTERVAL};
use geoalarm::session::{SessionController, SessionSnapshot};

use crate::error::CliError;
use crate::sink::TerminalSink;

/// Arguments for the simulate command.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Destination as LAT,LNG
    #[arg(long, allow_hyphen_values = true, value_name = "LAT,LNG")]
    pub destination: Coordinate,

    /// Alarm radius in kilometers (default from config)
    #[arg(long)]
    pub radius: Option<f64>,

    /// Delay between replayed fixes in milliseconds [default: 1000]
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Dismiss the alarm as soon as it fires
    #[arg(long)]
    pub auto_dismiss: bool,

    /// File with one LAT,LNG fix per line (# starts a comment)
    #[arg(long, conflicts_with = "fix", required_unless_present = "fix")]
    pub track: Option<PathBuf>,

    /// A single fix as LAT,LNG (repeatable)
    #[arg(long, allow_hyphen_values = true, value_name = "LAT,LNG")]
    pub fix: Vec<Coordinate>,

    /// Print snapshots as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Parse a track file body.
pub fn parse_track(text: &str) -> Result<Vec<Coordinate>, CliError> {
    let mut track = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let coordinate: Coordinate = line
            .parse()
            .map_err(|e| CliError::Track(format!("line {}: {}", index + 1, e)))?;
        track.push(coordinate);
    }
    Ok(track)
}

fn load_track(path: &Path) -> Result<Vec<Coordinate>, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Track(format!("{}: {}", path.display(), e)))?;
    parse_track(&text)
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let track = match &args.track {
        Some(path) => load_track(path)?,
        None => args.fix.clone(),
    };
    if track.is_empty() {
        return Err(CliError::Track("no fixes to replay".to_string()));
    }

    let config = ConfigFile::load()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    runtime.block_on(simulate(args, track, config))
}

async fn simulate(
    args: SimulateArgs,
    track: Vec<Coordinate>,
    config: ConfigFile,
) -> Result<(), CliError> {
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_REPLAY_INTERVAL);
    let source = Arc::new(SimulatedPositionSource::new(track, interval));
    let replay_time = source.duration() + interval;
    let radius = args.radius.map(clamp_radius).unwrap_or_else(|| config.radius());

    let controller = SessionController::builder()
        .with_config(&config)
        .with_radius(radius)
        .with_position_source(source.clone())
        .with_alarm_sink(Arc::new(TerminalSink::new(config.sound_config())))
        .build()?;

    if !args.json {
        println!("GeoAlarm Simulation");
        println!("===================");
        println!();
        println!("Destination: {}", args.destination);
        println!("Radius:      {}", radius);
        println!("Fixes:       {} every {} ms", source.len(), interval.as_millis());
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    if let Err(e) = controller.seed_initial_position().await {
        tracing::warn!(error = %e, "Starting without an initial position");
    }

    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let mut snapshots = controller.subscribe();
    controller.set_destination(Location::new(args.destination));
    controller.start_tracking()?;

    let mut printer = SnapshotPrinter::new(args.json);
    let initial = snapshots.borrow_and_update().clone();
    printer.print(&initial);

    let finished = tokio::time::sleep(replay_time);
    tokio::pin!(finished);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                printer.print(&snapshot);

                if args.auto_dismiss && snapshot.alarm_state == AlarmState::Triggered {
                    controller.dismiss_alarm()?;
                }
            }
            _ = &mut finished => {
                tracing::debug!("Track replay finished");
                break;
            }
            _ = shutdown_rx.recv() => {
                println!();
                println!("Received shutdown signal, stopping...");
                break;
            }
        }
    }

    controller.stop_tracking();

    let last = controller.snapshot();
    if !args.json {
        println!();
        println!("Session Summary");
        println!("───────────────");
        println!("  Final distance: {}", last.distance_display());
        println!("  Alarm fired:    {} time(s)", printer.triggers);
    }

    Ok(())
}

/// Prints snapshots whose position or alarm state changed.
struct SnapshotPrinter {
    json: bool,
    last: Option<(Option<Coordinate>, AlarmState)>,
    triggers: usize,
}

impl SnapshotPrinter {
    fn new(json: bool) -> Self {
        Self {
            json,
            last: None,
            triggers: 0,
        }
    }

    /// Returns whether the snapshot was printed.
    fn print(&mut self, snapshot: &SessionSnapshot) -> bool {
        let key = (
            snapshot.user_position.as_ref().map(|l| l.coordinate),
            snapshot.alarm_state,
        );
        if self.last == Some(key) {
            return false;
        }
        if snapshot.alarm_state == AlarmState::Triggered
            && self.last.map(|(_, state)| state) != Some(AlarmState::Triggered)
        {
            self.triggers += 1;
        }
        self.last = Some(key);

        if self.json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(error = %e, "Could not encode snapshot"),
            }
        } else {
            println!("{}", format_snapshot(snapshot));
        }
        true
    }
}

fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    let state = format!("{:<9}", snapshot.alarm_state.to_string());
    let state = match snapshot.alarm_state {
        AlarmState::Idle => style(state).dim(),
        AlarmState::Armed => style(state).cyan(),
        AlarmState::Triggered => style(state).red().bold(),
        AlarmState::Dismissed => style(state).yellow(),
    };
    let position = snapshot
        .user_position
        .as_ref()
        .map(|l| l.coordinate.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut line = format!(
        "[{}] {}  distance {} (radius {})",
        state,
        position,
        snapshot.distance_display(),
        snapshot.radius_display()
    );
    if let Some(e) = &snapshot.last_position_error {
        line.push_str(&format!("  position error: {}", e));
    }
    line
}
