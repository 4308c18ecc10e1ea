//! replay — drive a navigation session from a recorded GPS trace.
//!
//! Usage:
//!
//! ```text
//! replay [--trace trace.csv] [--config nav.toml] [--out ./replay_output]
//! replay --help
//! ```
//!
//! The trace CSV has the columns `t_ms,lon,lat,speed_mps` and an optional
//! `heading_deg`.  Without one a synthetic drive across downtown Mobile,
//! Alabama is used, with a detour that forces a recalculation.  Routes come from an offline straight-line
//! provider.  The trip log (`positions.csv`, `plans.csv`, `arrivals.csv`) and
//! the persisted plan (`plan.json`) land in the output directory.

mod directions;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use nav_core::{GeoPoint, ManualClock, NavConfig, PlanRevision, Timestamp};
use nav_route::{ArrivalSummary, DirectionsError, LocationFix, RoutePlan, RouteState, TrackedPosition, Transition};
use nav_session::{PlanSource, RecalcReason, SessionBuilder, SessionObserver, Trip};
use nav_store::{CsvTripLog, JsonFilePlanStore, TripLogObserver, TripLogWriter};

use directions::StraightLineDirections;


// ── Constants ─────────────────────────────────────────────────────────────────

const ORIGIN:         GeoPoint = GeoPoint { lon: -88.0600, lat: 30.6900 };
const DESTINATION:    GeoPoint = GeoPoint { lon: -88.0400, lat: 30.6900 };
const START_MS:       i64      = 1_700_000_000_000;
const FIX_PERIOD_MS:  i64      = 2_000;
const CRUISE_KMH:     f64      = 40.0;
const CONSUMPTION:    f64      = 12.5; // km per litre
/// Wall-clock pause after each fix so collaborator results land in order.
const PACE:           Duration = Duration::from_millis(15);

// ── Arguments ─────────────────────────────────────────────────────────────────

/// Replay a GPS trace through a navigation session.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV trace with columns `t_ms,lon,lat,speed_mps[,heading_deg]`;
    /// a synthetic drive is used when omitted.
    #[arg(long)]
    trace:  Option<PathBuf>,
    /// TOML file with `NavConfig` overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for the trip log and the persisted plan.
    #[arg(long, default_value = "./replay_output")]
    out:    PathBuf,
}

fn load_config(path: Option<&Path>) -> Result<NavConfig> {
    let Some(path) = path else {
        return Ok(NavConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: NavConfig = toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

// ── Trace ─────────────────────────────────────────────────────────────────────

fn load_trace(path: &Path) -> Result<Vec<LocationFix>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut fixes = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let field = |i: usize| -> Result<f64> {
            record
                .get(i)
                .with_context(|| format!("row {}: missing column {i}", line + 2))?
                .trim()
                .parse::<f64>()
                .with_context(|| format!("row {}: column {i} is not a number", line + 2))
        };
        let mut fix = LocationFix::new(
            GeoPoint::new(field(1)?, field(2)?),
            field(3)?,
            Timestamp(field(0)? as i64),
        );
        if record.get(4).is_some_and(|h| !h.trim().is_empty()) {
            fix = fix.with_heading(field(4)?);
        }
        fixes.push(fix);
    }
    Ok(fixes)
}

/// Eastbound drive from `ORIGIN` to `DESTINATION` at ~43 km/h, leaving the
/// route one block north for part of the way.
fn synthetic_trace() -> Vec<LocationFix> {
    const FIXES: usize = 82;
    const DETOUR: std::ops::Range<usize> = 30..44;
    let step_deg = (DESTINATION.lon - ORIGIN.lon) / (FIXES - 1) as f64;

    (0..FIXES)
        .map(|i| {
            let north = if DETOUR.contains(&i) { 0.0006 } else { 0.0 };
            let p = GeoPoint::new(ORIGIN.lon + step_deg * i as f64, ORIGIN.lat + north);
            let speed = if i + 1 == FIXES { 0.0 } else { 12.0 };
            LocationFix::new(p, speed, Timestamp(START_MS + i as i64 * FIX_PERIOD_MS))
        })
        .collect()
}

// ── Console observer ──────────────────────────────────────────────────────────

/// Prints notable events and forwards everything to the trip log.
struct ConsoleObserver<W: TripLogWriter> {
    inner:     TripLogObserver<W>,
    positions: usize,
    plans:     usize,
    summary:   Option<ArrivalSummary>,
}

impl<W: TripLogWriter> ConsoleObserver<W> {
    fn new(inner: TripLogObserver<W>) -> Self {
        Self { inner, positions: 0, plans: 0, summary: None }
    }
}

impl<W: TripLogWriter> SessionObserver for ConsoleObserver<W> {
    fn on_position(&mut self, position: &TrackedPosition, transition: &Transition, state: Option<&RouteState>) {
        self.positions += 1;
        if let Some(s) = state {
            if self.positions % 10 == 0 {
                println!(
                    "  {:>5.0} m left  {:>5.1}%  dev {:>5.1} m  {:>4.0} km/h  next: {}",
                    s.remaining_m,
                    s.progress * 100.0,
                    s.deviation_m,
                    position.speed_kmh,
                    s.next_instruction.as_deref().unwrap_or("-"),
                );
            }
        }
        self.inner.on_position(position, transition, state);
    }

    fn on_plan_replaced(&mut self, revision: PlanRevision, plan: &RoutePlan, source: PlanSource) {
        self.plans += 1;
        println!(
            "{revision} ({source}): {:.0} m, {:.0} s, {} congestion segments",
            plan.total_distance_m(),
            plan.total_duration_s(),
            plan.congestion_segments().len(),
        );
        self.inner.on_plan_replaced(revision, plan, source);
    }

    fn on_recalculation_failed(&mut self, reason: RecalcReason, error: &DirectionsError) {
        println!("recalculation ({reason}) failed: {error}");
    }

    fn on_initial_route_failed(&mut self, error: &DirectionsError) {
        println!("no initial route: {error}");
    }

    fn on_arrival_changed(&mut self, arrived: bool) {
        println!("arrived: {arrived}");
    }

    fn on_arrival(&mut self, summary: &ArrivalSummary) {
        self.summary = Some(summary.clone());
        self.inner.on_arrival(summary);
    }

    fn on_session_end(&mut self, odometer_m: f64) {
        self.inner.on_session_end(odometer_m);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("=== replay — nav_engine session ===");

    let config = load_config(args.config.as_deref())?;
    let fixes = match &args.trace {
        Some(path) => load_trace(path)?,
        None => synthetic_trace(),
    };
    let Some(first) = fixes.first() else {
        bail!("trace is empty");
    };
    println!("Trace: {} fixes", fixes.len());

    std::fs::create_dir_all(&args.out)?;
    let log = TripLogObserver::new(CsvTripLog::new(&args.out)?);
    let store = Arc::new(JsonFilePlanStore::new(args.out.join("plan.json")));
    let clock = ManualClock::new(first.timestamp);

    let destination = if args.trace.is_some() {
        fixes.last().map_or(DESTINATION, |f| f.position)
    } else {
        DESTINATION
    };
    let (handle, task) = SessionBuilder::new(
        config,
        Trip::new(destination),
        Arc::new(StraightLineDirections { cruise_kmh: CRUISE_KMH }),
    )
    .store(store)
    .clock(Arc::new(clock.clone()))
    .consumption(Some(CONSUMPTION))
    .spawn(ConsoleObserver::new(log))?;

    for fix in fixes {
        clock.set(fix.timestamp);
        handle.push_fix(fix)?;
        tokio::time::sleep(PACE).await;
    }
    handle.finish()?;

    let mut observer = task.await?;
    info!("{} positions, {} plans", observer.positions, observer.plans);

    println!();
    match &observer.summary {
        Some(s) => {
            println!("Trip summary");
            println!("  distance     {:.0} m", s.total_distance_m);
            println!("  duration     {:.0} s", s.total_duration_s);
            println!("  time saved   {:.0} s", s.time_saved_s);
            match s.fuel_used_liters {
                Some(l) => println!("  fuel         {l:.2} L"),
                None    => println!("  fuel         unavailable"),
            }
        }
        None => println!("Did not arrive."),
    }

    if let Some(e) = observer.inner.take_error() {
        eprintln!("trip log error: {e}");
    }
    println!("Trip log written to {}", args.out.display());
    Ok(())
}
