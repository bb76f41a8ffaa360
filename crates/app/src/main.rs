use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use cartpole_app::{
    ConsoleTelemetry, ControlLoop, CtrlCPoll, DriverConfig, PlanarWorld, SimulationDriver,
};
use control::{PidConfig, PidController};
use mechanics::{CartPoleRig, CartPoleRigConfig};
use simcore::{InputPoll, SimResult};

/// Effective process configuration. No config file and no required CLI
/// arguments; this is logged once at startup so a run is reproducible from
/// its log alone.
#[derive(Debug, Clone, Serialize)]
struct AppConfig {
    driver: DriverConfig,
    gains: PidConfig,
    rig: CartPoleRigConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            // Reference tuning for the reference rig.
            gains: PidConfig::new(80.0, 2.5, 0.005).with_setpoint(0.0),
            rig: CartPoleRigConfig::default(),
        }
    }
}

/// Small initial lean so the controller has work to do from tick one.
const INITIAL_LEAN_RAD: f64 = 0.02;

fn main() -> ExitCode {
    init_logging();

    let input = CtrlCPoll::install().expect("failed to install quit signal handler");

    match run(input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("simulation halted: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(input: impl InputPoll) -> SimResult<()> {
    let config = AppConfig::default();
    if let Ok(json) = serde_json::to_string(&config) {
        log::info!("configuration: {json}");
    }

    let mut world = PlanarWorld::new();
    let rig = CartPoleRig::spawn(&mut world, &config.rig)?;
    world.set_pendulum_angle(INITIAL_LEAN_RAD);
    log::info!("initialized physics world and cart-pole rig");

    let controller = PidController::new(config.gains.clone());
    let mut control_loop = ControlLoop::new(rig, controller);

    let telemetry = ConsoleTelemetry::new(Duration::from_secs(1));
    let mut driver = SimulationDriver::new(config.driver, telemetry, input);

    driver.run(&mut world, &mut control_loop)
}

/// Console at INFO plus a daily file at DEBUG, like the reference logger.
/// Losing the file sink degrades to console only; it never affects control.
fn init_logging() {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    match daily_log_file() {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file)),
        Err(err) => eprintln!("log file unavailable, console only: {err}"),
    }

    if let Err(err) = CombinedLogger::init(loggers) {
        eprintln!("logger already initialized: {err}");
    }
}

fn daily_log_file() -> std::io::Result<std::fs::File> {
    fs::create_dir_all("logs")?;
    let date = time::OffsetDateTime::now_utc().date();
    let path = PathBuf::from("logs").join(format!(
        "{:04}-{:02}-{:02}-cartpole.log",
        date.year(),
        u8::from(date.month()),
        date.day()
    ));
    OpenOptions::new().create(true).append(true).open(path)
}
