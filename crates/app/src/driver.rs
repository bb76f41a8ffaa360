//! Real-time pacing and lifecycle
//!
//! The driver runs the control loop at a fixed tick rate, polls for external
//! cancellation once per tick, and pushes per-tick diagnostics into the
//! telemetry sink. Pacing is a bounded sleep to the next tick boundary; an
//! overrunning tick proceeds at best effort with no skipping or catch-up.

use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use simcore::{ControlSignal, InputPoll, PhysicsWorld, SimContext, SimResult, TelemetrySink};

use crate::control_loop::{ControlLoop, LoopState};

/// Driver settings.
#[derive(Debug, Clone, Serialize)]
pub struct DriverConfig {
    /// Target tick rate in Hz; dt is its reciprocal.
    pub tick_rate_hz: f64,
    /// Stop after this many ticks (None = run until cancelled).
    pub max_ticks: Option<u64>,
    /// Pace against the wall clock. Off for headless test runs.
    pub realtime: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            max_ticks: None,
            realtime: true,
        }
    }
}

/// Owns the loop's pacing, cancellation, and telemetry reporting.
pub struct SimulationDriver<T: TelemetrySink, I: InputPoll> {
    config: DriverConfig,
    telemetry: T,
    input: I,
}

impl<T: TelemetrySink, I: InputPoll> SimulationDriver<T, I> {
    pub fn new(config: DriverConfig, telemetry: T, input: I) -> Self {
        Self {
            config,
            telemetry,
            input,
        }
    }

    /// Drive `control_loop` against `world` until it stops or a tick fails.
    ///
    /// The telemetry sink is flushed on every exit path; a fatal tick error
    /// is logged and propagated so the process can exit non-zero.
    pub fn run<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        control_loop: &mut ControlLoop,
    ) -> SimResult<()> {
        let dt = 1.0 / self.config.tick_rate_hz;
        let frame = Duration::from_secs_f64(dt);
        let mut t = 0.0;
        let mut ticks: u64 = 0;
        let mut last = Instant::now();
        let mut fps = self.config.tick_rate_hz;

        log::info!(
            "driver started: {:.0} Hz, dt = {:.5} s",
            self.config.tick_rate_hz,
            dt
        );

        while control_loop.state() == LoopState::Running {
            // Cancellation is cooperative: one poll per tick, consumed here.
            for signal in self.input.poll() {
                match signal {
                    ControlSignal::Quit => {
                        log::info!("quit requested, stopping");
                        control_loop.stop();
                    }
                }
            }
            if control_loop.state() == LoopState::Stopped {
                break;
            }

            let report = match control_loop.tick(world, dt) {
                Ok(report) => report,
                Err(err) => {
                    log::error!("tick {ticks} failed: {err}");
                    control_loop.stop();
                    self.telemetry.flush();
                    return Err(err);
                }
            };

            let ctx = SimContext { dt, t };
            self.telemetry.draw(ctx);
            self.telemetry.overlay(&format!("fps: {fps:.1}"));
            self.telemetry.overlay(&format!("error: {:.2}", report.error));
            self.telemetry
                .overlay(&format!("control_force: {:.2}", report.control));
            self.telemetry.overlay(&format!(
                "angle of pendulum: {:.2} deg, ang vel: {:.2}",
                report.angle.to_degrees(),
                report.angular_velocity
            ));

            if self.config.realtime {
                let next = last + frame;
                let now = Instant::now();
                if now < next {
                    thread::sleep(next - now);
                }
                let elapsed = last.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    // Smoothed like a frame clock readout.
                    fps = 0.9 * fps + 0.1 / elapsed;
                }
                last = Instant::now();
            }

            t += dt;
            ticks += 1;
            if let Some(max) = self.config.max_ticks {
                if ticks >= max {
                    log::info!("tick budget of {max} reached, stopping");
                    control_loop.stop();
                }
            }
        }

        self.telemetry.flush();
        log::info!("driver stopped after {ticks} ticks ({t:.2} s simulated)");
        Ok(())
    }
}
