//! Console telemetry sink
//!
//! Stands in for the reference HUD: the draw request and the overlay text
//! lines become throttled console output through the logging facade. The
//! channel is one-way and lossy; dropped frames are by contract invisible to
//! the control loop.

use std::time::{Duration, Instant};

use simcore::{SimContext, TelemetrySink};

pub struct ConsoleTelemetry {
    emit_interval: Duration,
    last_emit: Option<Instant>,
    emitting: bool,
}

impl ConsoleTelemetry {
    /// Emit at most one frame of overlays per `emit_interval`.
    pub fn new(emit_interval: Duration) -> Self {
        Self {
            emit_interval,
            last_emit: None,
            emitting: false,
        }
    }
}

impl TelemetrySink for ConsoleTelemetry {
    fn draw(&mut self, ctx: SimContext) {
        let now = Instant::now();
        self.emitting = match self.last_emit {
            Some(last) => now.duration_since(last) >= self.emit_interval,
            None => true,
        };
        if self.emitting {
            self.last_emit = Some(now);
            log::info!("t = {:.2} s", ctx.t);
        }
    }

    fn overlay(&mut self, line: &str) {
        if self.emitting {
            log::info!("  {line}");
        }
    }

    fn flush(&mut self) {
        self.emitting = false;
        log::info!("telemetry closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_emits_then_throttles() {
        let mut sink = ConsoleTelemetry::new(Duration::from_secs(3600));
        sink.draw(SimContext { dt: 1.0 / 60.0, t: 0.0 });
        assert!(sink.emitting);
        sink.draw(SimContext { dt: 1.0 / 60.0, t: 1.0 / 60.0 });
        assert!(!sink.emitting);
    }

    #[test]
    fn test_flush_stops_emission() {
        let mut sink = ConsoleTelemetry::new(Duration::ZERO);
        sink.draw(SimContext { dt: 1.0 / 60.0, t: 0.0 });
        sink.flush();
        assert!(!sink.emitting);
    }
}
