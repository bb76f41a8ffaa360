//! Quit-signal polling
//!
//! The reference program drains a window event queue every tick; headless,
//! the only external event is Ctrl-C. A process-wide handler flips a flag
//! which the driver consumes through the same non-blocking per-tick poll a
//! windowed frontend would use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use simcore::{ControlSignal, InputPoll};

pub struct CtrlCPoll {
    flag: Arc<AtomicBool>,
}

impl CtrlCPoll {
    /// Install the Ctrl-C handler. Can only succeed once per process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let flag = Arc::new(AtomicBool::new(false));
        let handler_flag = flag.clone();
        ctrlc::set_handler(move || {
            handler_flag.store(true, Ordering::SeqCst);
        })?;
        Ok(Self { flag })
    }

    #[cfg(test)]
    fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }
}

impl InputPoll for CtrlCPoll {
    fn poll(&mut self) -> Vec<ControlSignal> {
        if self.flag.swap(false, Ordering::SeqCst) {
            vec![ControlSignal::Quit]
        } else {
            Vec::new()
        }
    }
}
