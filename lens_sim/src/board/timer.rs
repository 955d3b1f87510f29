//! Simulated one-pulse settle timer.

#[derive(Debug, Default)]
pub(crate) struct TimerSim {
    pub(crate) period_ms: u32,
    pub(crate) armed: bool,
    counter_us: u64,
    pub(crate) elapsed: bool,
}

impl TimerSim {
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    pub(crate) fn reset_counter(&mut self) {
        self.counter_us = 0;
    }

    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }

    pub(crate) fn advance(&mut self, dt_us: u64) {
        if !self.armed {
            return;
        }
        self.counter_us += dt_us;
        if self.counter_us >= u64::from(self.period_ms) * 1000 {
            // One pulse: stop and rewind.
            self.armed = false;
            self.counter_us = 0;
            self.elapsed = true;
        }
    }
}
