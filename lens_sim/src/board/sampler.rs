//! Simulated timer-triggered acquisition.

use lens_common::control::types::PositionSample;
use lens_common::hal::types::{AcquisitionPlan, TransferEvent};

#[derive(Debug, Default)]
pub(crate) struct SamplerSim {
    pub(crate) plan: Option<AcquisitionPlan>,
    pub(crate) running: bool,
    next_due_us: u64,
    pending: Option<TransferEvent>,
    /// Next N completions fault.
    pub(crate) inject_errors: u32,
    pub(crate) completions: u64,
}

impl SamplerSim {
    pub(crate) fn start(&mut self, now_us: u64) -> bool {
        let Some(plan) = self.plan else {
            return false;
        };
        self.running = true;
        self.next_due_us = now_us + u64::from(plan.period_us);
        true
    }

    /// Fire every trigger edge up to `now_us`. `sample` yields the set
    /// converted at a given edge.
    pub(crate) fn fire_due(&mut self, now_us: u64, mut sample: impl FnMut() -> PositionSample) {
        let Some(plan) = self.plan else {
            return;
        };
        if !self.running || plan.period_us == 0 {
            return;
        }
        while self.next_due_us <= now_us {
            let overrun = self.pending.is_some();
            let mut event = if self.inject_errors > 0 {
                self.inject_errors -= 1;
                TransferEvent::faulted()
            } else {
                TransferEvent::completed(sample())
            };
            event.overrun = overrun;
            self.pending = Some(event);
            self.completions += 1;
            self.next_due_us += u64::from(plan.period_us);
            if !plan.circular {
                self.running = false;
                break;
            }
        }
    }

    pub(crate) fn take(&mut self) -> Option<TransferEvent> {
        self.pending.take()
    }
}
