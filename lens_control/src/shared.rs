//! Shared control state.
//!
//! Word-sized atomic fields, no lock. Each context gets exactly one writer
//! port from [`SharedControlState::split`]; the ports are not `Clone`, so
//! the single-writer convention holds at compile time. Any context may hold
//! a [`StateView`].
//!
//! | field | writer |
//! |-------|--------|
//! | focus target | [`TargetWriter`] (plus the one-shot seed of [`SamplerPort`]) |
//! | rotary target | [`TargetWriter`] |
//! | position sample | [`SamplerPort`] |
//! | bus / sampler / sequencer flags | owning port |
//!
//! Stores are `Release`, loads `Acquire`. A reader can see a value one
//! quantum old but never a torn one.

use std::hint::spin_loop;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering, fence};

use lens_common::control::flags::{StatusFlags, Subsystem};
use lens_common::control::types::{Phase, PositionSample};

// ─── Sticky flags ───────────────────────────────────────────────────

/// One subsystem's flag word.
#[derive(Debug, Default)]
pub struct StickyFlags(AtomicU8);

impl StickyFlags {
    #[inline]
    pub fn set(&self, flags: StatusFlags) {
        self.0.fetch_or(flags.bits(), Ordering::Release);
    }

    #[inline]
    pub fn clear(&self, flags: StatusFlags) {
        self.0.fetch_and(!flags.bits(), Ordering::Release);
    }

    /// Set or clear depending on `on`.
    #[inline]
    pub fn assign(&self, flags: StatusFlags, on: bool) {
        if on {
            self.set(flags);
        } else {
            self.clear(flags);
        }
    }

    /// Current flags without side effects.
    #[inline]
    pub fn peek(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    /// Clear `mask` and return the word as it was before. Destructive.
    #[inline]
    pub fn take(&self, mask: StatusFlags) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.0.fetch_and(!mask.bits(), Ordering::AcqRel))
    }
}

// ─── Sample slot ────────────────────────────────────────────────────

/// Latest sample plus the number of commits that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleSnapshot {
    pub sample: PositionSample,
    /// 0 until the first publish, then incremented once per publish.
    pub sequence: u32,
}

/// Sequence-locked sample triple.
///
/// `seq` is odd while a write is in progress and even once committed.
#[derive(Debug, Default)]
struct SampleSlot {
    seq: AtomicU32,
    position: AtomicU32,
    temperature: AtomicU32,
    reference: AtomicU32,
}

impl SampleSlot {
    fn publish(&self, sample: &PositionSample) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        self.position.store(sample.position_raw, Ordering::Relaxed);
        self.temperature
            .store(sample.temperature_raw, Ordering::Relaxed);
        self.reference.store(sample.reference_raw, Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    fn read(&self) -> SampleSnapshot {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                spin_loop();
                continue;
            }
            let sample = PositionSample::new(
                self.position.load(Ordering::Relaxed),
                self.temperature.load(Ordering::Relaxed),
                self.reference.load(Ordering::Relaxed),
            );
            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return SampleSnapshot {
                    sample,
                    sequence: before >> 1,
                };
            }
        }
    }
}

// ─── State ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Inner {
    focus_target: AtomicU32,
    rotary_target: AtomicU8,
    sample: SampleSlot,
    flags: [StickyFlags; 3],
}

impl Inner {
    #[inline]
    fn flags(&self, subsystem: Subsystem) -> &StickyFlags {
        &self.flags[subsystem.index()]
    }
}

/// Control targets, latest sample and flag words.
///
/// Starts with focus target 0, rotary target `Phase0`, no sample and empty
/// flags.
#[derive(Debug, Default)]
pub struct SharedControlState {
    inner: Arc<Inner>,
}

impl SharedControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out one writer port per context and a view.
    pub fn split(self) -> (StateView, TargetWriter, SamplerPort, SequencerPort) {
        let view = StateView {
            inner: Arc::clone(&self.inner),
        };
        let targets = TargetWriter {
            inner: Arc::clone(&self.inner),
        };
        let sampler = SamplerPort {
            inner: Arc::clone(&self.inner),
        };
        let sequencer = SequencerPort { inner: self.inner };
        (view, targets, sampler, sequencer)
    }
}

/// Read access for any context.
#[derive(Debug, Clone)]
pub struct StateView {
    inner: Arc<Inner>,
}

impl StateView {
    #[inline]
    pub fn focus_target(&self) -> u32 {
        self.inner.focus_target.load(Ordering::Acquire)
    }

    #[inline]
    pub fn rotary_target(&self) -> Phase {
        // Only defined phases are ever stored.
        Phase::from_u8(self.inner.rotary_target.load(Ordering::Acquire)).unwrap_or_default()
    }

    #[inline]
    pub fn latest_sample(&self) -> PositionSample {
        self.inner.sample.read().sample
    }

    /// Latest sample with its commit sequence, for staleness checks.
    #[inline]
    pub fn sample_snapshot(&self) -> SampleSnapshot {
        self.inner.sample.read()
    }

    /// Flags of a subsystem without side effects.
    #[inline]
    pub fn flags(&self, subsystem: Subsystem) -> StatusFlags {
        self.inner.flags(subsystem).peek()
    }

    /// Read and clear the OVERRUN bit of a subsystem.
    ///
    /// Destructive: a second call returns `false` unless a new overrun was
    /// flagged in between.
    #[inline]
    pub fn take_overrun(&self, subsystem: Subsystem) -> bool {
        self.inner
            .flags(subsystem)
            .take(StatusFlags::OVERRUN)
            .contains(StatusFlags::OVERRUN)
    }
}

/// Writer port of the bus link handler.
#[derive(Debug)]
pub struct TargetWriter {
    inner: Arc<Inner>,
}

impl TargetWriter {
    /// Store a focus target. The caller has range-checked it.
    #[inline]
    pub fn set_focus_target(&self, target: u32) {
        self.inner.focus_target.store(target, Ordering::Release);
    }

    #[inline]
    pub fn set_rotary_target(&self, phase: Phase) {
        self.inner
            .rotary_target
            .store(phase.as_u8(), Ordering::Release);
    }

    #[inline]
    pub fn flags(&self) -> &StickyFlags {
        self.inner.flags(Subsystem::Bus)
    }
}

/// Writer port of the position sampler.
#[derive(Debug)]
pub struct SamplerPort {
    inner: Arc<Inner>,
}

impl SamplerPort {
    #[inline]
    pub fn publish_sample(&self, sample: &PositionSample) {
        self.inner.sample.publish(sample);
    }

    /// Overwrite the focus target once at startup so the carriage holds
    /// where it is. The only write to the target outside the bus link.
    #[inline]
    pub fn seed_focus_target(&self, target: u32) {
        self.inner.focus_target.store(target, Ordering::Release);
    }

    #[inline]
    pub fn flags(&self) -> &StickyFlags {
        self.inner.flags(Subsystem::Sampler)
    }
}

/// Writer port of the rotary sequencer.
#[derive(Debug)]
pub struct SequencerPort {
    inner: Arc<Inner>,
}

impl SequencerPort {
    #[inline]
    pub fn flags(&self) -> &StickyFlags {
        self.inner.flags(Subsystem::Sequencer)
    }
}
