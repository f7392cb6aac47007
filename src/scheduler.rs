use std::time::{Duration, Instant};

use crate::error::Result;
use crate::interp::Interpreter;
use crate::machine::Machine;

const TICK_HZ: u32 = 60;

/// What the host needs to know after a frame: whether the tone should be
/// audible. The settled framebuffer is read straight off the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub tone: bool,
}

/// Translates a clock rate in instructions per second into a per-frame
/// instruction budget and drives the interpreter one 60 Hz tick at a time.
/// Timers belong to the tick, not the instruction batch: each frame they
/// count down by at most one.
pub struct FrameScheduler {
    steps_per_frame: u32,
    frame_duration: Duration,
    last_frame: Instant,
}

impl FrameScheduler {
    pub fn new(clock_hz: u32) -> Self {
        Self {
            steps_per_frame: (clock_hz / TICK_HZ).max(1),
            frame_duration: Duration::from_secs(1) / TICK_HZ,
            last_frame: Instant::now(),
        }
    }

    pub fn steps_per_frame(&self) -> u32 {
        self.steps_per_frame
    }

    /// Runs one frame's instruction batch (a waiting blocked-key-read step
    /// still consumes a budget slot), then ticks both timers. Faults abort
    /// the frame and propagate to the host.
    pub fn run_frame(&self, interp: &Interpreter, m: &mut Machine) -> Result<FrameReport> {
        for _ in 0..self.steps_per_frame {
            interp.step(m)?;
        }
        m.tick_timers();
        Ok(FrameReport {
            tone: m.is_tone_on(),
        })
    }

    /// Time left until the next frame is due; the caller sleeps this off.
    pub fn time_to_next_frame(&self) -> Duration {
        self.frame_duration.saturating_sub(self.last_frame.elapsed())
    }

    pub fn begin_frame(&mut self) {
        self.last_frame = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH};
    use crate::quirks::QuirkProfile;

    const ALWAYS_ZERO: fn() -> u8 = || 0x00;

    fn idle_machine() -> Machine {
        // 0x1200 at the entry point: jump-to-self, runs forever
        let mut m = Machine::new(DEFAULT_DISPLAY_WIDTH, DEFAULT_DISPLAY_HEIGHT);
        m.load_rom(&[0x12, 0x00]).unwrap();
        m
    }

    fn interp() -> Interpreter {
        Interpreter::new(QuirkProfile::classic(), ALWAYS_ZERO)
    }

    #[test]
    fn budget_is_rate_over_sixty() {
        assert_eq!(FrameScheduler::new(700).steps_per_frame(), 11);
        assert_eq!(FrameScheduler::new(540).steps_per_frame(), 9);
        assert_eq!(FrameScheduler::new(60).steps_per_frame(), 1);
    }

    #[test]
    fn budget_has_a_floor_of_one() {
        assert_eq!(FrameScheduler::new(0).steps_per_frame(), 1);
        assert_eq!(FrameScheduler::new(30).steps_per_frame(), 1);
    }

    #[test]
    fn timers_tick_once_per_frame() {
        let mut m = idle_machine();
        m.delay_timer = 2;
        let sched = FrameScheduler::new(700);
        let interp = interp();

        sched.run_frame(&interp, &mut m).unwrap();
        assert_eq!(m.delay_timer, 1);
        sched.run_frame(&interp, &mut m).unwrap();
        assert_eq!(m.delay_timer, 0);
        // never goes below zero
        sched.run_frame(&interp, &mut m).unwrap();
        assert_eq!(m.delay_timer, 0);
    }

    #[test]
    fn tone_reflects_sound_timer_after_tick() {
        let mut m = idle_machine();
        m.sound_timer = 2;
        let sched = FrameScheduler::new(60);
        let interp = interp();

        assert_eq!(sched.run_frame(&interp, &mut m).unwrap(), FrameReport { tone: true });
        assert_eq!(sched.run_frame(&interp, &mut m).unwrap(), FrameReport { tone: false });
    }

    #[test]
    fn waiting_steps_consume_the_budget() {
        // blocking key read with no key pressed: the frame still completes
        // and the timers still tick
        let mut m = Machine::new(DEFAULT_DISPLAY_WIDTH, DEFAULT_DISPLAY_HEIGHT);
        m.load_rom(&[0xf0, 0x0a]).unwrap();
        m.delay_timer = 1;
        let sched = FrameScheduler::new(700);

        sched.run_frame(&interp(), &mut m).unwrap();
        assert_eq!(m.pc, 0x200);
        assert_eq!(m.delay_timer, 0);
    }

    #[test]
    fn faults_propagate_out_of_the_frame() {
        let mut m = Machine::new(DEFAULT_DISPLAY_WIDTH, DEFAULT_DISPLAY_HEIGHT);
        m.load_rom(&[0x00, 0xee]).unwrap();
        let sched = FrameScheduler::new(700);
        assert_eq!(
            sched.run_frame(&interp(), &mut m),
            Err(crate::error::Error::StackUnderflow)
        );
    }
}
