use std::{ops::ControlFlow, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    chip8::ChipSet,
    definitions::{cpu, timer},
    devices::{AudioCommands, DisplayCommands},
    timer::{TimedWorker, Worker},
    ProcessError,
};

/// The rates at which the chip is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// instructions executed per second
    pub cpu_hertz: u64,
    /// timer ticks per second
    pub timer_hertz: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cpu_hertz: cpu::HERTZ,
            timer_hertz: timer::HERTZ,
        }
    }
}

impl RunnerConfig {
    pub fn cpu_interval(&self) -> Duration {
        interval(self.cpu_hertz)
    }

    pub fn timer_interval(&self) -> Duration {
        interval(self.timer_hertz)
    }
}

fn interval(hertz: u64) -> Duration {
    Duration::from_micros(1_000_000 / hertz.max(1))
}

/// Drives a chip from two workers, one stepping the cpu and one ticking the timers.
///
/// The chip is shared behind a lock, so the driver can still feed key events
/// and look at the state while the rom runs. A failing instruction stops both
/// workers and is kept around as [`last_error`](Runner::last_error).
pub struct Runner<D, A, W = Worker>
where
    D: DisplayCommands + Send + 'static,
    A: AudioCommands + Send + 'static,
    W: TimedWorker,
{
    chip: Arc<Mutex<ChipSet<D, A>>>,
    config: RunnerConfig,
    cpu: W,
    timer: W,
    fault: Arc<Mutex<Option<ProcessError>>>,
}

impl<D, A, W> Runner<D, A, W>
where
    D: DisplayCommands + Send + 'static,
    A: AudioCommands + Send + 'static,
    W: TimedWorker,
{
    /// Wraps the chip, nothing runs until [`start`](Runner::start) is called.
    pub fn new(chip: ChipSet<D, A>, config: RunnerConfig) -> Self {
        Self {
            chip: Arc::new(Mutex::new(chip)),
            config,
            cpu: W::new(),
            timer: W::new(),
            fault: Arc::new(Mutex::new(None)),
        }
    }

    pub fn start(&mut self) {
        self.stop();
        *self.fault.lock() = None;
        log::info!(
            "Starting the chip with {}Hz and timers with {}Hz",
            self.config.cpu_hertz,
            self.config.timer_hertz
        );

        let chip = self.chip.clone();
        let fault = self.fault.clone();
        let step = move || {
            let mut chip = chip.lock();
            match chip.step() {
                Ok(_) => ControlFlow::Continue(()),
                Err(err) => {
                    log::error!("Unable to continue the rom: {}\n{}", err, &*chip);
                    *fault.lock() = Some(err);
                    ControlFlow::Break(())
                }
            }
        };
        self.cpu.start(step, self.config.cpu_interval());

        let chip = self.chip.clone();
        let fault = self.fault.clone();
        let tick = move || {
            if fault.lock().is_some() {
                return ControlFlow::Break(());
            }
            chip.lock().tick();
            ControlFlow::Continue(())
        };
        self.timer.start(tick, self.config.timer_interval());
    }

    pub fn stop(&mut self) {
        self.cpu.stop();
        self.timer.stop();
    }

    /// Returns if the cpu is still being stepped.
    pub fn is_alive(&self) -> bool {
        self.cpu.is_alive()
    }

    /// Gives exclusive access to the chip, the workers wait in the meantime.
    pub fn with_chip<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ChipSet<D, A>) -> R,
    {
        let mut chip = self.chip.lock();
        f(&mut *chip)
    }

    pub fn key_down(&self, key: &str) {
        self.chip.lock().key_down(key);
    }

    pub fn key_up(&self, key: &str) {
        self.chip.lock().key_up(key);
    }

    /// The error that stopped the rom, if any.
    pub fn last_error(&self) -> Option<ProcessError> {
        self.fault.lock().clone()
    }
}
