use {
    crate::devices::AudioCommands,
    std::{
        ops::ControlFlow,
        sync::{
            mpsc::{self, RecvTimeoutError, SyncSender},
            Arc,
        },
        thread::{self, JoinHandle},
        time::{Duration, Instant},
    },
};

/// The two countdown timers of the chip.
///
/// Both of them only ever move when [`tick`](Timers::tick) is called, which is
/// intended to happen at `60Hz` by a driver outside of the chip.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Timers {
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    delay: u8,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn get_delay(&self) -> u8 {
        self.delay
    }

    pub fn set_delay(&mut self, value: u8) {
        self.delay = value;
    }

    pub fn get_sound(&self) -> u8 {
        self.sound
    }

    /// Sets the sound timer, starting the tone if the timer was idle and stopping
    /// it if the timer is cleared while sounding.
    pub fn set_sound<A: AudioCommands>(&mut self, value: u8, audio: &mut A) {
        let previous = self.sound;
        self.sound = value;
        if previous == 0 && value > 0 {
            audio.start_tone();
        } else if value == 0 && audio.is_playing() {
            audio.stop_tone();
        }
    }

    /// Counts both timers down by one.
    pub fn tick<A: AudioCommands>(&mut self, audio: &mut A) {
        if self.delay > 0 {
            self.delay -= 1;
        }

        if self.sound > 0 {
            self.sound -= 1;
            if self.sound == 0 {
                audio.stop_tone();
            }
        } else if audio.is_playing() {
            audio.stop_tone();
        }
    }
}

/// A periodic worker, used by the drivers to call into the chip
/// at a fixed rate.
pub trait TimedWorker {
    fn new() -> Self;

    /// Will run the callback every interval until either the callback
    /// breaks or the worker is stopped.
    fn start<T>(&mut self, callback: T, interval: Duration)
    where
        T: Send + FnMut() -> ControlFlow<()> + 'static;

    fn stop(&mut self);

    fn is_alive(&self) -> bool;
}

/// Is the thread based worker.
pub struct Worker {
    /// Contains the actuall thread, that is running.
    thread: Option<JoinHandle<()>>,
    /// Contains the sync sender used to gracefull shutdown the thread.
    shutdown: Option<SyncSender<()>>,
    /// Counts the running threads, the thread holds a clone for as long as it runs.
    alive: Arc<()>,
}

impl TimedWorker for Worker {
    fn new() -> Self {
        Self {
            thread: None,
            shutdown: None,
            alive: Arc::new(()),
        }
    }

    /// Attention the timer assumes the callback will finish
    /// faster then the interval.
    fn start<T>(&mut self, mut callback: T, interval: Duration)
    where
        T: Send + FnMut() -> ControlFlow<()> + 'static,
    {
        self.stop();

        let (send, recv) = mpsc::sync_channel::<()>(1);
        let alive = self.alive.clone();
        let thread = thread::spawn(move || {
            let _alive = alive;
            let mut timeout = interval;
            loop {
                match recv.recv_timeout(timeout) {
                    Err(RecvTimeoutError::Timeout) => {
                        let start = Instant::now();

                        if callback().is_break() {
                            log::debug!("Worker callback requested shutdown");
                            break;
                        }

                        // make sure there the system will at most wait the interval
                        timeout = interval.saturating_sub(start.elapsed());
                    }
                    Ok(_) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        self.thread = Some(thread);
        self.shutdown = Some(send);
    }

    fn stop(&mut self) {
        // the thread might have stopped on its own already, so a failed send is fine
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("The worker thread panicked.");
            }
        }
    }

    fn is_alive(&self) -> bool {
        Arc::strong_count(&self.alive) > 1
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}
