//! Threaded wrapper around the engine.
//!
//! Two background threads: a pump that owns the `TouchSurface` and feeds
//! batches through a bounded channel, and an engine loop that drains
//! batches and commands, runs display ticks, and publishes snapshots.
//! Both threads shut down when the service is dropped, preventing leaks.

use crossbeam_channel as xch;
use padscale_traits::TouchSurface;
use padscale_traits::clock::Clock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::command::Command;
use crate::engine::ScaleEngine;
use crate::error::{Report, Result, ScaleError};
use crate::snapshot::ScaleSnapshot;

const COMMAND_QUEUE: usize = 16;
const BATCH_QUEUE: usize = 8;

/// Background surface reader.
///
/// Owns the `TouchSurface`, pushes batches via a bounded channel (oldest
/// dropped under pressure so the engine always sees fresh data), and tracks
/// the last-ok timestamp for staleness checks.
pub struct SurfacePump {
    rx: xch::Receiver<padscale_traits::TouchBatch>,
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SurfacePump {
    pub fn spawn<C: Clock + Send + Sync + 'static>(
        mut surface: Box<dyn TouchSurface + Send>,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(BATCH_QUEUE);
        let rx_evict = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("surface pump received shutdown signal");
                    break;
                }

                match surface.next_batch(timeout) {
                    Ok(Some(batch)) => {
                        let mut pending = batch;
                        loop {
                            match tx.try_send(pending) {
                                Ok(()) => break,
                                Err(xch::TrySendError::Full(b)) => {
                                    // Engine is behind; evict the oldest batch
                                    let _ = rx_evict.try_recv();
                                    pending = b;
                                }
                                Err(xch::TrySendError::Disconnected(_)) => {
                                    tracing::debug!("surface consumer disconnected, exiting");
                                    return;
                                }
                            }
                        }
                        last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                    }
                    Ok(None) => {
                        tracing::debug!("surface stream ended");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "surface read failed");
                    }
                }
            }
            tracing::trace!("surface pump exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    pub fn receiver(&self) -> xch::Receiver<padscale_traits::TouchBatch> {
        self.rx.clone()
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Staleness using this pump's epoch and a real monotonic clock.
    pub fn stalled_for_now(&self) -> u64 {
        let now_ms = {
            let dur = Instant::now().saturating_duration_since(self.epoch);
            let ms = dur.as_millis();
            (ms.min(u128::from(u64::MAX))) as u64
        };
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// True once the surface stream has ended and the reader thread exited.
    pub fn is_done(&self) -> bool {
        self.join_handle.as_ref().is_none_or(std::thread::JoinHandle::is_finished)
    }
}

impl Drop for SurfacePump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after at most one next_batch() timeout.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("surface pump joined successfully"),
                Err(e) => tracing::warn!(?e, "surface pump panicked during shutdown"),
            }
        }
    }
}

/// Running scale: engine loop plus surface pump, commands in, snapshots out.
pub struct ScaleService {
    cmd_tx: xch::Sender<Command>,
    shared: Arc<RwLock<ScaleSnapshot>>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
    pump: SurfacePump,
}

impl ScaleService {
    /// Start the service. The engine's clock paces the tick loop, so a test
    /// clock makes the whole service run on virtual time.
    pub fn spawn(
        engine: ScaleEngine,
        surface: Box<dyn TouchSurface + Send>,
        timeout: Duration,
    ) -> Self {
        let clock = engine.clock();
        let pump = SurfacePump::spawn(surface, timeout, clock.clone());
        let batches = pump.receiver();
        let (cmd_tx, cmd_rx) = xch::bounded(COMMAND_QUEUE);
        let shared = Arc::new(RwLock::new(engine.snapshot()));
        let shared_clone = shared.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            run_engine_loop(
                engine,
                &batches,
                &cmd_rx,
                &shared_clone,
                &shutdown_clone,
                &clock,
            );
        });

        Self {
            cmd_tx,
            shared,
            shutdown,
            join_handle: Some(join_handle),
            pump,
        }
    }

    /// Queue a command for the engine. Fails if the engine loop has stopped
    /// or the queue is full.
    pub fn send(&self, cmd: Command) -> Result<()> {
        match self.cmd_tx.try_send(cmd) {
            Ok(()) => Ok(()),
            Err(xch::TrySendError::Full(_)) => Err(Report::new(ScaleError::State(
                "command queue full".into(),
            ))),
            Err(xch::TrySendError::Disconnected(_)) => Err(Report::new(ScaleError::State(
                "engine loop stopped".into(),
            ))),
        }
    }

    /// Latest published state. Never blocks for long; a poisoned lock yields
    /// the last written snapshot.
    pub fn snapshot(&self) -> ScaleSnapshot {
        match self.shared.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Milliseconds since the surface last produced a healthy read.
    pub fn sample_age_ms(&self) -> u64 {
        self.pump.stalled_for_now()
    }

    /// True once the surface reports end of stream (replay exhausted).
    pub fn surface_done(&self) -> bool {
        self.pump.is_done()
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScaleService {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("engine loop joined successfully"),
                Err(e) => tracing::warn!(?e, "engine loop panicked during shutdown"),
            }
        }
        // pump drops last and joins the reader thread
    }
}

fn run_engine_loop(
    mut engine: ScaleEngine,
    batches: &xch::Receiver<padscale_traits::TouchBatch>,
    commands: &xch::Receiver<Command>,
    shared: &Arc<RwLock<ScaleSnapshot>>,
    shutdown: &Arc<AtomicBool>,
    clock: &Arc<dyn Clock + Send + Sync>,
) {
    let period = Duration::from_micros(crate::util::period_us(engine.tick_hz()));
    let mut next_tick = clock.now() + period;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::debug!("engine loop received shutdown signal");
            break;
        }

        let mut worked = false;
        for cmd in commands.try_iter() {
            engine.apply(cmd);
            worked = true;
        }
        for batch in batches.try_iter() {
            engine.ingest(&batch);
            worked = true;
        }

        let now = clock.now();
        if now >= next_tick {
            engine.tick();
            worked = true;
            next_tick += period;
            if next_tick <= now {
                // Fell behind; skip missed ticks instead of bursting
                next_tick = now + period;
            }
        }

        if worked {
            publish(shared, engine.snapshot());
        } else {
            let until = next_tick.saturating_duration_since(clock.now());
            clock.sleep(until.max(Duration::from_micros(500)));
        }
    }
    tracing::trace!("engine loop exiting cleanly");
}

fn publish(shared: &Arc<RwLock<ScaleSnapshot>>, snap: ScaleSnapshot) {
    match shared.write() {
        Ok(mut guard) => *guard = snap,
        Err(poisoned) => *poisoned.into_inner() = snap,
    }
}
