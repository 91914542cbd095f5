//! The background cadence that drives clock modules.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::info;

use crate::core::context::SharedContext;

/// Half a period per phase: clocks complete a full cycle per second.
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// Owns the tick thread. The thread takes the context lock once per
/// tick and releases it while sleeping, so editing stays responsive.
/// Dropping the ticker stops and joins the thread.
pub struct Ticker {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(context: SharedContext, period: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let paused = Arc::new(AtomicBool::new(false));
        let alive = Arc::clone(&running);
        let hold = Arc::clone(&paused);
        let handle = thread::spawn(move || {
            info!("ticker started, {:?} per phase", period);
            while alive.load(Ordering::Relaxed) {
                if !hold.load(Ordering::Relaxed) {
                    if let Ok(mut cx) = context.lock() {
                        cx.tick();
                    }
                }
                thread::sleep(period);
            }
            info!("ticker stopped");
        });
        Ticker {
            running,
            paused,
            handle: Some(handle),
        }
    }

    /// Freezes the clocks without stopping the thread.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Stops the thread and waits for it to finish its current tick.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::SimContext;
    use crate::core::geom::Vec2;
    use crate::core::modules::ModuleKind;

    #[test]
    fn ticking_reaches_the_clocks() {
        let cx = SimContext::shared();
        let clock = cx.lock().unwrap().add_module(ModuleKind::Clock, Vec2::default());

        let mut ticker = Ticker::start(Arc::clone(&cx), Duration::from_millis(5));
        thread::sleep(Duration::from_millis(100));
        ticker.stop();

        let cx = cx.lock().unwrap();
        let phase = cx.sim.module(clock).unwrap().ports[0].value;
        assert!(!phase.is_disconnected());
    }

    #[test]
    fn pausing_freezes_the_phase() {
        let cx = SimContext::shared();
        let clock = cx.lock().unwrap().add_module(ModuleKind::Clock, Vec2::default());

        let mut ticker = Ticker::start(Arc::clone(&cx), Duration::from_millis(5));
        ticker.pause();
        assert!(ticker.is_paused());
        // Let any in-flight tick drain before sampling.
        thread::sleep(Duration::from_millis(30));

        let a = cx.lock().unwrap().sim.module(clock).unwrap().ports[0].value;
        thread::sleep(Duration::from_millis(30));
        let b = cx.lock().unwrap().sim.module(clock).unwrap().ports[0].value;
        assert_eq!(a, b);
        ticker.stop();
    }
}
