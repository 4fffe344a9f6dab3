//! Two periodic tick streams (analysis and render) on one thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

/// Receiver of scheduler ticks
pub trait TickHandler {
    fn on_analysis_tick(&mut self);

    fn on_render_tick(&mut self);

    /// Checked between ticks; `true` ends [`Scheduler::run`]
    fn is_finished(&self) -> bool {
        false
    }
}

/// Cloneable flag that stops a running scheduler after its current tick
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Which ticks fired during one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub analysis: bool,
    pub render: bool,
}

#[derive(Debug)]
struct Timer {
    interval: Duration,
    next_due: Instant,
}

impl Timer {
    fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            next_due: start,
        }
    }

    /// Fire at most once per poll; a late timer skips missed periods
    fn fire(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }
}

/// Drives analysis and render ticks at independent rates
#[derive(Debug)]
pub struct Scheduler {
    analysis: Timer,
    render: Timer,
    stop: StopHandle,
}

impl Scheduler {
    /// Both streams fire on the first poll
    pub fn new(analysis_interval: Duration, render_interval: Duration) -> Self {
        Self::starting_at(analysis_interval, render_interval, Instant::now())
    }

    pub fn starting_at(analysis_interval: Duration, render_interval: Duration, start: Instant) -> Self {
        Self {
            analysis: Timer::new(analysis_interval.max(Duration::from_micros(100)), start),
            render: Timer::new(render_interval.max(Duration::from_micros(100)), start),
            stop: StopHandle::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Change tick rates; takes effect from each stream's next deadline
    pub fn set_intervals(&mut self, analysis_interval: Duration, render_interval: Duration) {
        self.analysis.interval = analysis_interval.max(Duration::from_micros(100));
        self.render.interval = render_interval.max(Duration::from_micros(100));
        debug!(
            "Scheduler intervals: analysis {:?}, render {:?}",
            self.analysis.interval, self.render.interval
        );
    }

    /// Run every tick due at `now`, analysis first
    pub fn poll(&mut self, now: Instant, handler: &mut impl TickHandler) -> TickReport {
        let mut report = TickReport::default();
        if self.analysis.fire(now) {
            handler.on_analysis_tick();
            report.analysis = true;
        }
        if self.render.fire(now) {
            handler.on_render_tick();
            report.render = true;
        }
        report
    }

    /// Earliest upcoming deadline of either stream
    pub fn next_deadline(&self) -> Instant {
        self.analysis.next_due.min(self.render.next_due)
    }

    /// Tick until stopped or the handler reports it is finished
    pub fn run(&mut self, handler: &mut impl TickHandler) {
        while !self.stop.is_stopped() && !handler.is_finished() {
            let now = Instant::now();
            let deadline = self.next_deadline();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            self.poll(Instant::now(), handler);
        }
        debug!("Scheduler stopped");
    }
}
