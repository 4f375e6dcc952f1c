//! A cancellable periodic frame task, stepped by the host.
//!
//! The host calls [`FrameScheduler::advance`] once per display refresh. A
//! tick is only produced while a task is pending, so cancelling the task
//! guarantees no further ticks are handed out.

use std::time::Duration;

/// Default display refresh rate.
pub const DEFAULT_REFRESH_RATE: u32 = 60;

/// Identifies one scheduled task. Handles from cancelled tasks go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// One step of the frame clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Ticks produced since the scheduler was created.
    pub index: u64,
    /// Seconds on the frame clock at this tick.
    pub time: f32,
}

#[derive(Debug)]
pub struct FrameScheduler {
    refresh_rate: u32,
    next_id: u64,
    pending: Option<TaskHandle>,
    ticks: u64,
}

impl FrameScheduler {
    pub fn new(refresh_rate: u32) -> Self {
        Self {
            refresh_rate: refresh_rate.max(1),
            next_id: 0,
            pending: None,
            ticks: 0,
        }
    }

    pub fn refresh_rate(&self) -> u32 {
        self.refresh_rate
    }

    /// Wall time between two ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate as f64)
    }

    /// Schedule the recurring task. A task that is already pending is kept.
    pub fn request(&mut self) -> TaskHandle {
        if let Some(handle) = self.pending {
            return handle;
        }
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    /// Cancel `handle`. Returns `false` if it was not the pending task.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Produce the next tick, or `None` when nothing is scheduled.
    pub fn advance(&mut self) -> Option<FrameTick> {
        self.pending?;
        let tick = FrameTick {
            index: self.ticks,
            time: self.ticks as f32 / self.refresh_rate as f32,
        };
        self.ticks += 1;
        Some(tick)
    }

    /// Number of ticks produced so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ticks_until_requested() {
        let mut scheduler = FrameScheduler::default();
        assert!(scheduler.advance().is_none());
        scheduler.request();
        let tick = scheduler.advance().unwrap();
        assert_eq!(tick.index, 0);
        assert_eq!(tick.time, 0.0);
    }

    #[test]
    fn test_clock_follows_refresh_rate() {
        let mut scheduler = FrameScheduler::new(30);
        scheduler.request();
        let ticks: Vec<FrameTick> = (0..31).filter_map(|_| scheduler.advance()).collect();
        assert_eq!(ticks.len(), 31);
        assert!((ticks[30].time - 1.0).abs() < 1e-6);
        assert_eq!(scheduler.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let mut scheduler = FrameScheduler::default();
        let handle = scheduler.request();
        assert_eq!(scheduler.request(), handle);
        scheduler.advance();

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(!scheduler.is_pending());
        assert!(scheduler.advance().is_none());

        let next = scheduler.request();
        assert_ne!(next, handle);
        assert!(!scheduler.cancel(handle));
        assert_eq!(scheduler.advance().unwrap().index, 1);
    }
}
