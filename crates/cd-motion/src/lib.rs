//! Deterministic frame/timer scheduling and scroll animation.
//!
//! The embedder owns the wall clock; the scheduler only sees the elapsed time
//! it is handed through [`Scheduler::advance`]. Frame tasks queued while a
//! batch is being processed run on the NEXT advance, which is what paces
//! frame-chained animations at one step per frame.

/// Cancellation handle for a queued animation-frame task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Cancellation handle for a pending one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone)]
struct TimerEntry<T> {
    token: TimerToken,
    deadline_ms: u64,
    seq: u64,
    task: T,
}

/// Virtual-clock scheduler for frame and timer tasks.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    frames: Vec<(FrameToken, T)>,
    timers: Vec<TimerEntry<T>>,
    next_token: u64,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            frames: Vec::new(),
            timers: Vec::new(),
            next_token: 0,
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    pub fn request_frame(&mut self, task: T) -> FrameToken {
        let token = FrameToken(self.next_token);
        self.next_token = self.next_token.saturating_add(1);
        self.frames.push((token, task));
        token
    }

    pub fn cancel_frame(&mut self, token: FrameToken) -> bool {
        let before = self.frames.len();
        self.frames.retain(|(existing, _)| *existing != token);
        self.frames.len() != before
    }

    pub fn schedule_timer(&mut self, delay_ms: u64, task: T) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token = self.next_token.saturating_add(1);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.timers.push(TimerEntry {
            token,
            deadline_ms: self.now_ms.saturating_add(delay_ms),
            seq,
            task,
        });
        token
    }

    pub fn cancel_timer(&mut self, token: TimerToken) -> bool {
        let before = self.timers.len();
        self.timers.retain(|entry| entry.token != token);
        self.timers.len() != before
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Advances the clock, then returns due timer tasks (deadline order,
    /// insertion order on ties) followed by the frame batch that was queued
    /// before this call.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<T> {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);

        let mut due: Vec<TimerEntry<T>> = Vec::new();
        let mut remaining: Vec<TimerEntry<T>> = Vec::new();
        for entry in self.timers.drain(..) {
            if entry.deadline_ms <= self.now_ms {
                due.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.timers = remaining;
        due.sort_by_key(|entry| (entry.deadline_ms, entry.seq));

        let frames = std::mem::take(&mut self.frames);

        due.into_iter()
            .map(|entry| entry.task)
            .chain(frames.into_iter().map(|(_, task)| task))
            .collect()
    }
}

/// Eased programmatic scroll toward a target offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimation {
    start: f32,
    target: f32,
    started_ms: u64,
    duration_ms: u64,
}

impl ScrollAnimation {
    pub fn new(start: f32, target: f32, started_ms: u64, duration_ms: u64) -> Self {
        Self {
            start,
            target,
            started_ms,
            duration_ms: duration_ms.max(1),
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Offset at the given clock reading. Exact at both endpoints.
    pub fn sample(&self, now_ms: u64) -> f32 {
        if now_ms <= self.started_ms {
            return self.start;
        }
        let elapsed = now_ms.saturating_sub(self.started_ms);
        if elapsed >= self.duration_ms {
            return self.target;
        }
        let progress = elapsed as f32 / self.duration_ms as f32;
        self.start + (self.target - self.start) * ease_in_out_cubic(progress)
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_ms) >= self.duration_ms
    }
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let shifted = -2.0 * t + 2.0;
        1.0 - shifted * shifted * shifted / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::ScrollAnimation;
    use super::Scheduler;

    #[test]
    fn timers_fire_in_deadline_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_timer(300, "late");
        scheduler.schedule_timer(100, "early-a");
        scheduler.schedule_timer(100, "early-b");

        assert!(scheduler.advance(50).is_empty());
        assert_eq!(scheduler.advance(50), vec!["early-a", "early-b"]);
        assert_eq!(scheduler.advance(200), vec!["late"]);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn frames_queued_during_a_batch_run_next_advance() {
        let mut scheduler = Scheduler::new();
        scheduler.request_frame(1);

        let batch = scheduler.advance(16);
        assert_eq!(batch, vec![1]);

        // A task re-queued by the batch handler waits for the next frame.
        scheduler.request_frame(2);
        assert_eq!(scheduler.advance(0), vec![2]);
        assert!(scheduler.advance(16).is_empty());
    }

    #[test]
    fn cancellation_removes_pending_work() {
        let mut scheduler = Scheduler::new();
        let frame = scheduler.request_frame("frame");
        let timer = scheduler.schedule_timer(10, "timer");

        assert!(scheduler.cancel_frame(frame));
        assert!(!scheduler.cancel_frame(frame));
        assert!(scheduler.cancel_timer(timer));
        assert!(scheduler.advance(100).is_empty());
    }

    #[test]
    fn scroll_animation_is_exact_at_endpoints() {
        let anim = ScrollAnimation::new(800.0, 0.0, 1000, 400);
        assert_eq!(anim.sample(1000), 800.0);
        assert_eq!(anim.sample(500), 800.0);
        assert_eq!(anim.sample(1400), 0.0);
        assert_eq!(anim.sample(2000), 0.0);
        assert!(anim.is_finished(1400));
        assert!(!anim.is_finished(1399));

        let midway = anim.sample(1200);
        assert!(midway > 0.0 && midway < 800.0);
    }

    #[test]
    fn scroll_animation_moves_monotonically_toward_target() {
        let anim = ScrollAnimation::new(0.0, 600.0, 0, 400);
        let mut last = 0.0_f32;
        for now in (0..=400).step_by(16) {
            let sampled = anim.sample(now);
            assert!(sampled >= last);
            last = sampled;
        }
        assert_eq!(last, 600.0);
    }
}
