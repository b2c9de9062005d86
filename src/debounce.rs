use std::time::{Duration, Instant};

/// 列表过滤的静默期
pub const FILTER_QUIET: Duration = Duration::from_millis(300);
/// 搜索预览的静默期
pub const PREVIEW_QUIET: Duration = Duration::from_millis(200);

/// 单线程去抖：每次 schedule 都覆盖之前的截止时间，只有最后一次会触发。
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.wait);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// 到期返回 true 并清空
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if d <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// 距离触发还剩多久，用于事件循环的 poll 超时
    pub fn time_left(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rapid_keystrokes_collapse_into_one() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(FILTER_QUIET);
        d.schedule(t0);
        d.schedule(t0 + Duration::from_millis(100));
        d.schedule(t0 + Duration::from_millis(200));
        // 第一次的截止时间已过，但被后续覆盖
        assert!(!d.fire(t0 + Duration::from_millis(350)));
        assert!(d.fire(t0 + Duration::from_millis(500)));
        assert!(!d.fire(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn cancel_drops_pending() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(PREVIEW_QUIET);
        d.schedule(t0);
        assert!(d.is_pending());
        assert_eq!(d.time_left(t0), Some(PREVIEW_QUIET));
        d.cancel();
        assert!(!d.fire(t0 + Duration::from_secs(1)));
        assert_eq!(d.time_left(t0), None);
    }
}
