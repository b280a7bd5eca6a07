//! 变更观察器
//!
//! 防抖状态机：每观察到一次结构变更就把截止时间推迟到“现在 + 防抖窗口”，
//! 到期后 `poll` 返回一次 `true`，由调用方执行增量发现。时间由调用方传入，
//! 测试可以直接构造时间点。

use std::time::Duration;

use tokio::time::Instant;

use crate::translation::document::MutationRecord;

#[derive(Debug, Clone)]
pub struct MutationWatcher {
    debounce: Duration,
    deadline: Option<Instant>,
}

impl MutationWatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
        }
    }

    /// 记录一次变更，重新计时
    pub fn observe(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// 消费一批变更记录；没有记录时不影响计时
    pub fn observe_records(&mut self, records: &[MutationRecord], now: Instant) {
        if records.is_empty() {
            return;
        }
        tracing::trace!("观察到 {} 条结构变更", records.len());
        self.observe(now);
    }

    /// 防抖窗口是否已到期；到期时解除计时并返回 `true`
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// 尚未到期的截止时间
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn test_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut watcher = MutationWatcher::new(WINDOW);

        assert!(!watcher.poll(start));
        watcher.observe(start);
        assert_eq!(watcher.deadline(), Some(start + WINDOW));
        assert!(!watcher.poll(start + Duration::from_millis(299)));
        assert!(watcher.poll(start + WINDOW));
        assert!(!watcher.poll(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_new_mutation_restarts_window() {
        let start = Instant::now();
        let mut watcher = MutationWatcher::new(WINDOW);

        watcher.observe(start);
        watcher.observe(start + Duration::from_millis(200));
        assert!(!watcher.poll(start + Duration::from_millis(350)));
        assert!(watcher.poll(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_empty_records_do_not_arm() {
        let mut watcher = MutationWatcher::new(WINDOW);
        watcher.observe_records(&[], Instant::now());
        assert!(watcher.deadline().is_none());
    }
}
