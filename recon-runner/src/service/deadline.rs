//! Watch deadline
//!
//! One monotonic start instant with three named thresholds. The watcher
//! derives every timer it waits on from this value, so the tiers can never
//! disagree about when the watch began.

use recon_core::domain::job::JobStatus;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::WatchBudget;

/// Named timeout tier of a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Threshold {
    Soft,
    Hard,
    Absolute,
}

impl Threshold {
    /// Synthetic status a watch resolves with when this tier expires
    pub fn status(&self) -> JobStatus {
        match self {
            Threshold::Soft => JobStatus::Timeout,
            Threshold::Hard => JobStatus::HardTimeout,
            Threshold::Absolute => JobStatus::AbsoluteTimeout,
        }
    }
}

/// Deadline of a single watch
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: WatchBudget,
}

impl Deadline {
    /// Starts the clock now
    pub fn start(budget: WatchBudget) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Length of a tier, measured from the start
    pub fn limit(&self, threshold: Threshold) -> Duration {
        match threshold {
            Threshold::Soft => self.budget.soft_timeout,
            Threshold::Hard => self.budget.hard_timeout,
            Threshold::Absolute => self.budget.absolute_timeout,
        }
    }

    /// Instant at which a tier expires
    pub fn at(&self, threshold: Threshold) -> Instant {
        self.started + self.limit(threshold)
    }

    /// Most severe tier already expired at `now`
    pub fn expired(&self, now: Instant) -> Option<Threshold> {
        [Threshold::Absolute, Threshold::Hard, Threshold::Soft]
            .into_iter()
            .find(|threshold| now >= self.at(*threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expired_reports_most_severe_tier() {
        let deadline = Deadline::start(WatchBudget::default());
        let start = deadline.started();

        assert_eq!(deadline.expired(start), None);
        assert_eq!(
            deadline.expired(start + Duration::from_secs(599)),
            None
        );
        assert_eq!(
            deadline.expired(start + Duration::from_secs(600)),
            Some(Threshold::Soft)
        );
        assert_eq!(
            deadline.expired(start + Duration::from_secs(900)),
            Some(Threshold::Hard)
        );
        assert_eq!(
            deadline.expired(start + Duration::from_secs(3600)),
            Some(Threshold::Absolute)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_follows_paused_clock() {
        let deadline = Deadline::start(WatchBudget::default());
        tokio::time::advance(Duration::from_secs(42)).await;

        assert!(deadline.elapsed() >= Duration::from_secs(42));
        assert_eq!(
            deadline.at(Threshold::Hard) - deadline.started(),
            Duration::from_secs(900)
        );
    }

    #[test]
    fn test_threshold_statuses_are_distinct() {
        assert_eq!(Threshold::Soft.status(), JobStatus::Timeout);
        assert_eq!(Threshold::Hard.status(), JobStatus::HardTimeout);
        assert_eq!(Threshold::Absolute.status(), JobStatus::AbsoluteTimeout);
    }
}
