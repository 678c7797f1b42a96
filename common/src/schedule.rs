// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Periodic and one-shot execution of pipeline runs on a tokio runtime.
//!
//! The pipeline itself never retries. The scheduler looks at the
//! [`FetchOutcome`] of every run and decides, based on a [`RetryPolicy`],
//! whether and when to run again.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::pipeline::FetchOutcome;
use crate::widget::Trigger;

/// Exponential backoff for retryable failures.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    /// Retries after the first attempt, `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 30,
            max_backoff_secs: 5 * 60 * 60,
            max_attempts: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleDecision {
    Done,
    RetryAfter(Duration),
    GiveUp,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        let secs = self
            .initial_backoff_secs
            .saturating_mul(factor)
            .min(self.max_backoff_secs);

        Duration::from_secs(secs)
    }

    /// What to do after `outcome`, given that `retries` retries already ran.
    pub fn decide(&self, outcome: &FetchOutcome, retries: u32) -> ScheduleDecision {
        match outcome {
            FetchOutcome::Success(_) => ScheduleDecision::Done,
            FetchOutcome::PermanentFailure(_) => ScheduleDecision::GiveUp,
            FetchOutcome::RetryableFailure(_) => match self.max_attempts {
                Some(max) if retries >= max => ScheduleDecision::GiveUp,
                _ => ScheduleDecision::RetryAfter(self.backoff(retries)),
            },
        }
    }
}

pub type JobFuture = Pin<Box<dyn Future<Output = FetchOutcome> + Send>>;

/// One pipeline run, started anew for every attempt.
pub type Job = Arc<dyn Fn(Trigger) -> JobFuture + Send + Sync>;

/// Runs a [`Job`] once on demand or periodically under a unique name.
pub struct WorkScheduler {
    runtime: Handle,
    job: Job,
    policy: RetryPolicy,
    periodic: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl WorkScheduler {
    pub fn new(runtime: Handle, job: Job, policy: RetryPolicy) -> Self {
        Self {
            runtime,
            job,
            policy,
            periodic: Mutex::default(),
        }
    }

    /// Runs the job now, retrying per policy.
    pub fn enqueue_one_shot(&self, trigger: Trigger) -> JoinHandle<FetchOutcome> {
        log::debug!("Enqueue one-shot work for {trigger:?}");

        self.runtime
            .spawn(run_with_retry(self.job.clone(), trigger, self.policy.clone()))
    }

    /// Runs the job every `interval`, starting one interval from now.
    ///
    /// Enqueueing a name that is already scheduled replaces the existing work.
    pub fn enqueue_unique_periodic(&self, name: &str, interval: Duration) {
        log::debug!("Enqueue periodic work {name} every {interval:?}");

        let job = self.job.clone();
        let policy = self.policy.clone();
        let handle = self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticks = tokio::time::interval_at(start, interval);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                let outcome = run_with_retry(job.clone(), Trigger::Scheduled, policy.clone()).await;
                log::debug!("Periodic run finished: {outcome:?}");
            }
        });

        let mut periodic = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = periodic.insert(name.to_string(), handle) {
            previous.abort();
        }
    }

    pub fn cancel(&self, name: &str) -> bool {
        let mut periodic = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);

        match periodic.remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        let periodic = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);

        periodic.get(name).is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for WorkScheduler {
    fn drop(&mut self) {
        let periodic = self.periodic.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in periodic.drain() {
            handle.abort();
        }
    }
}

async fn run_with_retry(job: Job, trigger: Trigger, policy: RetryPolicy) -> FetchOutcome {
    let mut retries = 0;

    loop {
        let outcome = job(trigger).await;

        match policy.decide(&outcome, retries) {
            ScheduleDecision::Done => return outcome,
            ScheduleDecision::GiveUp => {
                log::warn!("Giving up after {retries} retries: {outcome:?}");
                return outcome;
            }
            ScheduleDecision::RetryAfter(delay) => {
                log::info!("Retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                retries += 1;
            }
        }
    }
}
