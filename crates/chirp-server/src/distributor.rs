//! Ticket distribution: the timer-driven job that hands out rights.
//!
//! Each [`GrantSchedule`] fires once a day at a fixed UTC time. A firing
//! picks a uniform random sample of every registered identity and grants
//! each winner one right of the schedule's kind, with a notification.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use chirp_core::{
  Error,
  identity::{IdentityId, RightKind},
  notification::grant_message,
  sample::{sample, sample_size},
  store::SocialStore,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

// ─── Schedule ────────────────────────────────────────────────────────────────

/// One daily distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSchedule {
  pub right:   RightKind,
  /// Share of the population that wins, 0..=100.
  pub percent: u8,
  /// Time of day (UTC) at which the distribution runs.
  pub at:      NaiveTime,
}

impl GrantSchedule {
  /// Tweet tickets at 09:00 UTC, comment tickets at 21:00 UTC, 10% each.
  pub fn defaults() -> Vec<Self> {
    vec![
      Self {
        right:   RightKind::Tweet,
        percent: 10,
        at:      NaiveTime::MIN + TimeDelta::hours(9),
      },
      Self {
        right:   RightKind::Comment,
        percent: 10,
        at:      NaiveTime::MIN + TimeDelta::hours(21),
      },
    ]
  }
}

/// The next instant strictly after `now` whose UTC time of day is `at`.
pub fn next_firing(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
  let today = now.date_naive().and_time(at).and_utc();
  if today > now { today } else { today + TimeDelta::days(1) }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// What a single firing did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GrantReport {
  /// Identities registered when the run started.
  pub population: usize,
  /// Winners drawn.
  pub sampled:    usize,
  /// Winners whose grant was recorded.
  pub granted:    usize,
  /// Winners whose grant failed; the run carried on past them.
  pub failed:     usize,
}

// ─── Distributor ─────────────────────────────────────────────────────────────

pub struct Distributor<S> {
  store:         Arc<S>,
  store_timeout: Duration,
}

impl<S> Clone for Distributor<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), store_timeout: self.store_timeout }
  }
}

impl<S: SocialStore + 'static> Distributor<S> {
  pub fn new(store: Arc<S>, store_timeout: Duration) -> Self {
    Self { store, store_timeout }
  }

  /// Run one distribution now.
  ///
  /// Failing to list the population aborts the run. A failed grant for one
  /// winner is logged and skipped.
  pub async fn run_once(&self, schedule: &GrantSchedule) -> Result<GrantReport, Error> {
    let population: Vec<IdentityId> = self
      .bounded(self.store.list_identities())
      .await?
      .into_iter()
      .map(|identity| identity.id)
      .collect();

    let k = sample_size(population.len(), schedule.percent);
    let winners = {
      let mut rng = rand::rng();
      sample(&population, k, &mut rng)
    };

    let mut report = GrantReport {
      population: population.len(),
      sampled: winners.len(),
      ..GrantReport::default()
    };

    for id in winners {
      let grant = self.store.grant_right(id, schedule.right, grant_message(schedule.right));
      match self.bounded(grant).await {
        Ok(_) => report.granted += 1,
        Err(e) => {
          report.failed += 1;
          tracing::warn!(
            identity = id,
            right = %schedule.right,
            error = %e,
            "ticket grant failed"
          );
        }
      }
    }

    Ok(report)
  }

  /// Start a detached task that runs `schedule` every day, forever.
  pub fn spawn(&self, schedule: GrantSchedule) -> JoinHandle<()> {
    let this = self.clone();
    tokio::spawn(async move {
      loop {
        let now = Utc::now();
        let next = next_firing(now, schedule.at);
        tracing::info!(right = %schedule.right, at = %next, "next ticket distribution");
        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match this.run_once(&schedule).await {
          Ok(report) => tracing::info!(
            right = %schedule.right,
            population = report.population,
            granted = report.granted,
            failed = report.failed,
            "ticket distribution finished"
          ),
          Err(e) => tracing::error!(
            right = %schedule.right,
            error = %e,
            "ticket distribution aborted"
          ),
        }
      }
    })
  }

  async fn bounded<T, E>(
    &self,
    call: impl Future<Output = Result<T, E>>,
  ) -> Result<T, Error>
  where
    E: Into<Error>,
  {
    match tokio::time::timeout(self.store_timeout, call).await {
      Ok(result) => result.map_err(Into::into),
      Err(_) => Err(Error::Timeout),
    }
  }
}
