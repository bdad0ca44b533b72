//! Count of in-flight transport requests.

use thiserror::Error;

use crate::reply::{ReplyLink, RequestState, TaskOutcome};

#[derive(Debug, Error)]
#[error("request count is less than 0")]
pub(crate) struct PendingUnderflow;

/// In-flight request count plus the replies waiting for it to drain.
#[derive(Debug, Default)]
pub(crate) struct PendingCount {
  count: usize,
  drain_waiters: Vec<ReplyLink>,
}

impl PendingCount {
  pub(crate) fn count(&self) -> usize {
    self.count
  }

  pub(crate) fn increment(&mut self) {
    self.count += 1;
  }

  /// Record one completion. Returns true when this completion drained the
  /// count, after resolving every drain waiter.
  pub(crate) fn decrement(&mut self) -> Result<bool, PendingUnderflow> {
    self.count = self.count.checked_sub(1).ok_or(PendingUnderflow)?;
    if self.count > 0 {
      return Ok(false);
    }

    for waiter in self.drain_waiters.drain(..) {
      waiter.deliver(TaskOutcome::new(RequestState::Good));
    }
    Ok(true)
  }

  /// Resolve `link` once nothing is in flight, immediately if that is now.
  pub(crate) fn wait_for_drain(&mut self, link: ReplyLink) {
    if self.count == 0 {
      link.deliver(TaskOutcome::new(RequestState::Good));
    } else {
      self.drain_waiters.push(link);
    }
  }
}
