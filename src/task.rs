//! Background work polled from the UI tick.
//!
//! The event loop never awaits network or timer futures directly. Work is
//! spawned onto the runtime and its result is picked up with a non-blocking
//! `poll()` on the next tick, in the same spirit as the list views' render
//! loop: state changes only ever happen on the UI task.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// State of a spawned task as seen from the UI.
#[derive(Debug, PartialEq, Eq)]
pub enum TaskPoll<T> {
  /// Still running
  Pending,
  /// Finished with a value
  Ready(T),
  /// Ended without producing a value (panicked or aborted)
  Lost,
}

/// A single spawned future whose output is collected by polling.
///
/// Dropping the handle aborts the task.
pub struct Pending<T> {
  receiver: mpsc::UnboundedReceiver<T>,
  handle: JoinHandle<()>,
}

impl<T: Send + 'static> Pending<T> {
  pub fn spawn<Fut>(future: Fut) -> Self
  where
    Fut: Future<Output = T> + Send + 'static,
  {
    let (tx, receiver) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
      // Receiver may be gone if the view was closed
      let _ = tx.send(future.await);
    });

    Self { receiver, handle }
  }

  /// Check for the result without blocking.
  pub fn poll(&mut self) -> TaskPoll<T> {
    match self.receiver.try_recv() {
      Ok(value) => TaskPoll::Ready(value),
      Err(mpsc::error::TryRecvError::Empty) => TaskPoll::Pending,
      Err(mpsc::error::TryRecvError::Disconnected) => TaskPoll::Lost,
    }
  }
}

impl<T> Drop for Pending<T> {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// Delivers only the last value scheduled within a quiet period.
///
/// Each `schedule` cancels the previous timer task and starts a new one.
/// Values are tagged with a generation so a timer that fired just before
/// being cancelled can never deliver a superseded value.
pub struct Debouncer<T> {
  delay: Duration,
  generation: u64,
  timer: Option<JoinHandle<()>>,
  tx: mpsc::UnboundedSender<(u64, T)>,
  rx: mpsc::UnboundedReceiver<(u64, T)>,
}

impl<T: Send + 'static> Debouncer<T> {
  pub fn new(delay: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      delay,
      generation: 0,
      timer: None,
      tx,
      rx,
    }
  }

  /// Schedule `value`, replacing anything not yet delivered.
  pub fn schedule(&mut self, value: T) {
    self.cancel();

    let generation = self.generation;
    let delay = self.delay;
    let tx = self.tx.clone();
    self.timer = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let _ = tx.send((generation, value));
    }));
  }

  /// Drop the pending value, if any.
  pub fn cancel(&mut self) {
    if let Some(timer) = self.timer.take() {
      timer.abort();
    }
    self.generation += 1;
  }

  /// Take the value whose quiet period has elapsed, if any.
  pub fn poll(&mut self) -> Option<T> {
    let mut latest = None;
    while let Ok((generation, value)) = self.rx.try_recv() {
      if generation == self.generation {
        latest = Some(value);
      }
    }
    if latest.is_some() {
      self.timer = None;
    }
    latest
  }

  #[cfg(test)]
  fn is_pending(&self) -> bool {
    self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
  }
}

impl<T> Drop for Debouncer<T> {
  fn drop(&mut self) {
    if let Some(timer) = self.timer.take() {
      timer.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_pending_delivers_result() {
    let mut task = Pending::spawn(async { 7 });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(task.poll(), TaskPoll::Ready(7));
  }

  #[tokio::test]
  async fn test_pending_before_completion() {
    let mut task = Pending::spawn(async {
      tokio::time::sleep(Duration::from_millis(200)).await;
      1
    });
    assert_eq!(task.poll(), TaskPoll::Pending);
  }

  #[tokio::test]
  async fn test_panicking_task_is_lost() {
    let mut task: Pending<i32> = Pending::spawn(async { panic!("boom") });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(task.poll(), TaskPoll::Lost);
  }

  #[tokio::test]
  async fn test_debouncer_delivers_only_last_value_in_burst() {
    let mut debouncer = Debouncer::new(Duration::from_millis(30));
    debouncer.schedule("j".to_string());
    debouncer.schedule("jo".to_string());
    debouncer.schedule("joh".to_string());
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.poll(), None);

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(debouncer.poll().as_deref(), Some("joh"));
    assert_eq!(debouncer.poll(), None);
    assert!(!debouncer.is_pending());
  }

  #[tokio::test]
  async fn test_debouncer_restarts_quiet_period() {
    let mut debouncer = Debouncer::new(Duration::from_millis(50));
    debouncer.schedule(1);
    tokio::time::sleep(Duration::from_millis(30)).await;
    debouncer.schedule(2);
    tokio::time::sleep(Duration::from_millis(30)).await;

    // 60ms since the first value, but only 30ms since the second
    assert_eq!(debouncer.poll(), None);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(debouncer.poll(), Some(2));
  }

  #[tokio::test]
  async fn test_cancel_drops_pending_value() {
    let mut debouncer = Debouncer::new(Duration::from_millis(10));
    debouncer.schedule(1);
    debouncer.cancel();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(debouncer.poll(), None);
  }

  #[tokio::test]
  async fn test_fired_but_superseded_value_is_ignored() {
    let mut debouncer = Debouncer::new(Duration::from_millis(5));
    debouncer.schedule(1);
    tokio::time::sleep(Duration::from_millis(30)).await;

    // First value is sitting in the channel; a new schedule supersedes it
    debouncer.schedule(2);
    assert_eq!(debouncer.poll(), None);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(debouncer.poll(), Some(2));
  }
}
