//! Repeating timer used by the cosmetic animations.
//!
//! A ticker is a plain future: it ticks until the step returns
//! [`Tick::Stop`], and it is cancelled by dropping it. Callers either race it
//! against the work it decorates or spawn it as a task they can cancel.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

/// Sleeps `period`, runs `step`, and repeats. The first tick fires one
/// period after the call, like `setInterval`.
pub async fn repeat_every<F>(period: Duration, mut step: F)
where
    F: FnMut() -> Tick,
{
    loop {
        tokio::time::sleep(period).await;
        if step() == Tick::Stop {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn stops_when_step_says_so() {
        let mut count = 0;
        repeat_every(Duration::from_millis(10), || {
            count += 1;
            if count == 3 { Tick::Stop } else { Tick::Continue }
        })
        .await;
        assert_eq!(count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_future_cancels_it() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();
        let task = tokio::spawn(repeat_every(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Tick::Continue
        }));

        tokio::time::sleep(Duration::from_millis(350)).await;
        task.abort();
        let seen = ticks.load(Ordering::SeqCst);
        assert_eq!(seen, 3);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }
}
