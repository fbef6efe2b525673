//! Countdown driver: one tick per second until the countdown finishes.

use std::time::Duration;

use photobooth_capture::{CameraBackend, PreviewSurface, TickOutcome};
use photobooth_common::error::PhotoboothResult;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::booth::Photobooth;

/// Length of one countdown step.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// How a countdown run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEnd {
    /// Every scheduled capture was taken.
    Finished { captures: usize },
    /// Teardown was signalled; the camera has been closed.
    Cancelled { captures: usize },
}

impl<B: CameraBackend, S: PreviewSurface> Photobooth<B, S> {
    /// Drive the running countdown to completion.
    ///
    /// `teardown` flips to `true` (or its sender is dropped) when the view
    /// goes away; the driver then stops ticking and closes the camera so no
    /// tick acts on stale state.
    pub async fn run_countdown(
        &mut self,
        mut teardown: watch::Receiver<bool>,
    ) -> PhotoboothResult<CountdownEnd> {
        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        let mut captures = 0;
        while self.session().countdown().is_some() {
            if *teardown.borrow() {
                self.close();
                return Ok(CountdownEnd::Cancelled { captures });
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick()? {
                        TickOutcome::Counting(remaining) => {
                            tracing::debug!(remaining, "Countdown tick");
                        }
                        TickOutcome::Capture { finished, .. } => {
                            captures += 1;
                            if finished {
                                return Ok(CountdownEnd::Finished { captures });
                            }
                        }
                    }
                }
                changed = teardown.changed() => {
                    if changed.is_err() || *teardown.borrow() {
                        tracing::info!(captures, "Countdown torn down");
                        self.close();
                        return Ok(CountdownEnd::Cancelled { captures });
                    }
                }
            }
        }
        Ok(CountdownEnd::Finished { captures })
    }
}
