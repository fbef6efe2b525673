//! Capture session state machine.
//!
//! ```text
//! Idle ──open──▶ Active(Loading) ──playing──▶ Active(Ready)
//!                      │                        │    ▲
//!                      └──failure──▶ Idle       │    │ last capture
//!                                   start timed │    │
//!                                               ▼    │
//!                                   Active(Countdown) ─tick at 0─▶ capture
//! Active(*) ──close──▶ Idle
//! ```
//!
//! The machine only decides *what* happens; the controller performs the
//! capture a [`TickOutcome::Capture`] asks for.

use photobooth_common::error::{PhotoboothError, PhotoboothResult};

/// Default countdown length in ticks.
pub const DEFAULT_COUNTDOWN: u8 = 3;

/// Whether a timed capture takes one photo or fills the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Single,
    /// Filling the layout; `frames_taken` photos are already in.
    Multi { frames_taken: usize },
}

/// A countdown in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub remaining: u8,
    pub mode: CaptureMode,
}

impl Countdown {
    pub fn is_multi(&self) -> bool {
        matches!(self.mode, CaptureMode::Multi { .. })
    }

    pub fn frames_taken(&self) -> usize {
        match self.mode {
            CaptureMode::Multi { frames_taken } => frames_taken,
            CaptureMode::Single => 0,
        }
    }
}

/// Sub-state while a stream is open or opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    /// Stream requested, playback not confirmed.
    Loading,
    /// Playing and accepting captures.
    Ready,
    /// Counting down to a capture.
    Countdown(Countdown),
}

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active(ActiveState),
}

/// Where a capture goes in the photo set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// One-off capture, appended.
    Append,
    /// Multi-capture slot, overwritten.
    Slot(usize),
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting; the value is what to display.
    Counting(u8),
    /// Countdown hit zero: capture now into `target`.
    Capture {
        target: CaptureTarget,
        /// No further countdown follows.
        finished: bool,
    },
}

/// One camera-open lifecycle.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    state: SessionState,
    countdown_secs: u8,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN)
    }
}

impl CaptureSession {
    pub fn new(countdown_secs: u8) -> Self {
        Self {
            state: SessionState::Idle,
            countdown_secs: countdown_secs.max(1),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn countdown_secs(&self) -> u8 {
        self.countdown_secs
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Active(ActiveState::Loading)
    }

    /// Stream playing; a countdown in progress also counts as ready.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.state,
            SessionState::Active(ActiveState::Ready | ActiveState::Countdown(_))
        )
    }

    pub fn countdown(&self) -> Option<Countdown> {
        match self.state {
            SessionState::Active(ActiveState::Countdown(countdown)) => Some(countdown),
            _ => None,
        }
    }

    /// Idle -> Active(Loading).
    pub fn begin_open(&mut self) -> PhotoboothResult<()> {
        if self.state != SessionState::Idle {
            return Err(PhotoboothError::invalid_state(
                "camera is already open; close it first",
            ));
        }
        self.state = SessionState::Active(ActiveState::Loading);
        tracing::debug!("Session loading");
        Ok(())
    }

    /// Active(Loading) -> Active(Ready).
    pub fn mark_ready(&mut self) -> PhotoboothResult<()> {
        if !self.is_loading() {
            return Err(PhotoboothError::invalid_state(
                "camera is not waiting for playback",
            ));
        }
        self.state = SessionState::Active(ActiveState::Ready);
        tracing::info!("Session ready");
        Ok(())
    }

    /// Any state -> Idle. Returns whether the session was active.
    pub fn close(&mut self) -> bool {
        let was_active = self.is_active();
        if let Some(countdown) = self.countdown() {
            tracing::info!(
                remaining = countdown.remaining,
                "Countdown cancelled by close"
            );
        }
        self.state = SessionState::Idle;
        was_active
    }

    /// Succeeds only in Active(Ready).
    pub fn ensure_ready(&self, action: &str) -> PhotoboothResult<()> {
        match self.state {
            SessionState::Active(ActiveState::Ready) => Ok(()),
            SessionState::Active(ActiveState::Countdown(_)) => Err(
                PhotoboothError::invalid_state(format!("cannot {action} during a countdown")),
            ),
            SessionState::Active(ActiveState::Loading) => Err(PhotoboothError::invalid_state(
                format!("cannot {action} while the camera is starting"),
            )),
            SessionState::Idle => Err(PhotoboothError::invalid_state(format!(
                "cannot {action}: camera is closed"
            ))),
        }
    }

    /// Active(Countdown) -> Active(Ready). Returns whether a countdown was running.
    pub fn cancel_countdown(&mut self) -> bool {
        let Some(countdown) = self.countdown() else {
            return false;
        };
        tracing::info!(
            remaining = countdown.remaining,
            frames_taken = countdown.frames_taken(),
            "Countdown cancelled"
        );
        self.state = SessionState::Active(ActiveState::Ready);
        true
    }

    /// Active(Ready) -> Active(Countdown).
    pub fn start_countdown(&mut self, multi: bool) -> PhotoboothResult<Countdown> {
        self.ensure_ready("start a timed capture")?;
        let countdown = Countdown {
            remaining: self.countdown_secs,
            mode: if multi {
                CaptureMode::Multi { frames_taken: 0 }
            } else {
                CaptureMode::Single
            },
        };
        self.state = SessionState::Active(ActiveState::Countdown(countdown));
        tracing::info!(multi, remaining = countdown.remaining, "Countdown started");
        Ok(countdown)
    }

    /// Advance the countdown by one tick.
    ///
    /// `layout_count` is the number of photos a multi-capture must take.
    pub fn tick(&mut self, layout_count: usize) -> PhotoboothResult<TickOutcome> {
        let Some(countdown) = self.countdown() else {
            return Err(PhotoboothError::invalid_state("no countdown in progress"));
        };

        let remaining = countdown.remaining.saturating_sub(1);
        if remaining > 0 {
            self.state = SessionState::Active(ActiveState::Countdown(Countdown {
                remaining,
                ..countdown
            }));
            return Ok(TickOutcome::Counting(remaining));
        }

        let outcome = match countdown.mode {
            CaptureMode::Single => {
                self.state = SessionState::Active(ActiveState::Ready);
                TickOutcome::Capture {
                    target: CaptureTarget::Append,
                    finished: true,
                }
            }
            CaptureMode::Multi { frames_taken } if frames_taken + 1 < layout_count => {
                self.state = SessionState::Active(ActiveState::Countdown(Countdown {
                    remaining: self.countdown_secs,
                    mode: CaptureMode::Multi {
                        frames_taken: frames_taken + 1,
                    },
                }));
                TickOutcome::Capture {
                    target: CaptureTarget::Slot(frames_taken),
                    finished: false,
                }
            }
            CaptureMode::Multi { frames_taken } => {
                self.state = SessionState::Active(ActiveState::Ready);
                TickOutcome::Capture {
                    target: CaptureTarget::Slot(frames_taken),
                    finished: true,
                }
            }
        };
        tracing::debug!(?outcome, "Countdown reached zero");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session() -> CaptureSession {
        let mut session = CaptureSession::default();
        session.begin_open().unwrap();
        session.mark_ready().unwrap();
        session
    }

    #[test]
    fn open_then_ready() {
        let mut session = CaptureSession::default();
        assert_eq!(session.state(), SessionState::Idle);
        session.begin_open().unwrap();
        assert!(session.is_loading());
        assert!(!session.is_ready());
        session.mark_ready().unwrap();
        assert!(session.is_ready());
    }

    #[test]
    fn cannot_open_twice() {
        let mut session = ready_session();
        assert!(session.begin_open().is_err());
    }

    #[test]
    fn close_is_idempotent() {
        let mut session = ready_session();
        assert!(session.close());
        assert!(!session.close());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn single_countdown_captures_after_three_ticks() {
        let mut session = ready_session();
        session.start_countdown(false).unwrap();
        assert_eq!(session.tick(3).unwrap(), TickOutcome::Counting(2));
        assert_eq!(session.tick(3).unwrap(), TickOutcome::Counting(1));
        assert_eq!(
            session.tick(3).unwrap(),
            TickOutcome::Capture {
                target: CaptureTarget::Append,
                finished: true
            }
        );
        assert_eq!(session.state(), SessionState::Active(ActiveState::Ready));
    }

    #[test]
    fn multi_countdown_cycles_once_per_slot() {
        let mut session = ready_session();
        session.start_countdown(true).unwrap();

        let mut captures = Vec::new();
        let mut ticks = 0;
        while session.countdown().is_some() {
            let countdown = session.countdown().unwrap();
            assert!(countdown.frames_taken() < 3);
            if let TickOutcome::Capture { target, finished } = session.tick(3).unwrap() {
                captures.push((target, finished));
            }
            ticks += 1;
        }

        assert_eq!(ticks, 9);
        assert_eq!(
            captures,
            vec![
                (CaptureTarget::Slot(0), false),
                (CaptureTarget::Slot(1), false),
                (CaptureTarget::Slot(2), true),
            ]
        );
        assert!(session.is_ready());
    }

    #[test]
    fn countdown_resets_between_multi_frames() {
        let mut session = ready_session();
        session.start_countdown(true).unwrap();
        for _ in 0..3 {
            session.tick(4).unwrap();
        }
        let countdown = session.countdown().unwrap();
        assert_eq!(countdown.remaining, 3);
        assert_eq!(countdown.frames_taken(), 1);
    }

    #[test]
    fn captures_are_rejected_outside_ready() {
        let mut session = CaptureSession::default();
        assert!(session.ensure_ready("take a photo").is_err());
        session.begin_open().unwrap();
        assert!(session.start_countdown(false).is_err());
        session.mark_ready().unwrap();
        session.start_countdown(false).unwrap();
        assert!(session.ensure_ready("take a photo").is_err());
        assert!(session.start_countdown(true).is_err());
    }

    #[test]
    fn close_cancels_countdown() {
        let mut session = ready_session();
        session.start_countdown(true).unwrap();
        session.close();
        assert!(session.countdown().is_none());
        assert!(session.tick(3).is_err());
    }

    #[test]
    fn cancel_returns_to_ready() {
        let mut session = ready_session();
        assert!(!session.cancel_countdown());
        session.start_countdown(true).unwrap();
        session.tick(3).unwrap();
        assert!(session.cancel_countdown());
        assert_eq!(session.state(), SessionState::Active(ActiveState::Ready));
        assert!(session.start_countdown(false).is_ok());
    }

    #[test]
    fn countdown_length_is_configurable() {
        let mut session = CaptureSession::new(1);
        session.begin_open().unwrap();
        session.mark_ready().unwrap();
        session.start_countdown(false).unwrap();
        assert!(matches!(
            session.tick(1).unwrap(),
            TickOutcome::Capture { .. }
        ));
    }
}
