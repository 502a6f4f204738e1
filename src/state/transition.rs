//! The two-stage timed transition out of minimum zoom: hold, then glitch,
//! then reset + cycle. Timer scheduling goes through a host port so the
//! browser backs it with real timeouts while tests drive a fake clock.

pub type TimerHandle = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Dwell countdown at minimum zoom.
    Hold,
    /// Glitch overlay duration.
    Glitch,
}

/// Host-side one-shot timer scheduling. At most one callback is ever
/// outstanding; the session cancels before every new schedule.
pub trait TimerPort {
    fn schedule(&mut self, delay_ms: u32, kind: TimerKind) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Transition progress. A pending state owns the handle of its single live
/// timer; there is never more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    HoldPending {
        handle: TimerHandle,
    },
    GlitchPlaying {
        handle: TimerHandle,
    },
}

impl TransitionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_hold_pending(&self) -> bool {
        matches!(self, Self::HoldPending { .. })
    }

    pub fn is_glitch_playing(&self) -> bool {
        matches!(self, Self::GlitchPlaying { .. })
    }

    pub fn pending_handle(&self) -> Option<TimerHandle> {
        match *self {
            Self::Idle => None,
            Self::HoldPending { handle } | Self::GlitchPlaying { handle } => Some(handle),
        }
    }
}
