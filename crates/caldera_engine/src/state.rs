//! # Session States
//!
//! ```text
//!            start            countdown            pvp timer
//! WAITING ─────────> STARTING ─────────> ACTIVE ─────────> PVP_ENABLED
//!    ^                  │                  │  winner            │ winner
//!    │ reset            │ stop             v                    v
//!  ENDED <──────────────┴─────────────── ENDING <───────────────┘
//!                          stop (from any running state)
//! ```
//!
//! `next_state` is the whole table. Anything it returns `None` for is
//! rejected by the session.

use std::fmt;

/// Session lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session; players are in the lobby.
    #[default]
    Waiting,
    /// Players are in the arena, countdown running.
    Starting,
    /// Hazard rising, PvP off.
    Active,
    /// Hazard rising, PvP on.
    PvpEnabled,
    /// Winner announced, stop pending.
    Ending,
    /// Torn down; immediately reset to `Waiting`.
    Ended,
}

impl SessionState {
    /// Returns true while a session occupies an arena.
    ///
    /// This is the liveness gate every scheduled task runs behind.
    #[inline]
    #[must_use]
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Waiting | Self::Ended)
    }

    /// Returns true while the hazard rises.
    #[inline]
    #[must_use]
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Active | Self::PvpEnabled)
    }

    /// Upper-case state name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Starting => "STARTING",
            Self::Active => "ACTIVE",
            Self::PvpEnabled => "PVP_ENABLED",
            Self::Ending => "ENDING",
            Self::Ended => "ENDED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something that asks the session to change state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// `start()` passed its guards.
    Start,
    /// The initial countdown reached zero.
    CountdownFinished,
    /// The PvP delay elapsed.
    PvpTimerElapsed,
    /// Exactly one player is alive.
    WinnerDetected,
    /// `stop()`, the ending delay, or nobody left alive.
    Stop,
    /// Teardown finished.
    Reset,
}

/// Transition table.
#[must_use]
pub const fn next_state(from: SessionState, trigger: Trigger) -> Option<SessionState> {
    use SessionState as S;
    use Trigger as T;

    match (from, trigger) {
        (S::Waiting, T::Start) => Some(S::Starting),
        (S::Starting, T::CountdownFinished) => Some(S::Active),
        (S::Active, T::PvpTimerElapsed) => Some(S::PvpEnabled),
        (S::Active | S::PvpEnabled, T::WinnerDetected) => Some(S::Ending),
        (S::Starting | S::Active | S::PvpEnabled | S::Ending, T::Stop) => Some(S::Ended),
        (S::Ended, T::Reset) => Some(S::Waiting),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [SessionState; 6] = [
        SessionState::Waiting,
        SessionState::Starting,
        SessionState::Active,
        SessionState::PvpEnabled,
        SessionState::Ending,
        SessionState::Ended,
    ];

    #[test]
    fn test_happy_path() {
        let mut state = SessionState::Waiting;
        for trigger in [
            Trigger::Start,
            Trigger::CountdownFinished,
            Trigger::PvpTimerElapsed,
            Trigger::WinnerDetected,
            Trigger::Stop,
            Trigger::Reset,
        ] {
            state = next_state(state, trigger).unwrap();
        }
        assert_eq!(state, SessionState::Waiting);
    }

    #[test]
    fn test_stop_from_every_running_state() {
        for state in ALL_STATES {
            let next = next_state(state, Trigger::Stop);
            if state.is_running() {
                assert_eq!(next, Some(SessionState::Ended), "{state}");
            } else {
                assert_eq!(next, None, "{state}");
            }
        }
    }

    #[test]
    fn test_rejected_edges() {
        assert_eq!(next_state(SessionState::Starting, Trigger::WinnerDetected), None);
        assert_eq!(next_state(SessionState::PvpEnabled, Trigger::PvpTimerElapsed), None);
        assert_eq!(next_state(SessionState::Ending, Trigger::WinnerDetected), None);
        assert_eq!(next_state(SessionState::Active, Trigger::Start), None);
        assert_eq!(next_state(SessionState::Waiting, Trigger::Reset), None);
    }

    #[test]
    fn test_liveness() {
        assert!(!SessionState::Waiting.is_running());
        assert!(SessionState::Ending.is_running());
        assert!(!SessionState::Ended.is_running());
        assert!(SessionState::PvpEnabled.is_playing());
        assert!(!SessionState::Starting.is_playing());
    }
}
