use std::time::Duration;

use crate::models::{Decision, SwipeLabel};

/// Horizontal displacement a release must strictly exceed to commit
pub const SWIPE_THRESHOLD: f64 = 150.0;

/// Off-screen offset a committed card snaps to
pub const EXIT_OFFSET: f64 = 500.0;

/// Length of the exit animation before the card is removed
pub const EXIT_DURATION: Duration = Duration::from_millis(400);

/// Degrees of rotation at a full card-width of horizontal drag
pub const MAX_ROTATION_DEGREES: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn from_offset(dx: f64) -> Option<Self> {
        if dx > 0.0 {
            Some(SwipeDirection::Right)
        } else if dx < 0.0 {
            Some(SwipeDirection::Left)
        } else {
            None
        }
    }

    pub fn exit_offset(&self) -> f64 {
        match self {
            SwipeDirection::Left => -EXIT_OFFSET,
            SwipeDirection::Right => EXIT_OFFSET,
        }
    }
}

impl From<SwipeDirection> for Decision {
    fn from(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Right => Decision::Liked,
            SwipeDirection::Left => Decision::Disliked,
        }
    }
}

impl From<Decision> for SwipeDirection {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Liked => SwipeDirection::Right,
            Decision::Disliked => SwipeDirection::Left,
        }
    }
}

/// Classify a drag release by its horizontal displacement.
///
/// Exactly-threshold displacement does not commit.
#[inline]
pub fn classify_release(dx: f64) -> Option<SwipeDirection> {
    if dx > SWIPE_THRESHOLD {
        Some(SwipeDirection::Right)
    } else if dx < -SWIPE_THRESHOLD {
        Some(SwipeDirection::Left)
    } else {
        None
    }
}

/// Cosmetic rotation for a card of `width` dragged by `dx`, anchored at the bottom edge
#[inline]
pub fn rotation_degrees(dx: f64, width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    dx / width * MAX_ROTATION_DEGREES
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Translation {
    pub dx: f64,
    pub dy: f64,
}

impl Translation {
    pub const ZERO: Translation = Translation { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Transient state of the top card
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwipeState {
    pub translation: Translation,
    /// Pending forced-swipe target, cleared once observed
    pub forced_offset: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipePhase {
    Idle,
    Dragging,
    Committing(SwipeDirection),
    Completed(SwipeDirection),
}

impl SwipePhase {
    pub fn name(&self) -> &'static str {
        match self {
            SwipePhase::Idle => "idle",
            SwipePhase::Dragging => "dragging",
            SwipePhase::Committing(_) => "committing",
            SwipePhase::Completed(_) => "completed",
        }
    }
}

/// What a drag release turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Commit(SwipeDirection),
    /// Below threshold; the card animates back to the origin
    SnapBack,
    /// No drag in progress
    Ignored,
}

/// Gesture state machine for the top card
#[derive(Debug, Clone, Default)]
pub struct SwipeInterpreter {
    state: SwipeState,
    phase: Option<SwipePhase>,
}

impl SwipeInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SwipePhase {
        self.phase.unwrap_or(SwipePhase::Idle)
    }

    pub fn state(&self) -> &SwipeState {
        &self.state
    }

    pub fn translation(&self) -> Translation {
        self.state.translation
    }

    /// Cards that are leaving no longer accept gestures
    pub fn is_locked(&self) -> bool {
        matches!(
            self.phase(),
            SwipePhase::Committing(_) | SwipePhase::Completed(_)
        )
    }

    /// Live drag update. Returns false if the card is already leaving.
    pub fn drag_changed(&mut self, translation: Translation) -> bool {
        if self.is_locked() {
            return false;
        }
        // Gesture translations are relative to where the drag started
        self.state.translation = translation;
        self.phase = Some(SwipePhase::Dragging);
        true
    }

    pub fn drag_ended(&mut self) -> Release {
        if self.phase() != SwipePhase::Dragging {
            return Release::Ignored;
        }

        match classify_release(self.state.translation.dx) {
            Some(direction) => {
                self.begin_commit(direction, direction.exit_offset());
                Release::Commit(direction)
            }
            None => {
                self.state.translation = Translation::ZERO;
                self.phase = Some(SwipePhase::Idle);
                Release::SnapBack
            }
        }
    }

    /// External control sets a target offset for this card
    pub fn set_forced(&mut self, offset: f64) {
        self.state.forced_offset = Some(offset);
    }

    /// Consume the forced-swipe signal, if any, and jump straight to committing.
    ///
    /// The signal is cleared whether or not it could be honored so the same
    /// command can fire again later.
    pub fn observe_forced(&mut self) -> Option<SwipeDirection> {
        let offset = self.state.forced_offset.take()?;
        if self.is_locked() {
            return None;
        }
        let direction = SwipeDirection::from_offset(offset)?;
        self.begin_commit(direction, offset);
        Some(direction)
    }

    /// Exit animation finished
    pub fn finish(&mut self) -> Option<SwipeDirection> {
        match self.phase() {
            SwipePhase::Committing(direction) => {
                self.phase = Some(SwipePhase::Completed(direction));
                Some(direction)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> Option<SwipeLabel> {
        let dx = self.state.translation.dx;
        if dx > 0.0 {
            Some(SwipeLabel::Like)
        } else if dx < 0.0 {
            Some(SwipeLabel::Nope)
        } else {
            None
        }
    }

    pub fn rotation(&self, width: f64) -> f64 {
        rotation_degrees(self.state.translation.dx, width)
    }

    /// Fresh state for the next top card
    pub fn reset(&mut self) {
        self.state = SwipeState::default();
        self.phase = None;
    }

    fn begin_commit(&mut self, direction: SwipeDirection, offset: f64) {
        self.state.translation = Translation::new(offset, 0.0);
        self.phase = Some(SwipePhase::Committing(direction));
    }
}
