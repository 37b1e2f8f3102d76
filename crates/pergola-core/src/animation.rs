//! Animation - motion models and the per-frame session driver
//!
//! Motion is always recomputed from a part's load-time anchor, so applying
//! the same progress twice gives the same transform and nothing drifts.

use crate::classify::{AnimationGroup, GroupRole, PartRecord};
use crate::geometry::{MovementLimit, SlideParams};
use crate::types::{PanelFamily, Side};
use serde::{Deserialize, Serialize};

/// Interpolation rule of an animation group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionModel {
    /// position = initial - progress * max_movement
    Translate { axis: usize, max_movement: f32 },
    /// Stationary until `start_threshold`, then
    /// `(progress - start_threshold) * multiplier` clamped to 0..=1
    RampDelayTranslate {
        axis: usize,
        max_movement: f32,
        start_threshold: f32,
        multiplier: f32,
    },
    /// Scale shrinks 1 -> 0 along `axis`; position moves by
    /// `anchor * (1 - scale)` so the anchored edge stays put. The anchor is
    /// the bounding box max for a positive `direction`, min otherwise.
    ScaleCompensated { axis: usize, direction: f32 },
    /// rotation = initial + progress * max_angle (radians)
    Rotate { axis: usize, max_angle: f32 },
    /// No motion defined for this group
    Still,
}

impl MotionModel {
    /// Motion model of a panel group from the table rows
    pub fn for_role(role: GroupRole, limit: MovementLimit, slide: SlideParams) -> Self {
        let axis = limit.axis.index();
        match role {
            GroupRole::Door => MotionModel::Translate {
                axis,
                max_movement: limit.max_movement,
            },
            GroupRole::Normal => match slide {
                SlideParams::Ramp {
                    start_threshold,
                    multiplier,
                } => MotionModel::RampDelayTranslate {
                    axis,
                    max_movement: limit.max_movement,
                    start_threshold,
                    multiplier,
                },
                SlideParams::NotApplicable => MotionModel::Still,
            },
            GroupRole::Shrink => MotionModel::ScaleCompensated {
                axis,
                direction: 1.0,
            },
            // Louvers are driven in degrees by the structure, not by panel travel
            GroupRole::Louver => MotionModel::Still,
        }
    }

    /// Write the live transform of `part` for `progress` (clamped to 0..=1)
    pub fn apply(&self, part: &mut PartRecord, progress: f32) {
        let progress = clamp_progress(progress);
        let initial = *part.initial();
        part.live = initial;

        match *self {
            MotionModel::Translate { axis, max_movement } => {
                part.live.position[axis] = initial.position[axis] - progress * max_movement;
            }
            MotionModel::RampDelayTranslate {
                axis,
                max_movement,
                start_threshold,
                multiplier,
            } => {
                let effective = ramp_progress(progress, start_threshold, multiplier);
                part.live.position[axis] = initial.position[axis] - effective * max_movement;
            }
            MotionModel::ScaleCompensated { axis, direction } => {
                let scale = 1.0 - progress;
                let anchor = part.anchor_offset(axis, direction);
                part.live.scale[axis] = initial.scale[axis] * scale;
                part.live.position[axis] = initial.position[axis] + anchor * (1.0 - scale);
            }
            MotionModel::Rotate { axis, max_angle } => {
                part.live.rotation[axis] = initial.rotation[axis] + progress * max_angle;
            }
            MotionModel::Still => {}
        }
    }
}

/// Clamp to 0..=1; NaN counts as closed
pub fn clamp_progress(progress: f32) -> f32 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Effective progress of the ramp-delay model
pub fn ramp_progress(progress: f32, start_threshold: f32, multiplier: f32) -> f32 {
    if progress <= start_threshold {
        0.0
    } else {
        ((progress - start_threshold) * multiplier).clamp(0.0, 1.0)
    }
}

/// Map a slider value from its native 0..=100 range to progress
pub fn slider_progress(value: f32) -> f32 {
    clamp_progress(value / 100.0)
}

/// Drive every member of a group to `progress`.
/// Returns the indices of the parts that were written.
pub fn drive_group(
    parts: &mut [PartRecord],
    group: &AnimationGroup,
    model: &MotionModel,
    progress: f32,
) -> Vec<usize> {
    let mut touched = Vec::with_capacity(group.members.len());
    for &index in &group.members {
        if let Some(part) = parts.get_mut(index) {
            model.apply(part, progress);
            touched.push(index);
        }
    }
    touched
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Progress 0 -> 1
    Forward,
    /// Progress 1 -> 0
    Reverse,
}

impl Direction {
    fn flipped(&self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// What to do when a session completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    None,
    /// Play the same group back the other way
    Reverse,
}

/// Which group a session drives, and for which mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub side: Side,
    pub family: PanelFamily,
    pub role: GroupRole,
    /// Mount generation; a session of an older mount is dropped
    pub generation: u64,
}

/// One time-driven run of a group
#[derive(Debug, Clone, PartialEq)]
pub struct PlaySession {
    pub key: SessionKey,
    pub direction: Direction,
    pub duration: f32,
    pub elapsed: f32,
    pub then: Continuation,
}

impl PlaySession {
    pub fn new(key: SessionKey, direction: Direction, duration: f32, then: Continuation) -> Self {
        Self {
            key,
            direction,
            duration,
            elapsed: 0.0,
            then,
        }
    }

    /// Progress at the current elapsed time
    pub fn progress(&self) -> f32 {
        let raw = if self.duration > 0.0 {
            clamp_progress(self.elapsed / self.duration)
        } else {
            1.0
        };
        match self.direction {
            Direction::Forward => raw,
            Direction::Reverse => 1.0 - raw,
        }
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Outcome of applying one frame of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Applied,
    /// The group has no members; nothing moved but the session still runs out
    Empty,
    /// The mount this session belongs to is gone
    Stale,
}

/// Advances all active sessions by elapsed frame time
#[derive(Debug, Default)]
pub struct AnimationDriver {
    sessions: Vec<PlaySession>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, session: PlaySession) {
        tracing::debug!(
            side = %session.key.side,
            family = %session.key.family,
            role = ?session.key.role,
            direction = ?session.direction,
            "Starting animation session"
        );
        // One driver per group: a new run replaces an older one
        self.sessions.retain(|s| s.key != session.key);
        self.sessions.push(session);
    }

    /// Drop every session of a panel
    pub fn cancel_panel(&mut self, side: Side, family: PanelFamily) {
        self.sessions
            .retain(|s| !(s.key.side == side && s.key.family == family));
    }

    pub fn cancel_all(&mut self) {
        self.sessions.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_animating(&self, side: Side, family: PanelFamily) -> bool {
        self.sessions
            .iter()
            .any(|s| s.key.side == side && s.key.family == family)
    }

    pub fn sessions(&self) -> &[PlaySession] {
        &self.sessions
    }

    /// Advance every session by `dt` seconds. `apply` writes one frame of a
    /// session at a progress value. Returns the sessions that ran to
    /// completion this tick (continuations are already scheduled).
    pub fn tick<F>(&mut self, dt: f32, mut apply: F) -> Vec<SessionKey>
    where
        F: FnMut(&SessionKey, f32) -> FrameOutcome,
    {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut finished = Vec::new();
        let mut next = Vec::with_capacity(self.sessions.len());

        for mut session in self.sessions.drain(..) {
            session.elapsed += dt;
            match apply(&session.key, session.progress()) {
                FrameOutcome::Stale => {
                    tracing::debug!(
                        side = %session.key.side,
                        family = %session.key.family,
                        generation = session.key.generation,
                        "Dropping animation of a released mount"
                    );
                    continue;
                }
                FrameOutcome::Applied | FrameOutcome::Empty => {}
            }

            if !session.is_done() {
                next.push(session);
                continue;
            }

            finished.push(session.key);
            if session.then == Continuation::Reverse {
                next.push(PlaySession::new(
                    session.key,
                    session.direction.flipped(),
                    session.duration,
                    Continuation::None,
                ));
            }
        }

        self.sessions = next;
        finished
    }
}
