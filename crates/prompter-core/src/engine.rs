//! Frame-driven scroll timing.
//!
//! The engine never owns a clock or a timer. The host asks for a frame when
//! the engine hands out a [`FrameToken`], and calls [`ScrollEngine::tick`]
//! with that token once its display is ready to present. At most one token is
//! outstanding; cancelling bumps the generation so a callback that was already
//! in flight is recognized as stale and dropped.

use crate::session::SessionState;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Distance units per millisecond at speed 1.0.
pub const SPEED_CALIBRATION: f64 = 0.06;
/// Extra scroll past the last line so it can reach the focus line.
pub const TRAILING_MARGIN: f64 = 200.0;

/// Measured layout, in distance units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub content_height: f64,
    pub viewport_height: f64,
}

impl Extent {
    pub fn max_scroll(&self) -> f64 {
        let bound = self.content_height - self.viewport_height + TRAILING_MARGIN;
        if bound.is_finite() { bound.max(0.0) } else { 0.0 }
    }
}

/// Supplies the current layout, re-measured on every frame.
pub trait Geometry {
    /// `None` while nothing is laid out (e.g. the player is not shown).
    fn measure(&self) -> Option<Extent>;
}

impl Geometry for Extent {
    fn measure(&self) -> Option<Extent> {
        Some(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken {
    generation: u64,
    frame: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Position moved; present it and request `next`.
    Advanced { position: f64, next: FrameToken },
    /// Reached the bound; playback stopped and nothing is scheduled.
    Finished { position: f64 },
    /// Loop stopped without reaching the end (paused, preview, no layout).
    Halted,
    /// Token did not belong to the live loop; nothing changed.
    Stale,
}

#[derive(Debug, Default)]
pub struct ScrollEngine {
    generation: u64,
    pending: Option<FrameToken>,
    last_frame: Option<Instant>,
}

impl ScrollEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Begin a fresh loop; the first tick measures zero elapsed time.
    pub fn start(&mut self) -> FrameToken {
        self.generation = self.generation.wrapping_add(1);
        self.last_frame = None;
        let token = FrameToken {
            generation: self.generation,
            frame: 0,
        };
        self.pending = Some(token);
        debug!(generation = self.generation, "Scroll loop started");
        token
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!(generation = self.generation, "Scroll loop cancelled");
        }
        self.generation = self.generation.wrapping_add(1);
        self.last_frame = None;
    }

    /// Advance one frame, writing bound and position into `state`.
    pub fn tick(
        &mut self,
        token: FrameToken,
        now: Instant,
        state: &mut SessionState,
        geometry: &dyn Geometry,
    ) -> TickOutcome {
        if self.pending != Some(token) {
            trace!(?token, live = ?self.pending, "Dropping stale frame");
            return TickOutcome::Stale;
        }
        self.pending = None;

        if !state.should_scroll() {
            self.cancel();
            return TickOutcome::Halted;
        }

        let Some(extent) = geometry.measure() else {
            warn!("Layout unavailable, pausing playback");
            self.cancel();
            state.pause();
            return TickOutcome::Halted;
        };
        state.update_max_scroll(extent.max_scroll());

        let elapsed_ms = self
            .last_frame
            .map(|prev| now.saturating_duration_since(prev).as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        let advanced = state.position() + state.speed() * elapsed_ms * SPEED_CALIBRATION;
        let bound = state.max_scroll();
        if advanced >= bound {
            state.finish_at_bound();
            self.last_frame = None;
            info!(position = bound, "Reached end of script");
            return TickOutcome::Finished { position: bound };
        }

        state.set_position(advanced);
        let next = FrameToken {
            generation: token.generation,
            frame: token.frame + 1,
        };
        self.pending = Some(next);
        trace!(position = advanced, bound, elapsed_ms, "Frame advanced");
        TickOutcome::Advanced {
            position: advanced,
            next,
        }
    }
}
