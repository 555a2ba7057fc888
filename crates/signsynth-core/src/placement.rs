//! Randomised non-overlapping placement of axis-aligned boxes on a canvas.
//!
//! The allocator draws top-left corners uniformly and keeps the first
//! candidate that clears every box already on the canvas. The search is
//! bounded: after [`DEFAULT_MAX_ATTEMPTS`] misses it reports
//! [`PlacementError::Exhausted`] and the caller decides what to do.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Attempt cap used by [`PlacementAllocator::default`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Errors raised by [`PlacementAllocator::try_place`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    /// The item cannot fit on the canvas at any position.
    #[error("item {item_width}x{item_height} does not fit on {canvas_width}x{canvas_height} canvas")]
    ItemTooLarge {
        item_width: u32,
        item_height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    /// Every attempt collided with an existing box.
    #[error("no free position found after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Canvas-relative integer rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Closed-interval AABB test: boxes that merely touch count as
    /// intersecting, so accepted placements always keep a gap.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let (ax1, ay1) = (self.x as u64, self.y as u64);
        let (bx1, by1) = (other.x as u64, other.y as u64);
        let (ax2, ay2) = (ax1 + self.width as u64, ay1 + self.height as u64);
        let (bx2, by2) = (bx1 + other.width as u64, by1 + other.height as u64);

        !(ax2 < bx1 || bx2 < ax1 || ay2 < by1 || by2 < ay1)
    }

    /// Whether the box lies entirely inside a `width x height` canvas.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    /// `[x, y, width, height]`, the order used in dataset documents.
    pub fn to_xywh(&self) -> [u32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// Bounded random search for free canvas positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementAllocator {
    pub max_attempts: u32,
}

impl Default for PlacementAllocator {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PlacementAllocator {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Find a position for an `item_width x item_height` box that does not
    /// intersect any of `existing`.
    ///
    /// # Arguments
    ///
    /// * `existing` - Boxes already placed on this canvas
    /// * `canvas_width`, `canvas_height` - Canvas size in pixels
    /// * `item_width`, `item_height` - Size of the box to place
    /// * `rng` - Random source for candidate positions
    ///
    /// # Returns
    ///
    /// The first candidate that fits inside the canvas and clears every
    /// existing box.
    ///
    /// # Errors
    ///
    /// * [`PlacementError::ItemTooLarge`] when the item exceeds the canvas,
    ///   without drawing any candidates
    /// * [`PlacementError::Exhausted`] after `max_attempts` collisions
    pub fn try_place<R: Rng + ?Sized>(
        &self,
        existing: &[BoundingBox],
        canvas_width: u32,
        canvas_height: u32,
        item_width: u32,
        item_height: u32,
        rng: &mut R,
    ) -> Result<BoundingBox, PlacementError> {
        if item_width > canvas_width || item_height > canvas_height {
            return Err(PlacementError::ItemTooLarge {
                item_width,
                item_height,
                canvas_width,
                canvas_height,
            });
        }

        for attempt in 0..self.max_attempts {
            let x = rng.random_range(0..=canvas_width - item_width);
            let y = rng.random_range(0..=canvas_height - item_height);
            let candidate = BoundingBox::new(x, y, item_width, item_height);

            if existing.iter().all(|b| !b.intersects(&candidate)) {
                trace!(attempt, x, y, "placement accepted");
                return Ok(candidate);
            }
        }

        Err(PlacementError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
