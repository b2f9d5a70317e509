//! Sketch Primitives
//!
//! Lines, circles and arcs reference their defining points by id; the points
//! live in the same sketch.

use serde::{Deserialize, Serialize};

use crate::id::PrimitiveId;

/// A 2D geometric primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// A point in sketch coordinates
    Point {
        x: f64,
        y: f64,
        #[serde(default)]
        construction: bool,
    },

    /// A line segment between two points
    Line {
        start: PrimitiveId,
        end: PrimitiveId,
        #[serde(default)]
        construction: bool,
    },

    /// A full circle
    Circle {
        center: PrimitiveId,
        radius: f64,
        #[serde(default)]
        construction: bool,
    },

    /// A circular arc from `start` to `end` around `center`
    Arc {
        center: PrimitiveId,
        start: PrimitiveId,
        end: PrimitiveId,
        clockwise: bool,
        #[serde(default)]
        construction: bool,
    },
}

impl Primitive {
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Point { .. } => "Point",
            Primitive::Line { .. } => "Line",
            Primitive::Circle { .. } => "Circle",
            Primitive::Arc { .. } => "Arc",
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Primitive::Point { .. })
    }

    /// Construction geometry is excluded from profiles
    pub fn is_construction(&self) -> bool {
        match self {
            Primitive::Point { construction, .. }
            | Primitive::Line { construction, .. }
            | Primitive::Circle { construction, .. }
            | Primitive::Arc { construction, .. } => *construction,
        }
    }

    pub fn set_construction(&mut self, value: bool) {
        match self {
            Primitive::Point { construction, .. }
            | Primitive::Line { construction, .. }
            | Primitive::Circle { construction, .. }
            | Primitive::Arc { construction, .. } => *construction = value,
        }
    }

    /// Ids of the primitives this one is defined by
    pub fn references(&self) -> Vec<PrimitiveId> {
        match self {
            Primitive::Point { .. } => Vec::new(),
            Primitive::Line { start, end, .. } => vec![*start, *end],
            Primitive::Circle { center, .. } => vec![*center],
            Primitive::Arc {
                center, start, end, ..
            } => vec![*center, *start, *end],
        }
    }

    pub fn references_id(&self, id: PrimitiveId) -> bool {
        self.references().contains(&id)
    }
}
