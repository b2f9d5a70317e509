//! Sketch Primitive Store
//!
//! A sketch owns its primitives in an id-keyed map and keeps a cache of
//! positions computed by an external constraint solver. The cache is derived
//! data: any geometric edit drops the entries it affects.

mod primitive;

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{PlaneId, PrimitiveId, SketchId};

pub use primitive::Primitive;

/// Sketch-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SketchError {
    #[error("Primitive not found: {0}")]
    MissingPrimitive(PrimitiveId),

    #[error("Primitive {0} is not a point")]
    NotAPoint(PrimitiveId),

    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),
}

/// Result type for sketch edits
pub type SketchResult<T> = Result<T, SketchError>;

/// Persisted form with maps as ordered lists
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SketchData {
    id: SketchId,
    name: String,
    plane_id: PlaneId,
    primitives: Vec<(PrimitiveId, Primitive)>,
    #[serde(default)]
    solved_positions: Vec<(PrimitiveId, DVec2)>,
}

impl From<Sketch> for SketchData {
    fn from(sketch: Sketch) -> Self {
        Self {
            id: sketch.id,
            name: sketch.name,
            plane_id: sketch.plane_id,
            primitives: sketch.primitives.into_iter().collect(),
            solved_positions: sketch.solved_positions.into_iter().collect(),
        }
    }
}

impl From<SketchData> for Sketch {
    fn from(data: SketchData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            plane_id: data.plane_id,
            primitives: data.primitives.into_iter().collect(),
            solved_positions: data.solved_positions.into_iter().collect(),
        }
    }
}

/// A 2D sketch on a plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SketchData", from = "SketchData")]
pub struct Sketch {
    pub id: SketchId,
    pub name: String,
    pub plane_id: PlaneId,
    primitives: BTreeMap<PrimitiveId, Primitive>,
    solved_positions: BTreeMap<PrimitiveId, DVec2>,
}

impl Sketch {
    /// Create an empty sketch on a plane
    pub fn new(name: impl Into<String>, plane_id: PlaneId) -> Self {
        Self {
            id: SketchId::new(),
            name: name.into(),
            plane_id,
            primitives: BTreeMap::new(),
            solved_positions: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    pub fn primitives(&self) -> &BTreeMap<PrimitiveId, Primitive> {
        &self.primitives
    }

    fn insert(&mut self, primitive: Primitive) -> PrimitiveId {
        let id = PrimitiveId::new();
        self.primitives.insert(id, primitive);
        id
    }

    fn require_point(&self, id: PrimitiveId) -> SketchResult<()> {
        match self.primitives.get(&id) {
            Some(p) if p.is_point() => Ok(()),
            Some(_) => Err(SketchError::NotAPoint(id)),
            None => Err(SketchError::MissingPrimitive(id)),
        }
    }

    // ============== Primitive Creation ==============

    pub fn add_point(&mut self, x: f64, y: f64) -> PrimitiveId {
        self.insert(Primitive::Point {
            x,
            y,
            construction: false,
        })
    }

    pub fn add_line(&mut self, start: PrimitiveId, end: PrimitiveId) -> SketchResult<PrimitiveId> {
        self.require_point(start)?;
        self.require_point(end)?;
        Ok(self.insert(Primitive::Line {
            start,
            end,
            construction: false,
        }))
    }

    pub fn add_circle(&mut self, center: PrimitiveId, radius: f64) -> SketchResult<PrimitiveId> {
        self.require_point(center)?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SketchError::InvalidRadius(radius));
        }
        Ok(self.insert(Primitive::Circle {
            center,
            radius,
            construction: false,
        }))
    }

    pub fn add_arc(
        &mut self,
        center: PrimitiveId,
        start: PrimitiveId,
        end: PrimitiveId,
        clockwise: bool,
    ) -> SketchResult<PrimitiveId> {
        self.require_point(center)?;
        self.require_point(start)?;
        self.require_point(end)?;
        Ok(self.insert(Primitive::Arc {
            center,
            start,
            end,
            clockwise,
            construction: false,
        }))
    }

    // ============== Editing ==============

    /// Move a point and drop the cached positions it affects
    pub fn move_point(&mut self, id: PrimitiveId, new_x: f64, new_y: f64) -> SketchResult<()> {
        match self.primitives.get_mut(&id) {
            Some(Primitive::Point { x, y, .. }) => {
                *x = new_x;
                *y = new_y;
            }
            Some(_) => return Err(SketchError::NotAPoint(id)),
            None => return Err(SketchError::MissingPrimitive(id)),
        }
        self.invalidate(id);
        Ok(())
    }

    pub fn set_construction(&mut self, id: PrimitiveId, construction: bool) -> SketchResult<()> {
        let primitive = self
            .primitives
            .get_mut(&id)
            .ok_or(SketchError::MissingPrimitive(id))?;
        primitive.set_construction(construction);
        Ok(())
    }

    /// Primitives that reference `id` directly
    pub fn referencing(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        self.primitives
            .iter()
            .filter(|(_, p)| p.references_id(id))
            .map(|(pid, _)| *pid)
            .collect()
    }

    /// Remove a primitive and everything defined by it.
    ///
    /// Returns every removed id, empty if `id` does not exist.
    pub fn remove_primitive(&mut self, id: PrimitiveId) -> Vec<PrimitiveId> {
        let mut removed = Vec::new();
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            if self.primitives.remove(&current).is_none() {
                continue;
            }
            self.solved_positions.remove(&current);
            removed.push(current);
            pending.extend(self.referencing(current));
        }

        removed
    }

    /// References to primitives that are not in this sketch
    pub fn dangling_references(&self) -> Vec<(PrimitiveId, PrimitiveId)> {
        self.primitives
            .iter()
            .flat_map(|(id, p)| {
                p.references()
                    .into_iter()
                    .filter(|r| !self.primitives.contains_key(r))
                    .map(move |r| (*id, r))
            })
            .collect()
    }

    // ============== Solved Positions ==============

    fn invalidate(&mut self, id: PrimitiveId) {
        self.solved_positions.remove(&id);
        for dependent in self.referencing(id) {
            self.solved_positions.remove(&dependent);
        }
    }

    /// Store solver output. Entries for unknown primitives are ignored.
    pub fn set_solved_positions(&mut self, positions: impl IntoIterator<Item = (PrimitiveId, DVec2)>) {
        for (id, pos) in positions {
            if self.primitives.contains_key(&id) {
                self.solved_positions.insert(id, pos);
            }
        }
    }

    pub fn solved_position(&self, id: PrimitiveId) -> Option<DVec2> {
        self.solved_positions.get(&id).copied()
    }

    pub fn solved_positions(&self) -> &BTreeMap<PrimitiveId, DVec2> {
        &self.solved_positions
    }

    /// Solved position of a point, or its stored coordinates
    pub fn position_of(&self, id: PrimitiveId) -> Option<DVec2> {
        if let Some(pos) = self.solved_position(id) {
            return Some(pos);
        }
        match self.primitives.get(&id) {
            Some(Primitive::Point { x, y, .. }) => Some(DVec2::new(*x, *y)),
            _ => None,
        }
    }

    pub fn clear_solved(&mut self) {
        self.solved_positions.clear();
    }
}
