//! Modeling Operations
//!
//! One step of a part studio's feature tree. Numeric fields are [`Dim`]s so
//! they can follow parameters; references to other steps are ids.

use glam::DVec3;
use pcad_params::Dim;
use serde::{Deserialize, Serialize};

use crate::id::{OpId, PlaneId, SketchId};
use crate::plane::AxisChoice;

/// A face of the shape produced by an earlier operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceRef {
    pub op_id: OpId,
    /// Index of the face within that op's result
    pub index: u32,
}

impl FaceRef {
    pub fn new(op_id: OpId, index: u32) -> Self {
        Self { op_id, index }
    }
}

/// The 2D geometry an extrude or revolve consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    /// Closed regions of a sketch
    Sketch { sketch_id: SketchId },
    /// A planar face of a previous result
    Face { face_ref: FaceRef },
}

/// Direction for extrusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrudeDirection {
    /// Extrude in the positive normal direction
    #[default]
    Positive,
    /// Extrude in the negative normal direction
    Negative,
    /// Extrude symmetrically in both directions
    Symmetric,
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BooleanType {
    #[default]
    Union,
    Subtract,
    Intersect,
}

impl BooleanType {
    pub fn name(&self) -> &'static str {
        match self {
            BooleanType::Union => "Union",
            BooleanType::Subtract => "Subtract",
            BooleanType::Intersect => "Intersect",
        }
    }
}

/// A step in the feature tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Owns a sketch placed on a plane
    Sketch {
        /// Unique identifier
        id: OpId,
        /// Name of the operation
        name: String,
        /// Sketch owned by this op
        sketch_id: SketchId,
        /// Plane the sketch lies on
        plane_ref: PlaneId,
        /// Whether the op is suppressed
        #[serde(default)]
        suppressed: bool,
    },

    /// Extrude a profile along its normal
    Extrude {
        /// Unique identifier
        id: OpId,
        /// Name of the operation
        name: String,
        /// Geometry to extrude
        profile: Profile,
        /// Extrusion direction
        direction: ExtrudeDirection,
        /// Extrusion distance
        depth: Dim,
        /// Whether the op is suppressed
        #[serde(default)]
        suppressed: bool,
    },

    /// Revolve a profile around an axis
    Revolve {
        /// Unique identifier
        id: OpId,
        /// Name of the operation
        name: String,
        /// Geometry to revolve
        profile: Profile,
        /// Axis the user picked
        axis: AxisChoice,
        /// Axis origin resolved at creation
        axis_origin: DVec3,
        /// Axis direction resolved at creation
        axis_direction: DVec3,
        /// Rotation angle in degrees, as entered
        angle: Dim,
        /// Whether the op is suppressed
        #[serde(default)]
        suppressed: bool,
    },

    /// Round edges of a previous result
    Fillet {
        /// Unique identifier
        id: OpId,
        /// Name of the operation
        name: String,
        /// Op whose result is modified
        target_op: OpId,
        /// Edge indices local to the target's result
        edges: Vec<u32>,
        /// Fillet radius
        radius: Dim,
        /// Whether the op is suppressed
        #[serde(default)]
        suppressed: bool,
    },

    /// Combine two previous results
    Boolean {
        /// Unique identifier
        id: OpId,
        /// Name of the operation
        name: String,
        /// Operation type
        operation: BooleanType,
        /// Body that is kept
        target_op: OpId,
        /// Body applied to the target
        tool_op: OpId,
        /// Whether the op is suppressed
        #[serde(default)]
        suppressed: bool,
    },
}

impl Op {
    /// Get the unique ID of this op
    pub fn id(&self) -> OpId {
        match self {
            Op::Sketch { id, .. } => *id,
            Op::Extrude { id, .. } => *id,
            Op::Revolve { id, .. } => *id,
            Op::Fillet { id, .. } => *id,
            Op::Boolean { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Op::Sketch { name, .. } => name,
            Op::Extrude { name, .. } => name,
            Op::Revolve { name, .. } => name,
            Op::Fillet { name, .. } => name,
            Op::Boolean { name, .. } => name,
        }
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self {
            Op::Sketch { name, .. }
            | Op::Extrude { name, .. }
            | Op::Revolve { name, .. }
            | Op::Fillet { name, .. }
            | Op::Boolean { name, .. } => *name = value,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Op::Sketch { .. } => "Sketch",
            Op::Extrude { .. } => "Extrude",
            Op::Revolve { .. } => "Revolve",
            Op::Fillet { .. } => "Fillet",
            Op::Boolean { .. } => "Boolean",
        }
    }

    pub fn is_suppressed(&self) -> bool {
        match self {
            Op::Sketch { suppressed, .. } => *suppressed,
            Op::Extrude { suppressed, .. } => *suppressed,
            Op::Revolve { suppressed, .. } => *suppressed,
            Op::Fillet { suppressed, .. } => *suppressed,
            Op::Boolean { suppressed, .. } => *suppressed,
        }
    }

    pub fn set_suppressed(&mut self, value: bool) {
        match self {
            Op::Sketch { suppressed, .. }
            | Op::Extrude { suppressed, .. }
            | Op::Revolve { suppressed, .. }
            | Op::Fillet { suppressed, .. }
            | Op::Boolean { suppressed, .. } => *suppressed = value,
        }
    }

    /// Sketch owned by a sketch op
    pub fn owned_sketch(&self) -> Option<SketchId> {
        match self {
            Op::Sketch { sketch_id, .. } => Some(*sketch_id),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Op::Extrude { profile, .. } | Op::Revolve { profile, .. } => Some(profile),
            _ => None,
        }
    }

    /// Other ops named by this op's own fields
    pub fn references(&self) -> Vec<OpId> {
        match self {
            Op::Extrude { profile, .. } | Op::Revolve { profile, .. } => match profile {
                Profile::Face { face_ref } => vec![face_ref.op_id],
                Profile::Sketch { .. } => Vec::new(),
            },
            Op::Fillet { target_op, .. } => vec![*target_op],
            Op::Boolean {
                target_op, tool_op, ..
            } => vec![*target_op, *tool_op],
            Op::Sketch { .. } => Vec::new(),
        }
    }

    /// Numeric fields, in declaration order
    pub fn dims(&self) -> Vec<&Dim> {
        match self {
            Op::Extrude { depth, .. } => vec![depth],
            Op::Revolve { angle, .. } => vec![angle],
            Op::Fillet { radius, .. } => vec![radius],
            Op::Sketch { .. } | Op::Boolean { .. } => Vec::new(),
        }
    }

    pub fn dims_mut(&mut self) -> Vec<&mut Dim> {
        match self {
            Op::Extrude { depth, .. } => vec![depth],
            Op::Revolve { angle, .. } => vec![angle],
            Op::Fillet { radius, .. } => vec![radius],
            Op::Sketch { .. } | Op::Boolean { .. } => Vec::new(),
        }
    }

    /// Create a new sketch op
    pub fn sketch(name: impl Into<String>, sketch_id: SketchId, plane_ref: PlaneId) -> Self {
        Op::Sketch {
            id: OpId::new(),
            name: name.into(),
            sketch_id,
            plane_ref,
            suppressed: false,
        }
    }

    /// Create a new extrude op
    pub fn extrude(
        name: impl Into<String>,
        profile: Profile,
        direction: ExtrudeDirection,
        depth: Dim,
    ) -> Self {
        Op::Extrude {
            id: OpId::new(),
            name: name.into(),
            profile,
            direction,
            depth,
            suppressed: false,
        }
    }

    /// Create a new revolve op around an already resolved axis
    pub fn revolve(
        name: impl Into<String>,
        profile: Profile,
        axis: AxisChoice,
        axis_origin: DVec3,
        axis_direction: DVec3,
        angle: Dim,
    ) -> Self {
        Op::Revolve {
            id: OpId::new(),
            name: name.into(),
            profile,
            axis,
            axis_origin,
            axis_direction,
            angle,
            suppressed: false,
        }
    }

    /// Create a new fillet op
    pub fn fillet(name: impl Into<String>, target_op: OpId, edges: Vec<u32>, radius: Dim) -> Self {
        Op::Fillet {
            id: OpId::new(),
            name: name.into(),
            target_op,
            edges,
            radius,
            suppressed: false,
        }
    }

    /// Create a new boolean op
    pub fn boolean(
        name: impl Into<String>,
        operation: BooleanType,
        target_op: OpId,
        tool_op: OpId,
    ) -> Self {
        Op::Boolean {
            id: OpId::new(),
            name: name.into(),
            operation,
            target_op,
            tool_op,
            suppressed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let mut op = Op::extrude(
            "Extrude 1",
            Profile::Sketch {
                sketch_id: SketchId::new(),
            },
            ExtrudeDirection::Symmetric,
            Dim::literal(10.0),
        );
        assert_eq!(op.type_name(), "Extrude");
        assert!(!op.is_suppressed());

        op.set_suppressed(true);
        op.set_name("Boss");
        assert!(op.is_suppressed());
        assert_eq!(op.name(), "Boss");
        assert_eq!(op.dims(), vec![&Dim::literal(10.0)]);
        assert!(op.profile().is_some());
        assert_eq!(op.owned_sketch(), None);
    }

    #[test]
    fn test_dims_mut() {
        let mut op = Op::fillet("Fillet 1", OpId::new(), vec![0, 3], Dim::literal(1.0));
        for dim in op.dims_mut() {
            dim.value = 2.0;
        }
        match op {
            Op::Fillet { radius, edges, .. } => {
                assert_eq!(radius.value, 2.0);
                assert_eq!(edges, vec![0, 3]);
            }
            _ => panic!("expected fillet"),
        }
    }

    #[test]
    fn test_boolean_has_no_dims() {
        let (target, tool) = (OpId::new(), OpId::new());
        let op = Op::boolean("Cut", BooleanType::Subtract, target, tool);
        assert!(op.dims().is_empty());
        assert!(op.profile().is_none());
        assert_eq!(op.references(), vec![target, tool]);
    }

    #[test]
    fn test_references_from_profiles() {
        let base = OpId::new();
        let on_face = Op::extrude(
            "Extrude 2",
            Profile::Face {
                face_ref: FaceRef::new(base, 4),
            },
            ExtrudeDirection::Positive,
            Dim::literal(1.0),
        );
        assert_eq!(on_face.references(), vec![base]);

        let on_sketch = Op::extrude(
            "Extrude 1",
            Profile::Sketch {
                sketch_id: SketchId::new(),
            },
            ExtrudeDirection::Positive,
            Dim::literal(1.0),
        );
        assert!(on_sketch.references().is_empty());
    }
}
