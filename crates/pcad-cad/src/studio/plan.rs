//! Rebuild plan
//!
//! The part studio as the geometry kernel sees it: ops before the timeline
//! cutoff, suppressed ones skipped, every dimension reduced to a number.

use glam::DVec2;
use pcad_params::{ParamEnv, eval_dim_value};

use super::PartStudio;
use crate::id::{OpId, PrimitiveId, SketchId};
use crate::op::{BooleanType, ExtrudeDirection, Op, Profile};
use crate::plane::{Axis3D, Plane};
use crate::sketch::Primitive;

/// Numeric inputs of one op
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedKind {
    Sketch {
        sketch_id: SketchId,
        plane: Plane,
        primitives: Vec<(PrimitiveId, Primitive)>,
        solved_positions: Vec<(PrimitiveId, DVec2)>,
    },
    Extrude {
        profile: Profile,
        direction: ExtrudeDirection,
        depth: f64,
    },
    Revolve {
        profile: Profile,
        axis: Axis3D,
        /// Radians
        angle: f64,
    },
    Fillet {
        target_op: OpId,
        edges: Vec<u32>,
        radius: f64,
    },
    Boolean {
        operation: BooleanType,
        target_op: OpId,
        tool_op: OpId,
    },
}

/// An op ready to be handed to a kernel
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOp {
    pub op_id: OpId,
    pub name: String,
    pub deps: Vec<OpId>,
    pub kind: ResolvedKind,
}

impl PartStudio {
    /// Resolve the visible, unsuppressed ops in order
    pub fn rebuild_plan(&self, env: &ParamEnv) -> Vec<ResolvedOp> {
        self.effective_ops()
            .filter(|node| !node.op.is_suppressed())
            .filter_map(|node| {
                let kind = self.resolve_kind(&node.op, env)?;
                Some(ResolvedOp {
                    op_id: node.op.id(),
                    name: node.op.name().to_string(),
                    deps: node.inputs(),
                    kind,
                })
            })
            .collect()
    }

    fn resolve_kind(&self, op: &Op, env: &ParamEnv) -> Option<ResolvedKind> {
        let kind = match op {
            Op::Sketch {
                sketch_id,
                plane_ref,
                ..
            } => {
                let Some(sketch) = self.sketch(*sketch_id) else {
                    tracing::debug!("Sketch op {} has no sketch", op.name());
                    return None;
                };
                let plane = self.plane(*plane_ref).cloned().unwrap_or_else(Plane::xy);
                ResolvedKind::Sketch {
                    sketch_id: *sketch_id,
                    plane,
                    primitives: sketch
                        .primitives()
                        .iter()
                        .map(|(id, p)| (*id, p.clone()))
                        .collect(),
                    solved_positions: sketch
                        .solved_positions()
                        .iter()
                        .map(|(id, pos)| (*id, *pos))
                        .collect(),
                }
            }
            Op::Extrude {
                profile,
                direction,
                depth,
                ..
            } => ResolvedKind::Extrude {
                profile: *profile,
                direction: *direction,
                depth: eval_dim_value(depth, env),
            },
            Op::Revolve {
                profile,
                axis_origin,
                axis_direction,
                angle,
                ..
            } => ResolvedKind::Revolve {
                profile: *profile,
                axis: Axis3D::new(*axis_origin, *axis_direction),
                angle: eval_dim_value(angle, env).to_radians(),
            },
            Op::Fillet {
                target_op,
                edges,
                radius,
                ..
            } => ResolvedKind::Fillet {
                target_op: *target_op,
                edges: edges.clone(),
                radius: eval_dim_value(radius, env),
            },
            Op::Boolean {
                operation,
                target_op,
                tool_op,
                ..
            } => ResolvedKind::Boolean {
                operation: *operation,
                target_op: *target_op,
                tool_op: *tool_op,
            },
        };
        Some(kind)
    }
}
