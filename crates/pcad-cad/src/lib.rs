//! Feature Tree and Sketch System
//!
//! This crate provides:
//! - Modeling operations (sketch, extrude, revolve, fillet, boolean)
//! - The per-part operation graph with creation order and timeline rollback
//! - Datum planes and revolve axis resolution
//! - 2D sketch primitives with a solved-position cache
//! - The geometry kernel interface and rebuild driver

pub mod id;
pub mod kernel;
pub mod op;
pub mod plane;
pub mod sketch;
pub mod studio;

// Re-exports for convenience
pub use id::{OpId, PartStudioId, PlaneId, PrimitiveId, SketchId};
pub use kernel::{
    GeometryKernel, KernelError, KernelResult, NullKernel, RebuildReport, ShapeHandle, rebuild,
};
pub use op::{BooleanType, ExtrudeDirection, FaceRef, Op, Profile};
pub use plane::{Axis3D, AxisChoice, DatumPlaneKind, Plane, resolve_axis};
pub use sketch::{Primitive, Sketch, SketchError, SketchResult};
pub use studio::{OpGraphNode, PartStudio, ResolvedKind, ResolvedOp, Selection, StudioMeta};
