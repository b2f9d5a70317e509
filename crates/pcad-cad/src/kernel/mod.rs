//! Geometry Kernel Interface
//!
//! The kernel turns resolved ops into shapes. Shapes are opaque handles; the
//! part studio never stores them, a rebuild just forwards the plan and
//! reports what each op produced.

use std::collections::HashMap;

use thiserror::Error;

use crate::id::OpId;
use crate::studio::ResolvedOp;

/// Opaque reference to a shape owned by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub u64);

/// Error type for kernel operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Missing input shape from op {0}")]
    MissingInput(OpId),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// A solid-modeling backend
pub trait GeometryKernel {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Build one op from the shapes of its dependencies, in `deps` order
    fn build(&self, op: &ResolvedOp, inputs: &[ShapeHandle]) -> KernelResult<ShapeHandle>;
}

/// A kernel that always fails (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn build(&self, _op: &ResolvedOp, _inputs: &[ShapeHandle]) -> KernelResult<ShapeHandle> {
        Err(KernelError::KernelNotAvailable(
            "No geometry kernel available".into(),
        ))
    }
}

/// Outcome of one rebuild pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildReport {
    /// Ops in plan order with their outcome
    pub results: Vec<(OpId, KernelResult<ShapeHandle>)>,
}

impl RebuildReport {
    pub fn shape(&self, id: OpId) -> Option<ShapeHandle> {
        self.results
            .iter()
            .find(|(op, _)| *op == id)
            .and_then(|(_, r)| r.as_ref().ok().copied())
    }

    pub fn failures(&self) -> impl Iterator<Item = (OpId, &KernelError)> {
        self.results
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (*id, e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Run a plan through a kernel.
///
/// An op whose dependency did not produce a shape fails with
/// [`KernelError::MissingInput`] without reaching the kernel. Failures are
/// logged and the rest of the plan still runs.
pub fn rebuild(plan: &[ResolvedOp], kernel: &dyn GeometryKernel) -> RebuildReport {
    let mut shapes: HashMap<OpId, ShapeHandle> = HashMap::new();
    let mut report = RebuildReport::default();

    for op in plan {
        let inputs: KernelResult<Vec<ShapeHandle>> = op
            .deps
            .iter()
            .map(|dep| shapes.get(dep).copied().ok_or(KernelError::MissingInput(*dep)))
            .collect();

        let result = inputs.and_then(|inputs| kernel.build(op, &inputs));
        match &result {
            Ok(shape) => {
                shapes.insert(op.op_id, *shape);
            }
            Err(e) => {
                tracing::warn!("Op {} failed: {}", op.name, e);
            }
        }
        report.results.push((op.op_id, result));
    }

    tracing::debug!(
        "Rebuilt {} ops with {} kernel",
        report.results.len(),
        kernel.name()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{ExtrudeDirection, Profile};
    use crate::studio::{PartStudio, ResolvedKind};
    use pcad_params::{Dim, ParamEnv};
    use std::cell::Cell;

    /// Hands out sequential handles, fails on zero-depth extrudes
    #[derive(Default)]
    struct CountingKernel {
        next: Cell<u64>,
    }

    impl GeometryKernel for CountingKernel {
        fn name(&self) -> &str {
            "counting"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn build(&self, op: &ResolvedOp, inputs: &[ShapeHandle]) -> KernelResult<ShapeHandle> {
            assert_eq!(inputs.len(), op.deps.len());
            if let ResolvedKind::Extrude { depth, .. } = op.kind
                && depth == 0.0
            {
                return Err(KernelError::OperationFailed("zero depth".into()));
            }
            let id = self.next.get();
            self.next.set(id + 1);
            Ok(ShapeHandle(id))
        }
    }

    fn studio() -> (PartStudio, OpId, OpId, OpId) {
        let mut studio = PartStudio::new("Part Studio 1");
        let s1 = studio.create_sketch_op("Sketch 1", None);
        let sketch_id = studio.op(s1).and_then(|op| op.owned_sketch()).unwrap();
        let profile = Profile::Sketch { sketch_id };
        let e1 = studio.create_extrude_op(
            "Extrude 1",
            profile,
            ExtrudeDirection::Positive,
            Dim::literal(0.0),
        );
        let e2 = studio.create_extrude_op(
            "Extrude 2",
            profile,
            ExtrudeDirection::Positive,
            Dim::literal(5.0),
        );
        (studio, s1, e1, e2)
    }

    #[test]
    fn test_null_kernel_fails_every_op() {
        let (studio, ..) = studio();
        let report = rebuild(&studio.rebuild_plan(&ParamEnv::new()), &NullKernel);
        assert_eq!(report.failures().count(), 3);
        assert!(!NullKernel.is_available());
    }

    #[test]
    fn test_failure_does_not_stop_rebuild() {
        let (studio, s1, e1, e2) = studio();
        let report = rebuild(&studio.rebuild_plan(&ParamEnv::new()), &CountingKernel::default());

        assert_eq!(report.shape(s1), Some(ShapeHandle(0)));
        assert_eq!(report.shape(e1), None);
        assert_eq!(report.shape(e2), Some(ShapeHandle(1)));
        assert!(!report.is_success());
    }

    #[test]
    fn test_missing_fillet_target_reported() {
        let (mut studio, ..) = studio();
        let ghost = OpId::new();
        let f1 = studio.create_fillet_op("Fillet 1", ghost, vec![0], Dim::literal(1.0));

        let report = rebuild(&studio.rebuild_plan(&ParamEnv::new()), &CountingKernel::default());
        let failures: Vec<_> = report.failures().collect();
        let missing = KernelError::MissingInput(ghost);
        assert!(failures.contains(&(f1, &missing)));
    }

    #[test]
    fn test_missing_input_skips_kernel() {
        let (mut studio, s1, e1, e2) = studio();
        studio.set_suppressed(s1, true);

        let report = rebuild(&studio.rebuild_plan(&ParamEnv::new()), &CountingKernel::default());
        let missing = KernelError::MissingInput(s1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures, vec![(e1, &missing), (e2, &missing)]);
    }
}
