//! Editing session
//!
//! The single writer of a document. Every committed edit produces a new
//! snapshot in the history; the selection is transient and never recorded.

use chrono::Utc;
use pcad_cad::{
    AxisChoice, BooleanType, ExtrudeDirection, GeometryKernel, OpId, PartStudio, PartStudioId,
    PlaneId, Profile, RebuildReport, Selection, Sketch, SketchError, SketchId, rebuild,
};
use pcad_params::{Dim, ParamEditError, ParamId, SyntaxError, update_dim_value};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::document::Document;
use crate::history::History;

/// Session-related errors
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Parameter error: {0}")]
    Param(#[from] ParamEditError),

    #[error("Dimension error: {0}")]
    Dim(#[from] SyntaxError),

    #[error("Sketch error: {0}")]
    Sketch(#[from] SketchError),

    #[error("Part studio not found: {0}")]
    UnknownPartStudio(PartStudioId),

    #[error("Sketch not found: {0}")]
    UnknownSketch(SketchId),
}

/// Result type for session commands
pub type SessionResult<T> = Result<T, SessionError>;

/// A document being edited
#[derive(Debug, Clone)]
pub struct Session {
    history: History<Document>,
    selection: Selection,
    config: EngineConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    /// Start a session on a new document
    pub fn new(config: EngineConfig) -> Self {
        Self::from_document(Document::new(), config)
    }

    /// Start a session on a loaded document
    pub fn from_document(document: Document, config: EngineConfig) -> Self {
        Self {
            history: History::new(document).with_limit(config.history_limit),
            selection: Selection::new(),
            config,
        }
    }

    pub fn document(&self) -> &Document {
        self.history.present()
    }

    pub fn history(&self) -> &History<Document> {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply an edit to a copy of the present document and record it.
    ///
    /// Nothing is recorded if the edit fails or leaves the document unchanged.
    /// Part studios the edit changed get their modification time stamped.
    pub fn commit<R>(
        &mut self,
        edit: impl FnOnce(&mut Document) -> SessionResult<R>,
    ) -> SessionResult<R> {
        let present = self.history.present();
        let mut next = present.clone();
        let result = edit(&mut next)?;

        if next == *present {
            tracing::debug!("Edit left the document unchanged");
            return Ok(result);
        }

        let now = Utc::now();
        for studio in next.part_studios_mut() {
            if present.part_studio(studio.id) != Some(&*studio) {
                studio.touch(now);
            }
        }
        self.history = self.history.push(next);
        Ok(result)
    }

    fn commit_studio<R>(
        &mut self,
        studio: PartStudioId,
        edit: impl FnOnce(&mut PartStudio) -> SessionResult<R>,
    ) -> SessionResult<R> {
        self.commit(|doc| {
            let studio = doc
                .part_studio_mut(studio)
                .ok_or(SessionError::UnknownPartStudio(studio))?;
            edit(studio)
        })
    }

    /// Turn user input into a dimension against the current parameters
    pub fn dim_from_input(&self, input: &str) -> SessionResult<Dim> {
        Ok(update_dim_value(
            &Dim::default(),
            input,
            &self.document().params,
        )?)
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.history = self.history.undo();
        self.prune_selection();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.history = self.history.redo();
        self.prune_selection();
        true
    }

    fn prune_selection(&mut self) {
        let doc = self.history.present();
        self.selection
            .retain(|id| doc.part_studios().any(|s| s.contains_op(id)));
    }

    // ============== Parameters ==============

    /// Add a parameter with the configured default unit
    pub fn add_param(&mut self, name: &str, expression: &str) -> SessionResult<ParamId> {
        let unit = self.config.default_unit.clone();
        self.commit(|doc| {
            let (params, id) = doc.params.add_param(name, expression, unit)?;
            doc.params = params;
            Ok(id)
        })
    }

    pub fn update_param_expression(&mut self, id: ParamId, expression: &str) -> SessionResult<()> {
        self.commit(|doc| {
            doc.params = doc.params.update_param_expression(id, expression)?;
            Ok(())
        })
    }

    pub fn rename_param(&mut self, id: ParamId, new_name: &str) -> SessionResult<()> {
        self.commit(|doc| Ok(doc.rename_param(id, new_name)?))
    }

    pub fn remove_param(&mut self, id: ParamId) -> SessionResult<()> {
        self.commit(|doc| {
            doc.params = doc.params.remove_param(id)?;
            Ok(())
        })
    }

    // ============== Part Studios ==============

    pub fn add_part_studio(&mut self) -> SessionResult<PartStudioId> {
        self.commit(|doc| {
            let name = doc.next_part_studio_name();
            Ok(doc.add_part_studio(name))
        })
    }

    pub fn remove_part_studio(&mut self, id: PartStudioId) -> SessionResult<bool> {
        self.commit(|doc| Ok(doc.remove_part_studio(id).is_some()))
    }

    // ============== Operations ==============

    /// Add a sketch op, on the configured default plane if none is given
    pub fn create_sketch(
        &mut self,
        studio: PartStudioId,
        plane: Option<PlaneId>,
    ) -> SessionResult<OpId> {
        let plane = plane.unwrap_or(self.config.default_plane.id());
        self.commit_studio(studio, |s| {
            let name = s.next_op_name("Sketch");
            Ok(s.create_sketch_op(name, Some(plane)))
        })
    }

    pub fn create_extrude(
        &mut self,
        studio: PartStudioId,
        profile: Profile,
        direction: ExtrudeDirection,
        depth: &str,
    ) -> SessionResult<OpId> {
        let depth = self.dim_from_input(depth)?;
        self.commit_studio(studio, |s| {
            let name = s.next_op_name("Extrude");
            Ok(s.create_extrude_op(name, profile, direction, depth))
        })
    }

    /// Add a revolve op; `angle` is entered in degrees
    pub fn create_revolve(
        &mut self,
        studio: PartStudioId,
        profile: Profile,
        axis: AxisChoice,
        angle: &str,
    ) -> SessionResult<OpId> {
        let angle = self.dim_from_input(angle)?;
        self.commit_studio(studio, |s| {
            let name = s.next_op_name("Revolve");
            Ok(s.create_revolve_op(name, profile, axis, angle))
        })
    }

    pub fn create_fillet(
        &mut self,
        studio: PartStudioId,
        target_op: OpId,
        edges: Vec<u32>,
        radius: &str,
    ) -> SessionResult<OpId> {
        let radius = self.dim_from_input(radius)?;
        self.commit_studio(studio, |s| {
            let name = s.next_op_name("Fillet");
            Ok(s.create_fillet_op(name, target_op, edges, radius))
        })
    }

    pub fn create_boolean(
        &mut self,
        studio: PartStudioId,
        operation: BooleanType,
        target_op: OpId,
        tool_op: OpId,
    ) -> SessionResult<OpId> {
        self.commit_studio(studio, |s| {
            let name = s.next_op_name("Boolean");
            Ok(s.create_boolean_op(name, operation, target_op, tool_op))
        })
    }

    /// Delete an op and drop it from the selection
    pub fn delete_op(&mut self, studio: PartStudioId, op: OpId) -> SessionResult<bool> {
        let deleted = self.commit_studio(studio, |s| Ok(s.delete_op(op).is_some()))?;
        if deleted {
            self.selection.deselect(op);
        }
        Ok(deleted)
    }

    pub fn set_suppressed(
        &mut self,
        studio: PartStudioId,
        op: OpId,
        suppressed: bool,
    ) -> SessionResult<bool> {
        self.commit_studio(studio, |s| Ok(s.set_suppressed(op, suppressed)))
    }

    /// Set a dimension of an op from user input
    pub fn set_op_dim(
        &mut self,
        studio: PartStudioId,
        op: OpId,
        index: usize,
        input: &str,
    ) -> SessionResult<bool> {
        let dim = self.dim_from_input(input)?;
        self.commit_studio(studio, |s| {
            let mut found = false;
            let updated = s.update_op(op, |op| {
                if let Some(slot) = op.dims_mut().into_iter().nth(index) {
                    *slot = dim;
                    found = true;
                }
            });
            Ok(updated && found)
        })
    }

    pub fn rename_op(&mut self, studio: PartStudioId, op: OpId, name: &str) -> SessionResult<bool> {
        self.commit_studio(studio, |s| Ok(s.update_op(op, |o| o.set_name(name))))
    }

    pub fn set_timeline_position(
        &mut self,
        studio: PartStudioId,
        position: Option<usize>,
    ) -> SessionResult<()> {
        self.commit_studio(studio, |s| {
            s.set_timeline_position(position);
            Ok(())
        })
    }

    pub fn rollback_to(&mut self, studio: PartStudioId, op: OpId) -> SessionResult<bool> {
        self.commit_studio(studio, |s| Ok(s.rollback_to(op)))
    }

    // ============== Sketches ==============

    /// Edit a sketch; a failed edit records nothing
    pub fn edit_sketch<R>(
        &mut self,
        studio: PartStudioId,
        sketch: SketchId,
        edit: impl FnOnce(&mut Sketch) -> Result<R, SketchError>,
    ) -> SessionResult<R> {
        self.commit_studio(studio, |s| {
            let sketch = s
                .sketch_mut(sketch)
                .ok_or(SessionError::UnknownSketch(sketch))?;
            Ok(edit(sketch)?)
        })
    }

    // ============== Rebuild ==============

    /// Send a part studio's plan through a kernel
    pub fn rebuild(
        &self,
        studio: PartStudioId,
        kernel: &dyn GeometryKernel,
    ) -> SessionResult<RebuildReport> {
        let plan = self
            .document()
            .rebuild_plan(studio)
            .ok_or(SessionError::UnknownPartStudio(studio))?;
        Ok(rebuild(&plan, kernel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_records_history() {
        let mut session = Session::default();
        session.add_param("w", "10").unwrap();
        assert!(session.history().can_undo());
        assert_eq!(session.document().params.len(), 1);

        assert!(session.undo());
        assert!(session.document().params.is_empty());
        assert!(session.redo());
        assert_eq!(session.document().params.len(), 1);
    }

    #[test]
    fn test_failed_edit_records_nothing() {
        let mut session = Session::default();
        assert!(session.add_param("1bad", "1").is_err());
        assert!(session.add_param("ok", "1 +").is_err());
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_unchanged_edit_records_nothing() {
        let mut session = Session::default();
        let studio = session.document().default_part_studio_id();
        assert!(!session.delete_op(studio, OpId::new()).unwrap());
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_unchanged_edit_with_nan_parameter_records_nothing() {
        let mut session = Session::default();
        session.add_param("bad", "sqrt(-1)").unwrap();
        assert_eq!(session.history().past_len(), 1);

        let studio = session.document().default_part_studio_id();
        assert!(!session.delete_op(studio, OpId::new()).unwrap());
        assert_eq!(session.history().past_len(), 1);
    }

    #[test]
    fn test_commit_stamps_modified_studio() {
        let mut session = Session::default();
        let first = session.document().default_part_studio_id();
        let second = session.add_part_studio().unwrap();

        session.create_sketch(second, None).unwrap();
        let doc = session.document();
        assert!(doc.part_studio(second).unwrap().meta.modified_at.is_some());
        assert!(doc.part_studio(first).unwrap().meta.modified_at.is_none());
    }

    #[test]
    fn test_default_unit_and_plane() {
        let config = EngineConfig {
            default_unit: Some("mm".into()),
            default_plane: pcad_cad::DatumPlaneKind::YZ,
            ..Default::default()
        };
        let mut session = Session::new(config);
        let id = session.add_param("w", "2").unwrap();
        assert_eq!(
            session.document().params.get(id).unwrap().unit.as_deref(),
            Some("mm")
        );

        let studio = session.document().default_part_studio_id();
        let op = session.create_sketch(studio, None).unwrap();
        let s = session.document().part_studio(studio).unwrap();
        let sketch_id = s.op(op).and_then(|o| o.owned_sketch()).unwrap();
        assert_eq!(
            s.sketch(sketch_id).unwrap().plane_id,
            pcad_cad::DatumPlaneKind::YZ.id()
        );
    }

    #[test]
    fn test_delete_removes_from_selection() {
        let mut session = Session::default();
        let studio = session.document().default_part_studio_id();
        let op = session.create_sketch(studio, None).unwrap();
        session.selection_mut().select(op);

        assert!(session.delete_op(studio, op).unwrap());
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_undo_prunes_selection() {
        let mut session = Session::default();
        let studio = session.document().default_part_studio_id();
        let op = session.create_sketch(studio, None).unwrap();
        session.selection_mut().select(op);

        session.undo();
        assert!(!session.selection().contains(op));
    }

    #[test]
    fn test_set_op_dim() {
        let mut session = Session::default();
        let studio = session.document().default_part_studio_id();
        session.add_param("depth", "8").unwrap();
        let s1 = session.create_sketch(studio, None).unwrap();
        let sketch_id = session
            .document()
            .part_studio(studio)
            .and_then(|s| s.op(s1))
            .and_then(|o| o.owned_sketch())
            .unwrap();
        let e1 = session
            .create_extrude(
                studio,
                Profile::Sketch { sketch_id },
                ExtrudeDirection::Positive,
                "5",
            )
            .unwrap();

        assert!(session.set_op_dim(studio, e1, 0, "depth").unwrap());
        assert!(!session.set_op_dim(studio, e1, 3, "1").unwrap());
        assert!(session.set_op_dim(studio, e1, 0, "depth +").is_err());

        let plan = session.document().rebuild_plan(studio).unwrap();
        assert!(matches!(
            plan[1].kind,
            pcad_cad::ResolvedKind::Extrude { depth, .. } if depth == 8.0
        ));
    }

    #[test]
    fn test_sketch_edit_errors() {
        let mut session = Session::default();
        let studio = session.document().default_part_studio_id();

        let missing = SketchId::new();
        assert!(matches!(
            session.edit_sketch(studio, missing, |s| Ok(s.add_point(0.0, 0.0))),
            Err(SessionError::UnknownSketch(_))
        ));
        assert!(matches!(
            session.create_sketch(PartStudioId::new(), None),
            Err(SessionError::UnknownPartStudio(_))
        ));
    }
}
