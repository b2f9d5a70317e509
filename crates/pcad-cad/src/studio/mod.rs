//! Part Studio
//!
//! The operation graph of one part: every op keyed by id with its dependency
//! edges, the linear order ops were created in, the sketches owned by sketch
//! ops and the planes sketches sit on.
//!
//! Edits that name a missing op log at debug level and do nothing.

mod plan;
mod selection;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use pcad_params::{Dim, ParamEnv, eval_dim_value};
use serde::{Deserialize, Serialize};

use crate::id::{OpId, PartStudioId, PlaneId, SketchId};
use crate::op::{BooleanType, ExtrudeDirection, Op, Profile};
use crate::plane::{AxisChoice, DatumPlaneKind, Plane, resolve_axis};
use crate::sketch::Sketch;

pub use plan::{ResolvedKind, ResolvedOp};
pub use selection::Selection;

/// An op and the ops it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpGraphNode {
    pub op: Op,
    pub deps: Vec<OpId>,
}

impl OpGraphNode {
    /// `deps` followed by any op the op's own fields name that `deps` lacks
    pub fn inputs(&self) -> Vec<OpId> {
        let mut inputs = self.deps.clone();
        for id in self.op.references() {
            if !inputs.contains(&id) {
                inputs.push(id);
            }
        }
        inputs
    }
}

/// Bookkeeping that is not part of the model itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioMeta {
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Persisted form: maps as key-value lists, op nodes in creation order
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PartStudioData {
    id: PartStudioId,
    name: String,
    op_graph: Vec<(OpId, OpGraphNode)>,
    sketches: Vec<(SketchId, Sketch)>,
    planes: Vec<(PlaneId, Plane)>,
    #[serde(default)]
    timeline_position: Option<usize>,
    #[serde(default)]
    meta: StudioMeta,
}

impl From<PartStudio> for PartStudioData {
    fn from(mut studio: PartStudio) -> Self {
        let op_graph = studio
            .op_order
            .iter()
            .filter_map(|id| studio.op_graph.remove(id).map(|node| (*id, node)))
            .collect();

        let mut sketches: Vec<_> = studio.sketches.into_iter().collect();
        sketches.sort_by_key(|(id, _)| *id);

        Self {
            id: studio.id,
            name: studio.name,
            op_graph,
            sketches,
            planes: studio.planes.into_iter().collect(),
            timeline_position: studio.timeline_position,
            meta: studio.meta,
        }
    }
}

impl From<PartStudioData> for PartStudio {
    fn from(data: PartStudioData) -> Self {
        let op_order = data.op_graph.iter().map(|(id, _)| *id).collect();
        let mut studio = Self {
            id: data.id,
            name: data.name,
            op_graph: data.op_graph.into_iter().collect(),
            op_order,
            sketches: data.sketches.into_iter().collect(),
            planes: data.planes.into_iter().collect(),
            timeline_position: None,
            meta: data.meta,
        };
        studio.ensure_datum_planes();
        studio.set_timeline_position(data.timeline_position);
        studio
    }
}

/// One part's feature tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PartStudioData", from = "PartStudioData")]
pub struct PartStudio {
    pub id: PartStudioId,
    pub name: String,
    op_graph: HashMap<OpId, OpGraphNode>,
    /// Creation order; always a permutation of `op_graph`'s keys
    op_order: Vec<OpId>,
    sketches: HashMap<SketchId, Sketch>,
    planes: BTreeMap<PlaneId, Plane>,
    /// Number of ops in `op_order` that are evaluated (None = all)
    timeline_position: Option<usize>,
    pub meta: StudioMeta,
}

impl PartStudio {
    /// Create an empty part studio with the world datum planes
    pub fn new(name: impl Into<String>) -> Self {
        let mut studio = Self {
            id: PartStudioId::new(),
            name: name.into(),
            op_graph: HashMap::new(),
            op_order: Vec::new(),
            sketches: HashMap::new(),
            planes: BTreeMap::new(),
            timeline_position: None,
            meta: StudioMeta::default(),
        };
        studio.ensure_datum_planes();
        studio
    }

    fn ensure_datum_planes(&mut self) {
        for kind in DatumPlaneKind::all() {
            self.planes
                .entry(kind.id())
                .or_insert_with(|| Plane::datum(kind));
        }
    }

    pub fn len(&self) -> usize {
        self.op_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.op_order.is_empty()
    }

    /// Record that the studio changed
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.meta.modified_at = Some(now);
    }

    /// "Extrude 3" style name for the next op of a kind
    pub fn next_op_name(&self, type_name: &str) -> String {
        let count = self
            .op_graph
            .values()
            .filter(|node| node.op.type_name() == type_name)
            .count();
        format!("{} {}", type_name, count + 1)
    }

    // ============== Queries ==============

    pub fn op(&self, id: OpId) -> Option<&Op> {
        self.op_graph.get(&id).map(|node| &node.op)
    }

    pub fn node(&self, id: OpId) -> Option<&OpGraphNode> {
        self.op_graph.get(&id)
    }

    pub fn contains_op(&self, id: OpId) -> bool {
        self.op_graph.contains_key(&id)
    }

    pub fn op_order(&self) -> &[OpId] {
        &self.op_order
    }

    pub fn index_of(&self, id: OpId) -> Option<usize> {
        self.op_order.iter().position(|o| *o == id)
    }

    /// Every node in creation order
    pub fn ops(&self) -> impl Iterator<Item = &OpGraphNode> {
        self.op_order.iter().filter_map(|id| self.op_graph.get(id))
    }

    pub fn sketch(&self, id: SketchId) -> Option<&Sketch> {
        self.sketches.get(&id)
    }

    pub fn sketch_mut(&mut self, id: SketchId) -> Option<&mut Sketch> {
        self.sketches.get_mut(&id)
    }

    pub fn sketches(&self) -> &HashMap<SketchId, Sketch> {
        &self.sketches
    }

    /// The sketch op that owns `sketch_id`
    pub fn sketch_op_for(&self, sketch_id: SketchId) -> Option<OpId> {
        self.op_graph
            .values()
            .find(|node| node.op.owned_sketch() == Some(sketch_id))
            .map(|node| node.op.id())
    }

    pub fn plane(&self, id: PlaneId) -> Option<&Plane> {
        self.planes.get(&id)
    }

    pub fn planes(&self) -> &BTreeMap<PlaneId, Plane> {
        &self.planes
    }

    /// Add a construction plane
    pub fn add_plane(&mut self, plane: Plane) -> PlaneId {
        let id = plane.id;
        self.planes.insert(id, plane);
        id
    }

    /// Ops that list `id` among their dependencies, in creation order
    pub fn dependents_of(&self, id: OpId) -> Vec<OpId> {
        self.ops()
            .filter(|node| node.deps.contains(&id))
            .map(|node| node.op.id())
            .collect()
    }

    /// `(op, missing input)` pairs, from deletions or from ops created
    /// against ids that never existed
    pub fn dangling_dependencies(&self) -> Vec<(OpId, OpId)> {
        self.ops()
            .flat_map(|node| {
                let id = node.op.id();
                node.inputs()
                    .into_iter()
                    .filter(|dep| !self.op_graph.contains_key(dep))
                    .map(move |dep| (id, dep))
            })
            .collect()
    }

    // ============== Creation ==============

    fn insert_op(&mut self, op: Op, deps: Vec<OpId>) -> OpId {
        let id = op.id();
        if self.timeline_position.take().is_some() {
            tracing::debug!("Timeline returned to end for new op {}", op.name());
        }
        self.op_graph.insert(id, OpGraphNode { op, deps });
        self.op_order.push(id);
        id
    }

    /// Keep only dependencies that exist
    fn existing_deps(&self, candidates: &[OpId]) -> Vec<OpId> {
        let mut deps = Vec::with_capacity(candidates.len());
        for id in candidates {
            if !self.op_graph.contains_key(id) {
                tracing::debug!("Dropping missing dependency {}", id);
            } else if !deps.contains(id) {
                deps.push(*id);
            }
        }
        deps
    }

    fn profile_dep(&self, profile: &Profile) -> Vec<OpId> {
        match profile {
            Profile::Sketch { sketch_id } => match self.sketch_op_for(*sketch_id) {
                Some(op_id) => vec![op_id],
                None => {
                    tracing::debug!("No sketch op owns sketch {}", sketch_id);
                    Vec::new()
                }
            },
            Profile::Face { face_ref } => self.existing_deps(&[face_ref.op_id]),
        }
    }

    /// Plane a profile lies on, world XY for faces
    fn profile_plane(&self, profile: &Profile) -> Plane {
        let plane = match profile {
            Profile::Sketch { sketch_id } => self
                .sketches
                .get(sketch_id)
                .and_then(|s| self.planes.get(&s.plane_id)),
            Profile::Face { .. } => None,
        };
        plane.cloned().unwrap_or_else(Plane::xy)
    }

    /// Add a sketch op owning a new empty sketch.
    ///
    /// An unknown plane falls back to the world XY plane.
    pub fn create_sketch_op(&mut self, name: impl Into<String>, plane: Option<PlaneId>) -> OpId {
        let xy = DatumPlaneKind::XY.id();
        let plane_id = match plane {
            Some(id) if self.planes.contains_key(&id) => id,
            Some(id) => {
                tracing::debug!("Unknown plane {}, placing sketch on XY", id);
                xy
            }
            None => xy,
        };

        let name = name.into();
        let sketch = Sketch::new(name.clone(), plane_id);
        let sketch_id = sketch.id;
        self.sketches.insert(sketch_id, sketch);
        self.insert_op(Op::sketch(name, sketch_id, plane_id), Vec::new())
    }

    pub fn create_extrude_op(
        &mut self,
        name: impl Into<String>,
        profile: Profile,
        direction: ExtrudeDirection,
        depth: Dim,
    ) -> OpId {
        let deps = self.profile_dep(&profile);
        self.insert_op(Op::extrude(name, profile, direction, depth), deps)
    }

    /// Add a revolve op. `angle` is in degrees.
    pub fn create_revolve_op(
        &mut self,
        name: impl Into<String>,
        profile: Profile,
        axis: AxisChoice,
        angle: Dim,
    ) -> OpId {
        let deps = self.profile_dep(&profile);
        let resolved = resolve_axis(axis, &self.profile_plane(&profile));
        let op = Op::revolve(
            name,
            profile,
            axis,
            resolved.origin,
            resolved.direction,
            angle,
        );
        self.insert_op(op, deps)
    }

    /// Add a fillet op. An empty edge list is accepted.
    pub fn create_fillet_op(
        &mut self,
        name: impl Into<String>,
        target_op: OpId,
        edges: Vec<u32>,
        radius: Dim,
    ) -> OpId {
        let deps = self.existing_deps(&[target_op]);
        self.insert_op(Op::fillet(name, target_op, edges, radius), deps)
    }

    pub fn create_boolean_op(
        &mut self,
        name: impl Into<String>,
        operation: BooleanType,
        target_op: OpId,
        tool_op: OpId,
    ) -> OpId {
        let deps = self.existing_deps(&[target_op, tool_op]);
        self.insert_op(Op::boolean(name, operation, target_op, tool_op), deps)
    }

    // ============== Editing ==============

    /// Patch an op in place. Dependencies are left unchanged.
    ///
    /// Returns false if the op does not exist or the patch changed its id.
    pub fn update_op(&mut self, id: OpId, patch: impl FnOnce(&mut Op)) -> bool {
        let Some(node) = self.op_graph.get_mut(&id) else {
            tracing::debug!("Update of missing op {} ignored", id);
            return false;
        };

        let mut op = node.op.clone();
        patch(&mut op);
        if op.id() != id {
            tracing::debug!("Update of op {} tried to change its id", id);
            return false;
        }
        node.op = op;
        true
    }

    pub fn set_suppressed(&mut self, id: OpId, suppressed: bool) -> bool {
        self.update_op(id, |op| op.set_suppressed(suppressed))
    }

    /// Remove an op, and its sketch for sketch ops.
    ///
    /// Ops depending on it keep their now dangling edge.
    pub fn delete_op(&mut self, id: OpId) -> Option<Op> {
        let Some(node) = self.op_graph.remove(&id) else {
            tracing::debug!("Delete of missing op {} ignored", id);
            return None;
        };

        if let Some(index) = self.index_of(id) {
            self.op_order.remove(index);
            if let Some(pos) = self.timeline_position
                && index < pos
            {
                self.timeline_position = Some(pos - 1);
            }
        }

        if let Some(sketch_id) = node.op.owned_sketch() {
            self.sketches.remove(&sketch_id);
        }

        Some(node.op)
    }

    /// Rewrite dimension formulas after a parameter rename
    pub fn rename_param_references(&mut self, old: &str, new: &str) {
        for node in self.op_graph.values_mut() {
            for dim in node.op.dims_mut() {
                dim.rename_reference(old, new);
            }
        }
    }

    /// Resolve every dimension of every op against `env`
    pub fn dim_values(&self, env: &ParamEnv) -> Vec<(OpId, Vec<f64>)> {
        self.ops()
            .map(|node| {
                let values = node.op.dims().iter().map(|d| eval_dim_value(d, env)).collect();
                (node.op.id(), values)
            })
            .collect()
    }

    // ============== Timeline ==============

    pub fn timeline_position(&self) -> Option<usize> {
        self.timeline_position
    }

    /// Set the cutoff, clamped to the number of ops
    pub fn set_timeline_position(&mut self, position: Option<usize>) {
        self.timeline_position = position.map(|p| p.min(self.op_order.len()));
    }

    /// Show ops up to and including `id`
    pub fn rollback_to(&mut self, id: OpId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.timeline_position = Some(index + 1);
                true
            }
            None => {
                tracing::debug!("Rollback to missing op {} ignored", id);
                false
            }
        }
    }

    pub fn rollback_to_end(&mut self) {
        self.timeline_position = None;
    }

    /// Number of ops before the timeline cutoff
    pub fn effective_len(&self) -> usize {
        self.timeline_position.unwrap_or(self.op_order.len())
    }

    /// Nodes before the timeline cutoff, suppressed ones included
    pub fn effective_ops(&self) -> impl Iterator<Item = &OpGraphNode> {
        self.op_order[..self.effective_len()]
            .iter()
            .filter_map(|id| self.op_graph.get(id))
    }
}
