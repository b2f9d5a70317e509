//! Parametric document
//!
//! The root of persisted state: the part studios and the parameters their
//! dimensions refer to.

use pcad_cad::{PartStudio, PartStudioId, ResolvedOp};
use pcad_params::{ParamEditError, ParamEditResult, ParamEnv, ParamId};
use serde::{Deserialize, Serialize};

/// Name of the part studio every document starts with
pub const DEFAULT_PART_STUDIO_NAME: &str = "Part Studio 1";

/// Serialization format with part studios as a key-value list
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentData {
    part_studios: Vec<(PartStudioId, PartStudio)>,
    #[serde(default)]
    params: ParamEnv,
}

impl From<Document> for DocumentData {
    fn from(doc: Document) -> Self {
        Self {
            part_studios: doc.part_studios.into_iter().map(|s| (s.id, s)).collect(),
            params: doc.params,
        }
    }
}

impl From<DocumentData> for Document {
    fn from(data: DocumentData) -> Self {
        let mut part_studios: Vec<PartStudio> = data
            .part_studios
            .into_iter()
            .map(|(id, mut studio)| {
                studio.id = id;
                studio
            })
            .collect();
        if part_studios.is_empty() {
            tracing::debug!("Document has no part studios, adding a default one");
            part_studios.push(PartStudio::new(DEFAULT_PART_STUDIO_NAME));
        }
        Self {
            part_studios,
            params: data.params,
        }
    }
}

/// A parametric document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DocumentData", from = "DocumentData")]
pub struct Document {
    /// Never empty, in creation order
    part_studios: Vec<PartStudio>,
    pub params: ParamEnv,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with one empty part studio
    pub fn new() -> Self {
        Self {
            part_studios: vec![PartStudio::new(DEFAULT_PART_STUDIO_NAME)],
            params: ParamEnv::new(),
        }
    }

    // ============== Part Studios ==============

    pub fn part_studios(&self) -> impl Iterator<Item = &PartStudio> {
        self.part_studios.iter()
    }

    pub(crate) fn part_studios_mut(&mut self) -> impl Iterator<Item = &mut PartStudio> {
        self.part_studios.iter_mut()
    }

    pub fn part_studio_count(&self) -> usize {
        self.part_studios.len()
    }

    pub fn part_studio(&self, id: PartStudioId) -> Option<&PartStudio> {
        self.part_studios.iter().find(|s| s.id == id)
    }

    pub fn part_studio_mut(&mut self, id: PartStudioId) -> Option<&mut PartStudio> {
        self.part_studios.iter_mut().find(|s| s.id == id)
    }

    /// The first part studio
    pub fn default_part_studio_id(&self) -> PartStudioId {
        match self.part_studios.first() {
            Some(studio) => studio.id,
            None => PartStudioId::default(),
        }
    }

    pub fn add_part_studio(&mut self, name: impl Into<String>) -> PartStudioId {
        let studio = PartStudio::new(name);
        let id = studio.id;
        self.part_studios.push(studio);
        id
    }

    /// "Part Studio 2" style name for the next part studio
    pub fn next_part_studio_name(&self) -> String {
        format!("Part Studio {}", self.part_studios.len() + 1)
    }

    /// Remove a part studio. The last one is never removed.
    pub fn remove_part_studio(&mut self, id: PartStudioId) -> Option<PartStudio> {
        if self.part_studios.len() <= 1 {
            tracing::debug!("Refusing to remove the last part studio");
            return None;
        }
        let index = self.part_studios.iter().position(|s| s.id == id)?;
        Some(self.part_studios.remove(index))
    }

    // ============== Parameters ==============

    /// Rename a parameter, rewriting other formulas and every dimension
    pub fn rename_param(&mut self, id: ParamId, new_name: &str) -> ParamEditResult<()> {
        let old_name = self
            .params
            .get(id)
            .map(|p| p.name.clone())
            .ok_or(ParamEditError::NotFound(id))?;

        self.params = self.params.update_param_name(id, new_name)?;
        for studio in &mut self.part_studios {
            studio.rename_param_references(&old_name, new_name);
        }
        Ok(())
    }

    /// Rebuild plan of one part studio against the document's parameters
    pub fn rebuild_plan(&self, studio: PartStudioId) -> Option<Vec<ResolvedOp>> {
        self.part_studio(studio)
            .map(|s| s.rebuild_plan(&self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcad_cad::{Op, OpId};
    use pcad_params::Dim;

    #[test]
    fn test_new_document_has_default_studio() {
        let doc = Document::new();
        assert_eq!(doc.part_studio_count(), 1);
        let studio = doc.part_studio(doc.default_part_studio_id()).unwrap();
        assert_eq!(studio.name, DEFAULT_PART_STUDIO_NAME);
    }

    #[test]
    fn test_last_part_studio_is_kept() {
        let mut doc = Document::new();
        let first = doc.default_part_studio_id();
        assert!(doc.remove_part_studio(first).is_none());

        let second = doc.add_part_studio(doc.next_part_studio_name());
        assert_eq!(doc.part_studio(second).unwrap().name, "Part Studio 2");
        assert!(doc.remove_part_studio(first).is_some());
        assert_eq!(doc.default_part_studio_id(), second);
        assert!(doc.remove_part_studio(PartStudioId::new()).is_none());
    }

    #[test]
    fn test_rename_param_rewrites_dims() {
        let mut doc = Document::new();
        let (params, w) = doc.params.add_param("w", "10", None).unwrap();
        doc.params = params;

        let studio_id = doc.default_part_studio_id();
        let studio = doc.part_studio_mut(studio_id).unwrap();
        let f = studio.create_fillet_op(
            "Fillet 1",
            OpId::new(),
            vec![0],
            Dim::expression("w / 2", 0.0),
        );

        doc.rename_param(w, "width").unwrap();
        let op = doc.part_studio(studio_id).and_then(|s| s.op(f)).unwrap();
        match op {
            Op::Fillet { radius, .. } => {
                assert_eq!(radius.expression.as_deref(), Some("width / 2"))
            }
            _ => panic!("expected fillet"),
        }
        assert_eq!(doc.params.get(w).unwrap().name, "width");

        assert!(matches!(
            doc.rename_param(ParamId::new(), "x"),
            Err(ParamEditError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_document_data_gets_default_studio() {
        let doc = Document::from(DocumentData {
            part_studios: Vec::new(),
            params: ParamEnv::new(),
        });
        assert_eq!(doc.part_studio_count(), 1);
    }
}
