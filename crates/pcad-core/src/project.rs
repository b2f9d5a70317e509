//! Document file serialization

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Current file format version
pub const FORMAT_VERSION: u32 = 1;

/// Project-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectError {
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Unsupported file version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Serialization format for backward compatibility
#[derive(Serialize)]
struct ProjectFileRef<'a> {
    version: u32,
    document: &'a Document,
}

#[derive(Deserialize)]
struct ProjectFile {
    version: u32,
    document: Document,
}

/// Serialize a document to pretty RON bytes
pub fn to_bytes(document: &Document) -> Result<Vec<u8>, ProjectError> {
    let file = ProjectFileRef {
        version: FORMAT_VERSION,
        document,
    };
    let content = ron::ser::to_string_pretty(&file, ron::ser::PrettyConfig::default())
        .map_err(|e| ProjectError::Serialize(e.to_string()))?;
    Ok(content.into_bytes())
}

/// Load a document from RON bytes.
///
/// Parameters are re-evaluated while loading, so evaluation errors are
/// available again without having been stored.
pub fn from_bytes(data: &[u8]) -> Result<Document, ProjectError> {
    let content = std::str::from_utf8(data).map_err(|e| ProjectError::Deserialize(e.to_string()))?;
    let file: ProjectFile =
        ron::from_str(content).map_err(|e| ProjectError::Deserialize(e.to_string()))?;

    if file.version > FORMAT_VERSION || file.version == 0 {
        return Err(ProjectError::UnsupportedVersion {
            found: file.version,
            supported: FORMAT_VERSION,
        });
    }
    Ok(file.document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_empty_document() {
        let doc = Document::new();
        let bytes = to_bytes(&doc).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_future_version_rejected() {
        let doc = Document::new();
        let text = String::from_utf8(to_bytes(&doc).unwrap()).unwrap();
        let text = text.replacen("version: 1", "version: 9", 1);

        assert!(matches!(
            from_bytes(text.as_bytes()),
            Err(ProjectError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            from_bytes(b"not a document"),
            Err(ProjectError::Deserialize(_))
        ));
    }
}
