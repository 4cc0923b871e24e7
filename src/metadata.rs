// Metadata document uploaded next to the image.

use serde::{Deserialize, Serialize};

/// Label recorded as the origin of every uploaded image.
pub const SOURCE_LABEL: &str = "cataas.com";

/// Small JSON document describing an uploaded image. Field names are the
/// keys that end up in the `_info.json` file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub text: String,
    pub filename: String,
    pub size_bytes: usize,
    pub source: String,
}

impl UploadMetadata {
    pub fn new(caption: &str, filename: &str, size_bytes: usize) -> Self {
        UploadMetadata {
            text: caption.to_string(),
            filename: filename.to_string(),
            size_bytes,
            source: SOURCE_LABEL.to_string(),
        }
    }

    /// Pretty-printed UTF-8 JSON, two-space indented.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}
