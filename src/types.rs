use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Backend chunk identifiers arrive either as numbers or strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Number(n) => write!(f, "{n}"),
            SourceId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Citation metadata attached to an answer. Passed through as received;
/// missing or `null` text fields read as empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub id: SourceId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryTiming {
    pub total_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<DocumentSource>,
    #[serde(default)]
    pub timing: QueryTiming,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: SourceId,
    pub name: String,
    pub chunk_count: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebuildIndexResponse {
    pub success: bool,
    pub documents_processed: u64,
    pub total_chunks: u64,
    #[serde(default)]
    pub message: String,
}

/// One entry of the transcript.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatTurn {
    pub is_from_user: bool,
    pub text: String,
    pub timestamp: OffsetDateTime,
    pub sources: Vec<DocumentSource>,
    /// Backend-reported processing time for assistant answers.
    pub elapsed_ms: Option<f64>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            is_from_user: true,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
            sources: Vec::new(),
            elapsed_ms: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            is_from_user: false,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
            sources: Vec::new(),
            elapsed_ms: None,
        }
    }

    pub fn answer(response: QueryResponse) -> Self {
        Self {
            sources: response.sources,
            elapsed_ms: Some(response.timing.total_ms),
            ..Self::assistant(response.answer)
        }
    }
}

/// A picked document waiting to be uploaded.
#[derive(Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Builds a selection, guessing the media type from the file name when
    /// the picker did not declare one.
    pub fn new(name: impl Into<String>, media_type: Option<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = media_type
            .filter(|declared| !declared.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&name)
                    .first_raw()
                    .unwrap_or("application/octet-stream")
                    .to_string()
            });
        Self {
            name,
            media_type,
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type.eq_ignore_ascii_case("application/pdf")
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
