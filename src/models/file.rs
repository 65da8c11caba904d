use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of an uploaded file. The bytes live in the uploads directory
/// under `path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct File {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    pub fn new(id: i64, name: String, path: String, app_url: &str) -> Self {
        let now = Utc::now();
        let url = format!("{}/files/{}", app_url.trim_end_matches('/'), path);

        Self {
            id,
            name,
            path,
            url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The subset of a file exposed when nested under another entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSummary {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub url: String,
}

impl From<&File> for FileSummary {
    fn from(file: &File) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            path: file.path.clone(),
            url: file.url.clone(),
        }
    }
}
