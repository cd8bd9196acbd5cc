//! Uploaded files.
//!
//! Hosts report uploads per form field as five parallel sub-fields (`name`,
//! `type`, `size`, `tmp_name`, `error`). For a multi-file field each
//! sub-field is a list, and the n-th entries of all five lists describe the
//! n-th file. [`FileSet`] reshapes that into one [`UploadedFile`] or an
//! ordered list of them per field.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A sub-field of a raw upload: one value, or one value per uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    // A single value stands in for every index.
    fn at(&self, index: usize) -> Option<&T> {
        match self {
            Self::Many(values) => values.get(index),
            Self::One(value) => Some(value),
        }
    }
}

/// The host's raw metadata for one upload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpload {
    pub name: OneOrMany<String>,
    #[serde(rename = "type")]
    pub content_type: OneOrMany<String>,
    pub size: OneOrMany<u64>,
    pub tmp_name: OneOrMany<String>,
    pub error: OneOrMany<i64>,
}

impl RawUpload {
    fn file_at(&self, index: usize) -> Option<UploadedFile> {
        Some(UploadedFile::new(
            self.name.at(index)?.clone(),
            self.content_type.at(index)?.clone(),
            *self.size.at(index)?,
            self.tmp_name.at(index)?.clone(),
            *self.error.at(index)?,
        ))
    }
}

/// Metadata for one uploaded file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    content_type: String,
    size: u64,
    temporary_path: String,
    error: i64,
}

impl UploadedFile {
    /// Returns file metadata built from its parts.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        size: u64,
        temporary_path: impl Into<String>,
        error: i64,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size,
            temporary_path: temporary_path.into(),
            error,
        }
    }

    /// The file name as sent by the client.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The media type as sent by the client.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Where the host stored the upload.
    pub fn temporary_path(&self) -> &str {
        &self.temporary_path
    }

    /// The host's upload error code; `0` means success.
    pub fn error(&self) -> i64 {
        self.error
    }

    /// Returns `true` if the host reported a successful upload.
    pub fn is_ok(&self) -> bool {
        self.error == 0
    }
}

/// The files uploaded under one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEntry {
    Single(UploadedFile),
    Multiple(Vec<UploadedFile>),
}

impl FileEntry {
    /// Returns the file of a single-file field.
    pub fn single(&self) -> Option<&UploadedFile> {
        match self {
            Self::Single(file) => Some(file),
            Self::Multiple(_) => None,
        }
    }

    /// Iterates over the contained files regardless of shape.
    pub fn files(&self) -> impl Iterator<Item = &UploadedFile> {
        let files: &[UploadedFile] = match self {
            Self::Single(file) => std::slice::from_ref(file),
            Self::Multiple(files) => files,
        };
        files.iter()
    }
}

/// Uploaded files keyed by form field name.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use hostbridge::http::{FileSet, RawUpload};
/// use serde_json::json;
///
/// let raw: IndexMap<String, RawUpload> = serde_json::from_value(json!({
///     "avatar": {
///         "name": "me.png", "type": "image/png", "size": 2048,
///         "tmp_name": "/tmp/php1", "error": 0
///     },
///     "docs": {
///         "name": ["a.pdf", "b.pdf"], "type": ["application/pdf", "application/pdf"],
///         "size": [10, 20], "tmp_name": ["/tmp/php2", "/tmp/php3"], "error": [0, 0]
///     }
/// })).unwrap();
///
/// let files = FileSet::new(raw);
/// assert_eq!(files.get("avatar").and_then(|e| e.single()).map(|f| f.size()), Some(2048));
/// assert_eq!(files.get("docs").map(|e| e.files().count()), Some(2));
/// assert!(files.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: IndexMap<String, FileEntry>,
}

impl FileSet {
    /// Builds the set from the host's raw upload metadata.
    pub fn new(raw: IndexMap<String, RawUpload>) -> Self {
        let mut files = IndexMap::with_capacity(raw.len());

        for (field, upload) in raw {
            let entry = match &upload.name {
                OneOrMany::Many(names) => {
                    let built: Vec<_> = (0..names.len())
                        .map_while(|index| upload.file_at(index))
                        .collect();
                    if built.len() < names.len() {
                        warn!(
                            field = %field,
                            expected = names.len(),
                            built = built.len(),
                            "upload sub-fields have mismatched lengths"
                        );
                    }
                    FileEntry::Multiple(built)
                }
                OneOrMany::One(_) => match upload.file_at(0) {
                    Some(file) => FileEntry::Single(file),
                    None => {
                        warn!(field = %field, "upload sub-fields are empty, skipping field");
                        continue;
                    }
                },
            };
            files.insert(field, entry);
        }

        Self { files }
    }

    /// Returns the entry for `field`, or `None` if nothing was uploaded under it.
    pub fn get(&self, field: &str) -> Option<&FileEntry> {
        self.files.get(field)
    }

    /// Returns every `(field, entry)` pair in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of fields with uploads.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if nothing was uploaded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> IndexMap<String, RawUpload> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_and_multiple_fields() {
        let files = FileSet::new(raw(json!({
            "single": { "name": "a name", "type": "a type", "size": 123, "tmp_name": "a tmp", "error": 456 },
            "multiple": {
                "name": ["b1", "b2"],
                "type": ["t1", "t2"],
                "size": [11, 12],
                "tmp_name": ["p1", "p2"],
                "error": [0, 4]
            }
        })));

        let single = files.get("single").and_then(FileEntry::single).unwrap();
        assert_eq!(single.name(), "a name");
        assert_eq!(single.content_type(), "a type");
        assert_eq!(single.size(), 123);
        assert_eq!(single.temporary_path(), "a tmp");
        assert_eq!(single.error(), 456);
        assert!(!single.is_ok());

        let multiple = files.get("multiple").unwrap();
        assert!(multiple.single().is_none());
        let names: Vec<_> = multiple.files().map(UploadedFile::name).collect();
        assert_eq!(names, vec!["b1", "b2"]);
        let second = multiple.files().nth(1).unwrap();
        assert_eq!(second, &UploadedFile::new("b2", "t2", 12, "p2", 4));

        assert!(files.get("not a file").is_none());
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn field_order_is_preserved() {
        let files = FileSet::new(raw(json!({
            "z": { "name": "z", "type": "t", "size": 1, "tmp_name": "p", "error": 0 },
            "a": { "name": "a", "type": "t", "size": 1, "tmp_name": "p", "error": 0 }
        })));
        let fields: Vec<_> = files.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["z", "a"]);
    }

    #[test]
    fn mismatched_lengths_keep_common_prefix() {
        let files = FileSet::new(raw(json!({
            "docs": {
                "name": ["a", "b", "c"],
                "type": ["t", "t"],
                "size": [1, 2, 3],
                "tmp_name": ["p", "q", "r"],
                "error": [0, 0, 0]
            }
        })));
        assert_eq!(files.get("docs").map(|e| e.files().count()), Some(2));
    }

    #[test]
    fn scalar_sub_field_applies_to_every_file() {
        let files = FileSet::new(raw(json!({
            "docs": {
                "name": ["a", "b"],
                "type": "text/plain",
                "size": [1, 2],
                "tmp_name": ["p", "q"],
                "error": 0
            }
        })));
        let entry = files.get("docs").unwrap();
        assert!(entry.files().all(|f| f.content_type() == "text/plain" && f.is_ok()));
    }

    #[test]
    fn empty_upload_set() {
        let files = FileSet::new(IndexMap::new());
        assert!(files.is_empty());
        assert!(files.get("anything").is_none());
    }
}
