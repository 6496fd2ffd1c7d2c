//! Multipart form encoding for file-bearing requests.
//!
//! Requests fill a [`FormData`] through [`FormFields`]; the file itself is read
//! by [`FormData::attach`], which owns the handle only for the duration of the
//! read.

use std::path::{Path, PathBuf};

use serde::Serialize;

use pollbot_core::{errors::Error, Result};

/// A file to upload: read from local disk, or referenced by file id / URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputFile {
    Path(PathBuf),
    Remote(String),
}

impl InputFile {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        InputFile::Path(p.into())
    }

    pub fn remote(id_or_url: impl Into<String>) -> Self {
        InputFile::Remote(id_or_url.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Ordered multipart fields, converted to a `reqwest` form right before sending.
#[derive(Clone, Debug, Default)]
pub struct FormData {
    parts: Vec<FormPart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, name: &str, value: impl Into<String>) {
        self.parts.push(FormPart::Text {
            name: name.to_string(),
            value: value.into(),
        });
    }

    /// Structured values (reply markup, media lists) go in as JSON text.
    pub fn json<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let txt = serde_json::to_string(value)?;
        self.text(name, txt);
        Ok(())
    }

    /// Add `input` under `name`. Local files are read fully; the handle is closed
    /// before this returns, on success and on error.
    pub async fn attach(&mut self, name: &str, input: &InputFile) -> Result<()> {
        match input {
            InputFile::Remote(id) => self.text(name, id.clone()),
            InputFile::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    Error::Io(std::io::Error::new(
                        e.kind(),
                        format!("{}: {e}", path.display()),
                    ))
                })?;
                self.parts.push(FormPart::File {
                    name: name.to_string(),
                    file_name: file_name_of(path),
                    bytes,
                });
            }
        }
        Ok(())
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name() == name)
    }

    pub fn into_multipart(self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    bytes,
                } => form.part(
                    name,
                    reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str("application/octet-stream")
                        .map_err(|e| Error::External(format!("multipart error: {e}")))?,
                ),
            };
        }
        Ok(form)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload.bin")
        .to_string()
}

/// A group of request fields that knows how to write itself as form fields.
///
/// Zero values write nothing, matching the JSON encoding's omitted fields.
pub trait FormFields {
    fn write_form(&self, form: &mut FormData) -> Result<()>;
}
