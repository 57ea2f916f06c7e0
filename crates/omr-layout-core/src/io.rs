//! Template file I/O.

use std::fs;
use std::path::Path;

use log::info;

use crate::template::{LoadedTemplate, Template, TemplateError};

/// Largest template file accepted, in bytes.
pub const MAX_TEMPLATE_FILE_BYTES: u64 = 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum TemplateIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("template file is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },
    #[error("template files must have a .json extension: {0}")]
    UnsupportedExtension(String),
}

fn check_extension(path: &Path) -> Result<(), TemplateIoError> {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if ok {
        Ok(())
    } else {
        Err(TemplateIoError::UnsupportedExtension(
            path.display().to_string(),
        ))
    }
}

/// Read and leniently load a template file.
pub fn load_json_file(path: impl AsRef<Path>) -> Result<LoadedTemplate, TemplateIoError> {
    let path = path.as_ref();
    check_extension(path)?;
    let size = fs::metadata(path)?.len();
    if size > MAX_TEMPLATE_FILE_BYTES {
        return Err(TemplateIoError::TooLarge {
            size,
            max: MAX_TEMPLATE_FILE_BYTES,
        });
    }
    let data = fs::read_to_string(path)?;
    let loaded = Template::from_json_str(&data)?;
    info!(
        "loaded template {} ({} blocks, {} issues)",
        path.display(),
        loaded.template.len(),
        loaded.issues.len()
    );
    Ok(loaded)
}

/// Write a template as pretty JSON.
pub fn write_json_file(template: &Template, path: impl AsRef<Path>) -> Result<(), TemplateIoError> {
    let path = path.as_ref();
    check_extension(path)?;
    let data = template.to_json_string()?;
    fs::write(path, data)?;
    Ok(())
}

impl Template {
    pub fn load_json(path: impl AsRef<Path>) -> Result<LoadedTemplate, TemplateIoError> {
        load_json_file(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TemplateIoError> {
        write_json_file(self, path)
    }
}
