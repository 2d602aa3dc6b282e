//! Media asset acquisition: reuse a file already known to the backend by
//! name, otherwise announce and upload it.

use crate::error::AcquireError;
use crate::locator;
use crate::routes;
use crate::transport::{Body, FilePart, Session, Transport};
use serde_json::json;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

const UPLOAD_FIELD: &str = "File";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub id: Uuid,
    /// `true` when an existing backend file was reused instead of uploaded.
    pub reused: bool,
}

/// Content type inferred from the file extension.
pub fn content_kind(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Find a file named `name` or upload the one at `path` under that name.
pub fn acquire<T: Transport + ?Sized>(
    session: &Session<'_, T>,
    name: &str,
    path: &Path,
) -> Result<Asset, AcquireError> {
    let existing = locator::find(session, routes::FILES, &[], locator::name_eq(name));
    if let Some(id) = existing.or_not_found("file") {
        info!(%id, name, "reusing existing file");
        return Ok(Asset { id, reused: true });
    }

    let id = upload(session, name, path)?;
    info!(%id, name, "file uploaded");
    Ok(Asset { id, reused: false })
}

/// Pre-upload announcement followed by the multipart transfer.
pub fn upload<T: Transport + ?Sized>(
    session: &Session<'_, T>,
    name: &str,
    path: &Path,
) -> Result<Uuid, AcquireError> {
    session
        .post(
            routes::FILE_PRE_UPLOAD,
            &[],
            Body::Json(json!([{ "fileName": name }])),
        )
        .map_err(AcquireError::PreUpload)?;

    let bytes = std::fs::read(path).map_err(|source| AcquireError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let part = FilePart {
        field: UPLOAD_FIELD.to_string(),
        file_name: name.to_string(),
        content_type: content_kind(name),
        bytes,
    };
    let body = session
        .post(
            routes::FILE_UPLOAD,
            &[("Name", name.to_string())],
            Body::Multipart(part),
        )
        .map_err(AcquireError::Upload)?;

    locator::created_id(&body).ok_or(AcquireError::MissingId)
}
