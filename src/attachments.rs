// ABOUTME: Attachment storage helper that gates uploads by extension and writes them to disk
// ABOUTME: Stored names are timestamp-prefixed and sanitized so user names never become paths

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::entities::attachment;
use crate::error::{AppError, Result};
use crate::types::UploadedFile;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx",
];

const MAX_NAME_ATTEMPTS: usize = 100;

pub fn allowed_file(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Reduces a client-supplied name to a single safe path segment.
pub fn secure_filename(raw_name: &str) -> String {
    let base_name = raw_name.rsplit(['/', '\\']).next().unwrap_or(raw_name);
    let mut sanitized = base_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", ".");
    }

    let trimmed = sanitized.trim_start_matches(['.', '_']).trim_end_matches('_');
    if trimmed.is_empty() || trimmed == "." {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn stored_filename(now: DateTime<Utc>, original_name: &str) -> String {
    format!(
        "{}_{}",
        now.format("%Y%m%d_%H%M%S"),
        secure_filename(original_name)
    )
}

/// Writes `bytes` to a fresh file in `upload_dir`. Same-second name clashes get a
/// numeric suffix after the timestamp rather than overwriting an existing file.
async fn write_new_file(upload_dir: &Path, base_name: &str, bytes: &[u8]) -> Result<(String, u64)> {
    fs::create_dir_all(upload_dir).await?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = match (attempt, base_name.split_once('_')) {
            (0, _) => base_name.to_string(),
            (n, Some((date, rest))) => match rest.split_once('_') {
                Some((time, name)) => format!("{}_{}_{}_{}", date, time, n, name),
                None => format!("{}_{}", n, base_name),
            },
            (n, None) => format!("{}_{}", n, base_name),
        };
        let path = upload_dir.join(&candidate);

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        };

        let written: std::io::Result<std::fs::Metadata> = async {
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::metadata(&path).await
        }
        .await;

        return match written {
            Ok(meta) => Ok((candidate, meta.len())),
            Err(err) => {
                let _ = fs::remove_file(&path).await;
                Err(err.into())
            }
        };
    }

    Err(AppError::Internal(format!(
        "Could not find a free stored name for {}",
        base_name
    )))
}

/// Persists an upload for `item_id` and records its metadata on `conn`.
///
/// Returns `Ok(None)` without touching disk or database when the extension is not
/// allowed. The file is fully written and synced before the row is inserted, and
/// removed again if the insert fails.
pub async fn store_upload<C: ConnectionTrait>(
    conn: &C,
    upload_dir: &Path,
    upload: &UploadedFile,
    item_id: i32,
) -> Result<Option<attachment::Model>> {
    if !allowed_file(&upload.file_name) {
        tracing::info!(
            original = %upload.file_name,
            item_id,
            "Skipping upload with disallowed extension"
        );
        return Ok(None);
    }

    let now = Utc::now();
    let base_name = stored_filename(now, &upload.file_name);
    let (stored, size) = write_new_file(upload_dir, &base_name, &upload.bytes).await?;

    let record = attachment::ActiveModel {
        item_id: Set(item_id),
        filename: Set(stored.clone()),
        original_filename: Set(upload.file_name.clone()),
        file_size: Set(size as i64),
        content_type: Set(upload.content_type.clone()),
        created_at: Set(now),
        ..Default::default()
    };

    match record.insert(conn).await {
        Ok(model) => {
            tracing::debug!(stored = %model.filename, size, item_id, "Stored attachment");
            Ok(Some(model))
        }
        Err(err) => {
            remove_stored_file(upload_dir, &stored).await;
            Err(err.into())
        }
    }
}

pub fn stored_path(upload_dir: &Path, stored: &str) -> PathBuf {
    upload_dir.join(secure_filename(stored))
}

/// Best-effort removal. A file that is already gone counts as removed.
pub async fn remove_stored_file(upload_dir: &Path, stored: &str) -> bool {
    let path = stored_path(upload_dir, stored);
    match fs::remove_file(&path).await {
        Ok(()) => true,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Attachment file already absent");
            true
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "Failed to remove attachment file: {}", err);
            false
        }
    }
}
