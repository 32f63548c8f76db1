// ABOUTME: HTTP handlers for item CRUD and attachment download and deletion
// ABOUTME: Writes redirect back with a flash message; failed saves re-render the form

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::{cookie::SignedCookieJar, Form};
use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::flash::{set_flash, take_flash, Flash};
use crate::storage::SaveOutcome;
use crate::types::{
    BulkDeleteForm, ItemFields, ItemListResponse, ItemSubmission, ItemSummary, UploadedFile,
};
use crate::{attachments, views, AppState};

const UPLOAD_FIELD: &str = "attachments";

pub async fn index(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Html<String>)> {
    let items = state.storage.list_items().await?;
    let (jar, flash) = take_flash(jar);
    Ok((jar, Html(views::index_page(&items, flash.as_ref()))))
}

pub async fn add_form(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let (jar, flash) = take_flash(jar);
    let html = views::item_form_page(None, &ItemFields::default(), &[], flash.as_ref());
    (jar, Html(html))
}

pub async fn add_item(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    multipart: Multipart,
) -> Result<Response> {
    let submission = read_submission(multipart).await?;

    match state
        .storage
        .create_item(&submission.fields, &submission.files)
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                item_id = outcome.item.id,
                attachments = outcome.attachments.len(),
                "Item added"
            );
            let flash = saved_flash("Item added successfully!", &outcome);
            Ok((set_flash(jar, flash), Redirect::to("/")).into_response())
        }
        Err(err) => {
            tracing::error!("Failed to add item: {}", err);
            let flash = Flash::failure(format!("Error adding item: {}", err));
            let html = views::item_form_page(None, &submission.fields, &[], Some(&flash));
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response())
        }
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Html<String>)> {
    let item = state.storage.find_item(id).await?;
    let attachments = state.storage.item_attachments(id).await?;
    let (jar, flash) = take_flash(jar);

    let html = views::item_form_page(
        Some(item.id),
        &ItemFields::from(&item),
        &attachments,
        flash.as_ref(),
    );
    Ok((jar, Html(html)))
}

pub async fn edit_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: SignedCookieJar,
    multipart: Multipart,
) -> Result<Response> {
    // Unknown ids are a plain 404, before the form body is read.
    state.storage.find_item(id).await?;
    let submission = read_submission(multipart).await?;

    match state
        .storage
        .update_item(id, &submission.fields, &submission.files)
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                item_id = id,
                attachments = outcome.attachments.len(),
                "Item updated"
            );
            let flash = saved_flash("Item updated successfully!", &outcome);
            Ok((set_flash(jar, flash), Redirect::to("/")).into_response())
        }
        Err(err @ AppError::NotFound(_)) => Err(err),
        Err(err) => {
            tracing::error!(item_id = id, "Failed to update item: {}", err);
            let attachments = match state.storage.item_attachments(id).await {
                Ok(attachments) => attachments,
                Err(list_err) => {
                    tracing::warn!(item_id = id, "Failed to reload attachments: {}", list_err);
                    Vec::new()
                }
            };
            let flash = Flash::failure(format!("Error updating item: {}", err));
            let html =
                views::item_form_page(Some(id), &submission.fields, &attachments, Some(&flash));
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response())
        }
    }
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Redirect)> {
    let flash = match state.storage.delete_item(id).await {
        Ok(removed) => {
            tracing::info!(item_id = id, attachments = removed, "Item deleted");
            Flash::success("Item deleted successfully!")
        }
        Err(err @ AppError::NotFound(_)) => return Err(err),
        Err(err) => {
            tracing::error!(item_id = id, "Failed to delete item: {}", err);
            Flash::failure(format!("Error deleting item: {}", err))
        }
    };

    Ok((set_flash(jar, flash), Redirect::to("/")))
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response> {
    let attachment = state.storage.find_attachment(id).await?;
    let path = attachments::stored_path(state.storage.upload_dir(), &attachment.filename);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "file for attachment {} at {}",
                id,
                path.display()
            )));
        }
        Err(err) => return Err(err.into()),
    };

    let content_type = attachment
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&attachment.original_filename))
        .map_err(|e| AppError::Internal(format!("Invalid Content-Disposition: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Redirect)> {
    let (flash, target) = match state.storage.delete_attachment(id).await {
        Ok(removed) => {
            tracing::info!(attachment_id = id, item_id = removed.item_id, "Attachment deleted");
            (
                Flash::success("Attachment deleted successfully!"),
                format!("/edit/{}", removed.item_id),
            )
        }
        Err(err @ AppError::NotFound(_)) => return Err(err),
        Err(err) => {
            tracing::error!(attachment_id = id, "Failed to delete attachment: {}", err);
            (
                Flash::failure(format!("Error deleting attachment: {}", err)),
                "/".to_string(),
            )
        }
    };

    Ok((set_flash(jar, flash), Redirect::to(&target)))
}

pub async fn bulk_delete_attachments(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<BulkDeleteForm>,
) -> Result<(SignedCookieJar, Redirect)> {
    let ids = form.ids();
    let (flash, target) = match state.storage.bulk_delete_attachments(&ids).await {
        Ok(outcome) => {
            tracing::info!(
                requested = ids.len(),
                deleted = outcome.deleted,
                "Bulk attachment delete"
            );
            let target = outcome
                .item_id
                .map(|id| format!("/edit/{}", id))
                .unwrap_or_else(|| "/".to_string());
            (
                Flash::success(format!(
                    "{} attachment(s) deleted successfully!",
                    outcome.deleted
                )),
                target,
            )
        }
        Err(err) => {
            tracing::error!("Failed to bulk delete attachments: {}", err);
            (
                Flash::failure(format!("Error deleting attachments: {}", err)),
                "/".to_string(),
            )
        }
    };

    Ok((set_flash(jar, flash), Redirect::to(&target)))
}

pub async fn api_items(State(state): State<AppState>) -> Result<Json<ItemListResponse>> {
    let items = state
        .storage
        .list_items_with_attachments()
        .await?
        .iter()
        .map(|(item, attachments)| ItemSummary::new(item, attachments))
        .collect();

    Ok(Json(ItemListResponse { items }))
}

/// Buffers the whole multipart body. Exceeding the body limit fails here, before
/// anything is written to the database or the upload folder.
async fn read_submission(mut multipart: Multipart) -> Result<ItemSubmission> {
    let mut form = HashMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == UPLOAD_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            // Browsers send an empty part when no file was chosen.
            if file_name.is_empty() {
                continue;
            }
            files.push(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        } else {
            let value = field.text().await?;
            form.insert(name, value);
        }
    }

    Ok(ItemSubmission {
        fields: ItemFields::from_form(&form),
        files,
    })
}

fn saved_flash(message: &str, outcome: &SaveOutcome) -> Flash {
    if outcome.rejected.is_empty() {
        Flash::success(message)
    } else {
        Flash::success(format!(
            "{} Skipped files with a disallowed type: {}",
            message,
            outcome.rejected.join(", ")
        ))
    }
}

fn content_disposition(original_filename: &str) -> String {
    let fallback: String = original_filename
        .chars()
        .map(|ch| {
            if (ch.is_ascii_graphic() && ch != '"' && ch != '\\') || ch == ' ' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(original_filename)
    )
}
