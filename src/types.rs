// ABOUTME: Type definitions for form submissions, uploads, and JSON responses
// ABOUTME: Converts raw form values into typed item fields via the forgiving parsers

use axum::body::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::{attachment, item};
use crate::filters;
use crate::validation::{parse_date, parse_price, parse_text};

/// Every user-editable column of an item. Blank or malformed input is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFields {
    pub model_name: Option<String>,
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub manufactured_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub friendly_name: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
}

impl ItemFields {
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let text = |key: &str| form.get(key).and_then(|v| parse_text(v));
        let date = |key: &str| form.get(key).and_then(|v| parse_date(v));

        Self {
            model_name: text("model_name"),
            model_number: text("model_number"),
            serial_number: text("serial_number"),
            manufacturer: text("manufacturer"),
            manufactured_date: date("manufactured_date"),
            description: text("description"),
            friendly_name: text("friendly_name"),
            purchase_date: date("purchase_date"),
            purchase_price: form.get("purchase_price").and_then(|v| parse_price(v)),
        }
    }
}

impl From<&item::Model> for ItemFields {
    fn from(model: &item::Model) -> Self {
        Self {
            model_name: model.model_name.clone(),
            model_number: model.model_number.clone(),
            serial_number: model.serial_number.clone(),
            manufacturer: model.manufacturer.clone(),
            manufactured_date: model.manufactured_date,
            description: model.description.clone(),
            friendly_name: model.friendly_name.clone(),
            purchase_date: model.purchase_date,
            purchase_price: model.purchase_price,
        }
    }
}

/// A file part from a multipart form, buffered in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct ItemSubmission {
    pub fields: ItemFields,
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteForm {
    #[serde(default)]
    pub attachment_ids: Vec<String>,
}

impl BulkDeleteForm {
    /// Ids that are not numbers cannot match a row, so they are dropped like unknown ids.
    pub fn ids(&self) -> Vec<i32> {
        self.attachment_ids
            .iter()
            .filter_map(|raw| raw.trim().parse().ok())
            .collect()
    }
}

// JSON API types
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentSummary {
    pub id: i32,
    pub original_filename: String,
    pub file_size: i64,
    pub file_size_display: String,
    pub content_type: Option<String>,
    pub created_at: String,
}

impl From<&attachment::Model> for AttachmentSummary {
    fn from(model: &attachment::Model) -> Self {
        Self {
            id: model.id,
            original_filename: model.original_filename.clone(),
            file_size: model.file_size,
            file_size_display: filters::format_file_size(Some(model.file_size)),
            content_type: model.content_type.clone(),
            created_at: model.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: i32,
    pub model_name: Option<String>,
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub manufactured_date: Option<String>,
    pub description: Option<String>,
    pub friendly_name: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub created_at: String,
    pub attachments: Vec<AttachmentSummary>,
}

impl ItemSummary {
    pub fn new(model: &item::Model, attachments: &[attachment::Model]) -> Self {
        let date = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());

        Self {
            id: model.id,
            model_name: model.model_name.clone(),
            model_number: model.model_number.clone(),
            serial_number: model.serial_number.clone(),
            manufacturer: model.manufacturer.clone(),
            manufactured_date: date(model.manufactured_date),
            description: model.description.clone(),
            friendly_name: model.friendly_name.clone(),
            purchase_date: date(model.purchase_date),
            purchase_price: model.purchase_price,
            created_at: model.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            attachments: attachments.iter().map(AttachmentSummary::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemSummary>,
}
