// ABOUTME: Server-rendered HTML pages for the item list, item forms, and errors
// ABOUTME: All user-supplied text is escaped; display values go through the filters

use axum::http::StatusCode;
use std::fmt::Write;

use crate::entities::{attachment, item};
use crate::filters::{format_date, format_file_size, format_price};
use crate::flash::Flash;
use crate::types::ItemFields;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:960px;padding:0 1rem}\
table{border-collapse:collapse;width:100%}th,td{border-bottom:1px solid #ddd;padding:.4rem;text-align:left}\
.flash{padding:.6rem 1rem;margin-bottom:1rem;border-radius:4px}\
.flash-success{background:#e6f4ea;color:#1e4620}.flash-failure{background:#fdecea;color:#611a15}\
form.inline{display:inline}label{display:block;margin-top:.6rem}\
input[type=text],input[type=date],input[type=number],textarea{width:100%;padding:.3rem}";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn opt(text: &Option<String>) -> String {
    text.as_deref().map(escape).unwrap_or_default()
}

fn layout(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let flash_html = flash
        .map(|f| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                f.kind.as_str(),
                escape(&f.message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Home Inventory</title>
<style>{STYLE}</style>
</head>
<body>
<nav><a href="/">Home Inventory</a> | <a href="/add">Add item</a></nav>
<h1>{title}</h1>
{flash_html}
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn index_page(items: &[item::Model], flash: Option<&Flash>) -> String {
    if items.is_empty() {
        return layout(
            "Inventory",
            flash,
            r#"<p>No items yet. <a href="/add">Add the first one</a>.</p>"#,
        );
    }

    let mut rows = String::new();
    for item in items {
        let _ = write!(
            rows,
            r#"<tr>
<td>{name}</td><td>{manufacturer}</td><td>{model_number}</td><td>{serial}</td>
<td>{purchased}</td><td>{price}</td>
<td><a href="/edit/{id}">Edit</a>
<form class="inline" method="post" action="/delete/{id}" onsubmit="return confirm('Delete this item and all its attachments?')">
<button type="submit">Delete</button></form></td>
</tr>
"#,
            id = item.id,
            name = escape(&item.display_name()),
            manufacturer = opt(&item.manufacturer),
            model_number = opt(&item.model_number),
            serial = opt(&item.serial_number),
            purchased = format_date(item.purchase_date),
            price = format_price(item.purchase_price),
        );
    }

    let body = format!(
        r#"<table>
<thead><tr><th>Name</th><th>Manufacturer</th><th>Model number</th><th>Serial number</th><th>Purchased</th><th>Price</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    );
    layout("Inventory", flash, &body)
}

/// Renders the add form (`item_id` is `None`) or the edit form with its attachments.
pub fn item_form_page(
    item_id: Option<i32>,
    fields: &ItemFields,
    attachments: &[attachment::Model],
    flash: Option<&Flash>,
) -> String {
    let (title, action, submit) = match item_id {
        Some(id) => ("Edit item", format!("/edit/{}", id), "Save changes"),
        None => ("Add item", "/add".to_string(), "Add item"),
    };

    let text_input = |name: &str, label: &str, value: &Option<String>| {
        format!(
            r#"<label for="{name}">{label}</label><input type="text" id="{name}" name="{name}" maxlength="100" value="{value}">"#,
            value = opt(value)
        )
    };
    let date_input = |name: &str, label: &str, value: String| {
        format!(
            r#"<label for="{name}">{label}</label><input type="date" id="{name}" name="{name}" value="{value}">"#
        )
    };

    let price_value = fields
        .purchase_price
        .map(|p| p.to_string())
        .unwrap_or_default();

    let mut body = format!(
        r#"<form method="post" action="{action}" enctype="multipart/form-data">
{friendly}
{model_name}
{model_number}
{serial}
{manufacturer}
{manufactured}
<label for="description">Description</label><textarea id="description" name="description" rows="4">{description}</textarea>
{purchased}
<label for="purchase_price">Purchase price</label><input type="number" id="purchase_price" name="purchase_price" step="any" value="{price_value}">
<label for="attachments">Attachments (txt, pdf, png, jpg, jpeg, gif, doc, docx, xls, xlsx)</label><input type="file" id="attachments" name="attachments" multiple>
<p><button type="submit">{submit}</button> <a href="/">Cancel</a></p>
</form>
"#,
        friendly = text_input("friendly_name", "Friendly name", &fields.friendly_name),
        model_name = text_input("model_name", "Model name", &fields.model_name),
        model_number = text_input("model_number", "Model number", &fields.model_number),
        serial = text_input("serial_number", "Serial number", &fields.serial_number),
        manufacturer = text_input("manufacturer", "Manufacturer", &fields.manufacturer),
        manufactured = date_input(
            "manufactured_date",
            "Manufactured date",
            format_date(fields.manufactured_date)
        ),
        description = opt(&fields.description),
        purchased = date_input(
            "purchase_date",
            "Purchase date",
            format_date(fields.purchase_date)
        ),
    );

    if item_id.is_some() && !attachments.is_empty() {
        body.push_str(&attachment_table(attachments));
    }

    layout(title, flash, &body)
}

fn attachment_table(attachments: &[attachment::Model]) -> String {
    let mut rows = String::new();
    for attachment in attachments {
        let _ = write!(
            rows,
            r#"<tr>
<td><input type="checkbox" name="attachment_ids" value="{id}" form="bulk-delete"></td>
<td><a href="/attachment/{id}">{name}</a></td><td>{size}</td><td>{uploaded}</td>
<td><form class="inline" method="post" action="/attachment/{id}/delete"><button type="submit">Delete</button></form></td>
</tr>
"#,
            id = attachment.id,
            name = escape(&attachment.original_filename),
            size = format_file_size(Some(attachment.file_size)),
            uploaded = attachment.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    format!(
        r#"<h2>Attachments</h2>
<table>
<thead><tr><th></th><th>File</th><th>Size</th><th>Uploaded</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<form id="bulk-delete" method="post" action="/attachments/delete">
<button type="submit">Delete selected</button>
</form>
"#
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        r#"<p>{}</p><p><a href="/">Back to inventory</a></p>"#,
        escape(message)
    );
    layout(title, None, &body)
}
