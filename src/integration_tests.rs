// ABOUTME: Integration tests for the HTTP routes
// ABOUTME: Drives full request/response flows against a temporary database and upload folder

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serial_test::serial;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::types::ItemListResponse;

    struct TestApp {
        server: TestServer,
        storage: Arc<Storage>,
        _temp_dir: TempDir,
    }

    async fn create_test_app() -> TestApp {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            database_url: format!(
                "sqlite:{}?mode=rwc",
                temp_dir.path().join("test.db").display()
            ),
            secret_key: "integration-test-secret".to_string(),
            upload_folder: temp_dir.path().join("uploads"),
            max_content_length: 64 * 1024,
            ..Config::default()
        };

        let storage = Storage::connect(&config.database_url, config.upload_folder.clone())
            .await
            .unwrap();
        let state = AppState::new(storage, config);
        let storage = state.storage.clone();

        TestApp {
            server: TestServer::new(build_router(state)).unwrap(),
            storage,
            _temp_dir: temp_dir,
        }
    }

    fn pdf(name: &str, content: &'static [u8]) -> Part {
        Part::bytes(content)
            .file_name(name)
            .mime_type("application/pdf")
    }

    fn item_form(friendly_name: &str) -> MultipartForm {
        MultipartForm::new()
            .add_text("friendly_name", friendly_name)
            .add_text("model_name", "")
            .add_text("manufactured_date", "")
            .add_text("purchase_date", "2024-01-15")
            .add_text("purchase_price", "1299.5")
    }

    #[tokio::test]
    #[serial]
    async fn test_homepage_loads() {
        let app = create_test_app().await;

        let response = app.server.get("/").await;
        response.assert_status_ok();
        response.assert_text_contains("No items yet");
    }

    #[tokio::test]
    #[serial]
    async fn test_add_form_loads() {
        let app = create_test_app().await;

        let response = app.server.get("/add").await;
        response.assert_status_ok();
        response.assert_text_contains(r#"enctype="multipart/form-data""#);
    }

    #[tokio::test]
    #[serial]
    async fn test_security_headers() {
        let app = create_test_app().await;

        let response = app.server.get("/").await;
        assert_eq!(response.header("x-frame-options"), "DENY");
        assert_eq!(response.header("x-content-type-options"), "nosniff");
    }

    #[tokio::test]
    #[serial]
    async fn test_create_item_redirects_and_lists_first() {
        let app = create_test_app().await;

        app.server
            .post("/add")
            .multipart(item_form("Old toaster"))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = app
            .server
            .post("/add")
            .multipart(item_form("New fridge"))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");

        let page = app.server.get("/").await.text();
        let newer = page.find("New fridge").unwrap();
        let older = page.find("Old toaster").unwrap();
        assert!(newer < older);
        assert!(page.contains("$1,299.50"));
        assert!(page.contains("2024-01-15"));
    }

    #[tokio::test]
    #[serial]
    async fn test_create_item_with_uploads_reports_rejected_files() {
        let app = create_test_app().await;

        let form = item_form("Washer")
            .add_part("attachments", pdf("receipt.pdf", b"%PDF receipt"))
            .add_part(
                "attachments",
                Part::bytes(b"MZ".as_slice())
                    .file_name("receipt.exe")
                    .mime_type("application/octet-stream"),
            );
        let response = app.server.post("/add").multipart(form).await;
        response.assert_status(StatusCode::SEE_OTHER);

        let items = app.storage.list_items().await.unwrap();
        assert_eq!(items.len(), 1);
        let attachments = app.storage.item_attachments(items[0].id).await.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].original_filename, "receipt.pdf");
        assert_eq!(attachments[0].content_type.as_deref(), Some("application/pdf"));

        let page = app
            .server
            .get("/")
            .add_cookie(response.cookie("flash"))
            .await
            .text();
        assert!(page.contains("Item added successfully!"));
        assert!(page.contains("Skipped files with a disallowed type: receipt.exe"));
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_file_part_is_ignored() {
        let app = create_test_app().await;

        let form = item_form("Kettle").add_part(
            "attachments",
            Part::bytes(Vec::<u8>::new())
                .file_name("")
                .mime_type("application/octet-stream"),
        );
        app.server
            .post("/add")
            .multipart(form)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let items = app.storage.list_items().await.unwrap();
        assert!(app.storage.item_attachments(items[0].id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_oversized_upload_is_rejected_before_writing() {
        let app = create_test_app().await;

        static BIG: [u8; 128 * 1024] = [b'x'; 128 * 1024];
        let form = item_form("Piano").add_part("attachments", pdf("scan.pdf", &BIG));

        let response = app.server.post("/add").multipart(form).await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

        assert!(app.storage.list_items().await.unwrap().is_empty());
        let written = std::fs::read_dir(app.storage.upload_dir()).unwrap().count();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_edit_unknown_item_is_not_found() {
        let app = create_test_app().await;

        app.server
            .get("/edit/999")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .post("/delete/999")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .get("/attachment/999")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .post("/attachment/999/delete")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_edit_overwrites_fields_and_appends_uploads() {
        let app = create_test_app().await;

        app.server
            .post("/add")
            .multipart(item_form("Blender").add_part("attachments", pdf("manual.pdf", b"v1")))
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let id = app.storage.list_items().await.unwrap()[0].id;

        let edit_page = app.server.get(&format!("/edit/{}", id)).await;
        edit_page.assert_status_ok();
        edit_page.assert_text_contains("manual.pdf");

        let form = MultipartForm::new()
            .add_text("friendly_name", "Kitchen blender")
            .add_text("purchase_date", "not-a-date")
            .add_text("purchase_price", "abc")
            .add_part("attachments", pdf("warranty.pdf", b"w"));
        app.server
            .post(&format!("/edit/{}", id))
            .multipart(form)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let item = app.storage.find_item(id).await.unwrap();
        assert_eq!(item.friendly_name.as_deref(), Some("Kitchen blender"));
        assert_eq!(item.purchase_date, None);
        assert_eq!(item.purchase_price, None);
        assert_eq!(app.storage.item_attachments(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_edit_form_keeps_stored_price_exact() {
        let app = create_test_app().await;

        let form = MultipartForm::new()
            .add_text("friendly_name", "Kettle")
            .add_text("purchase_price", "19.999");
        app.server
            .post("/add")
            .multipart(form)
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let id = app.storage.list_items().await.unwrap()[0].id;

        let edit_page = app.server.get(&format!("/edit/{}", id)).await;
        edit_page.assert_status_ok();
        edit_page.assert_text_contains(r#"value="19.999""#);

        // Saving the form unchanged must not round the price.
        let resubmit = MultipartForm::new()
            .add_text("friendly_name", "Kettle")
            .add_text("purchase_price", "19.999");
        app.server
            .post(&format!("/edit/{}", id))
            .multipart(resubmit)
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let item = app.storage.find_item(id).await.unwrap();
        assert_eq!(item.purchase_price, Some(19.999));
    }

    #[tokio::test]
    #[serial]
    async fn test_download_uses_original_filename() {
        let app = create_test_app().await;

        app.server
            .post("/add")
            .multipart(item_form("Router").add_part("attachments", pdf("setup guide.pdf", b"guide")))
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let id = app.storage.list_items().await.unwrap()[0].id;
        let attachment = app.storage.item_attachments(id).await.unwrap().remove(0);

        let response = app
            .server
            .get(&format!("/attachment/{}", attachment.id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), b"guide");
        assert_eq!(response.header("content-type"), "application/pdf");
        let disposition = response.header("content-disposition");
        let disposition = disposition.to_str().unwrap();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains("filename=\"setup guide.pdf\""));
    }

    #[tokio::test]
    #[serial]
    async fn test_delete_item_removes_files() {
        let app = create_test_app().await;

        let form = item_form("Heater")
            .add_part("attachments", pdf("a.pdf", b"a"))
            .add_part("attachments", pdf("b.pdf", b"b"));
        app.server
            .post("/add")
            .multipart(form)
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let id = app.storage.list_items().await.unwrap()[0].id;
        let stored: Vec<_> = app
            .storage
            .item_attachments(id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| app.storage.upload_dir().join(a.filename))
            .collect();
        assert_eq!(stored.len(), 2);

        let response = app.server.post(&format!("/delete/{}", id)).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");

        assert!(app.storage.item_attachments(id).await.unwrap().is_empty());
        assert!(stored.iter().all(|p| !p.exists()));
        app.server
            .get(&format!("/edit/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_delete_attachment_redirects_to_owner() {
        let app = create_test_app().await;

        app.server
            .post("/add")
            .multipart(item_form("Desk").add_part("attachments", pdf("assembly.pdf", b"x")))
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let id = app.storage.list_items().await.unwrap()[0].id;
        let attachment = app.storage.item_attachments(id).await.unwrap().remove(0);

        let response = app
            .server
            .post(&format!("/attachment/{}/delete", attachment.id))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), format!("/edit/{}", id).as_str());
        assert!(app.storage.item_attachments(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_bulk_delete_counts_only_existing() {
        let app = create_test_app().await;

        let form = item_form("Sofa")
            .add_part("attachments", pdf("a.pdf", b"a"))
            .add_part("attachments", pdf("b.pdf", b"b"));
        app.server
            .post("/add")
            .multipart(form)
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let id = app.storage.list_items().await.unwrap()[0].id;
        let ids: Vec<i32> = app
            .storage
            .item_attachments(id)
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();

        let body = format!(
            "attachment_ids={}&attachment_ids=9999&attachment_ids={}",
            ids[0], ids[1]
        );
        let response = app
            .server
            .post("/attachments/delete")
            .text(body)
            .content_type("application/x-www-form-urlencoded")
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), format!("/edit/{}", id).as_str());

        let page = app
            .server
            .get(&format!("/edit/{}", id))
            .add_cookie(response.cookie("flash"))
            .await
            .text();
        assert!(page.contains("2 attachment(s) deleted successfully!"));
        assert!(app.storage.item_attachments(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_bulk_delete_ignores_non_numeric_ids() {
        let app = create_test_app().await;

        app.server
            .post("/add")
            .multipart(item_form("Desk").add_part("attachments", pdf("a.pdf", b"a")))
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let id = app.storage.list_items().await.unwrap()[0].id;
        let attachment_id = app.storage.item_attachments(id).await.unwrap()[0].id;

        let response = app
            .server
            .post("/attachments/delete")
            .text(format!(
                "attachment_ids=bogus&attachment_ids={}&attachment_ids=",
                attachment_id
            ))
            .content_type("application/x-www-form-urlencoded")
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), format!("/edit/{}", id).as_str());

        let page = app
            .server
            .get(&format!("/edit/{}", id))
            .add_cookie(response.cookie("flash"))
            .await
            .text();
        assert!(page.contains("1 attachment(s) deleted successfully!"));
        assert!(app.storage.item_attachments(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_bulk_delete_with_no_matches_goes_home() {
        let app = create_test_app().await;

        let response = app
            .server
            .post("/attachments/delete")
            .text("attachment_ids=1&attachment_ids=2")
            .content_type("application/x-www-form-urlencoded")
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");
    }

    #[tokio::test]
    #[serial]
    async fn test_api_items_json() {
        let app = create_test_app().await;

        app.server
            .post("/add")
            .multipart(item_form("Monitor").add_part("attachments", pdf("spec.pdf", &[0u8; 2048])))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = app.server.get("/api/items").await;
        response.assert_status_ok();
        let listing: ItemListResponse = response.json();

        assert_eq!(listing.items.len(), 1);
        let item = &listing.items[0];
        assert_eq!(item.friendly_name.as_deref(), Some("Monitor"));
        assert_eq!(item.model_name, None);
        assert_eq!(item.manufactured_date, None);
        assert_eq!(item.purchase_date.as_deref(), Some("2024-01-15"));
        assert_eq!(item.purchase_price, Some(1299.5));
        assert_eq!(item.attachments.len(), 1);
        assert_eq!(item.attachments[0].file_size_display, "2.0 KB");
    }

    #[tokio::test]
    #[serial]
    async fn test_api_items_lists_newest_first() {
        let app = create_test_app().await;

        for name in ["Older", "Newer"] {
            app.server
                .post("/add")
                .multipart(item_form(name))
                .await
                .assert_status(StatusCode::SEE_OTHER);
        }

        let listing: ItemListResponse = app.server.get("/api/items").await.json();
        let names: Vec<_> = listing
            .items
            .iter()
            .map(|item| item.friendly_name.as_deref())
            .collect();
        assert_eq!(names, vec![Some("Newer"), Some("Older")]);
    }
}
