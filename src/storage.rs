// ABOUTME: SeaORM storage layer for inventory items and their attachments
// ABOUTME: Runs every write in a transaction and keeps the upload folder in step with the rows

use anyhow::Result as AnyResult;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DatabaseTransaction, EntityTrait,
    LoaderTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::attachments::{remove_stored_file, store_upload};
use crate::entities::{attachment, item};
use crate::error::{AppError, Result};
use crate::types::{ItemFields, UploadedFile};

pub struct Storage {
    pub db: DatabaseConnection,
    pub upload_dir: PathBuf,
}

/// Result of a successful create or edit.
#[derive(Debug)]
pub struct SaveOutcome {
    pub item: item::Model,
    pub attachments: Vec<attachment::Model>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BulkDeleteOutcome {
    pub deleted: usize,
    pub item_id: Option<i32>,
}

impl Storage {
    pub async fn connect(database_url: &str, upload_dir: impl Into<PathBuf>) -> AnyResult<Self> {
        let db = Database::connect(database_url).await?;
        crate::migration::Migrator::up(&db, None).await?;

        let upload_dir = upload_dir.into();
        tokio::fs::create_dir_all(&upload_dir).await?;

        Ok(Self { db, upload_dir })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn list_items(&self) -> Result<Vec<item::Model>> {
        let items = item::Entity::find()
            .order_by_desc(item::Column::CreatedAt)
            .order_by_desc(item::Column::Id)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    pub async fn list_items_with_attachments(
        &self,
    ) -> Result<Vec<(item::Model, Vec<attachment::Model>)>> {
        let items = self.list_items().await?;
        let attachments = items.load_many(attachment::Entity, &self.db).await?;

        Ok(items
            .into_iter()
            .zip(attachments)
            .map(|(item, mut owned)| {
                owned.sort_by_key(|a| a.id);
                (item, owned)
            })
            .collect())
    }

    pub async fn find_item(&self, id: i32) -> Result<item::Model> {
        item::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    pub async fn item_attachments(&self, item_id: i32) -> Result<Vec<attachment::Model>> {
        let attachments = attachment::Entity::find()
            .filter(attachment::Column::ItemId.eq(item_id))
            .order_by_asc(attachment::Column::CreatedAt)
            .order_by_asc(attachment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(attachments)
    }

    pub async fn find_attachment(&self, id: i32) -> Result<attachment::Model> {
        attachment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("attachment {}", id)))
    }

    /// Inserts a new item and stores its uploads. Any failure rolls back the item
    /// row and removes every file written by this call.
    pub async fn create_item(
        &self,
        fields: &ItemFields,
        uploads: &[UploadedFile],
    ) -> Result<SaveOutcome> {
        let txn = self.db.begin().await?;

        let mut record = item::ActiveModel {
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        apply_fields(&mut record, fields);

        let item = match record.insert(&txn).await {
            Ok(item) => item,
            Err(err) => {
                txn.rollback().await?;
                return Err(err.into());
            }
        };

        self.finish_save(txn, item, uploads).await
    }

    /// Overwrites every mutable column of an existing item and appends uploads as
    /// new attachments. Existing attachments are left alone.
    pub async fn update_item(
        &self,
        id: i32,
        fields: &ItemFields,
        uploads: &[UploadedFile],
    ) -> Result<SaveOutcome> {
        let txn = self.db.begin().await?;

        let existing = item::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))?;

        let mut record: item::ActiveModel = existing.into();
        apply_fields(&mut record, fields);

        let item = match record.update(&txn).await {
            Ok(item) => item,
            Err(err) => {
                txn.rollback().await?;
                return Err(err.into());
            }
        };

        self.finish_save(txn, item, uploads).await
    }

    async fn finish_save(
        &self,
        txn: DatabaseTransaction,
        item: item::Model,
        uploads: &[UploadedFile],
    ) -> Result<SaveOutcome> {
        let mut attachments = Vec::new();
        let mut rejected = Vec::new();

        for upload in uploads {
            match store_upload(&txn, &self.upload_dir, upload, item.id).await {
                Ok(Some(stored)) => attachments.push(stored),
                Ok(None) => rejected.push(upload.file_name.clone()),
                Err(err) => {
                    self.discard(&attachments).await;
                    txn.rollback().await?;
                    return Err(err);
                }
            }
        }

        if let Err(err) = txn.commit().await {
            self.discard(&attachments).await;
            return Err(err.into());
        }

        Ok(SaveOutcome {
            item,
            attachments,
            rejected,
        })
    }

    async fn discard(&self, written: &[attachment::Model]) {
        for stored in written {
            remove_stored_file(&self.upload_dir, &stored.filename).await;
        }
    }

    /// Removes the item's files, then its attachment rows, then the item itself,
    /// all inside one transaction. Returns how many attachments went with it.
    pub async fn delete_item(&self, id: i32) -> Result<usize> {
        let txn = self.db.begin().await?;

        let existing = item::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))?;

        let owned = attachment::Entity::find()
            .filter(attachment::Column::ItemId.eq(existing.id))
            .all(&txn)
            .await?;

        for stored in &owned {
            remove_stored_file(&self.upload_dir, &stored.filename).await;
        }

        attachment::Entity::delete_many()
            .filter(attachment::Column::ItemId.eq(existing.id))
            .exec(&txn)
            .await?;
        item::Entity::delete_by_id(existing.id).exec(&txn).await?;

        txn.commit().await?;
        Ok(owned.len())
    }

    pub async fn delete_attachment(&self, id: i32) -> Result<attachment::Model> {
        let txn = self.db.begin().await?;

        let existing = attachment::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("attachment {}", id)))?;

        remove_stored_file(&self.upload_dir, &existing.filename).await;
        attachment::Entity::delete_by_id(existing.id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(existing)
    }

    /// Deletes each attachment that exists. Unknown ids are skipped. The reported
    /// item is the owner of the first attachment actually deleted.
    pub async fn bulk_delete_attachments(&self, ids: &[i32]) -> Result<BulkDeleteOutcome> {
        let txn = self.db.begin().await?;
        let mut outcome = BulkDeleteOutcome::default();
        let mut seen = HashSet::new();

        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            let Some(existing) = attachment::Entity::find_by_id(id).one(&txn).await? else {
                tracing::debug!(attachment_id = id, "Skipping unknown attachment in bulk delete");
                continue;
            };

            remove_stored_file(&self.upload_dir, &existing.filename).await;
            attachment::Entity::delete_by_id(existing.id)
                .exec(&txn)
                .await?;

            outcome.deleted += 1;
            outcome.item_id.get_or_insert(existing.item_id);
        }

        txn.commit().await?;
        Ok(outcome)
    }
}

fn apply_fields(record: &mut item::ActiveModel, fields: &ItemFields) {
    record.model_name = Set(fields.model_name.clone());
    record.model_number = Set(fields.model_number.clone());
    record.serial_number = Set(fields.serial_number.clone());
    record.manufacturer = Set(fields.manufacturer.clone());
    record.manufactured_date = Set(fields.manufactured_date);
    record.description = Set(fields.description.clone());
    record.friendly_name = Set(fields.friendly_name.clone());
    record.purchase_date = Set(fields.purchase_date);
    record.purchase_price = Set(fields.purchase_price);
}
