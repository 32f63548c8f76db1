// ABOUTME: Item entity for one recorded inventory asset with purchase metadata
// ABOUTME: Owns zero or more attachments, which are removed along with it

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub model_name: Option<String>,
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub manufactured_date: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub friendly_name: Option<String>,
    pub purchase_date: Option<Date>,
    #[sea_orm(column_type = "Double", nullable)]
    pub purchase_price: Option<f64>,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Name shown in listings: friendly name, then model name, then the id.
    pub fn display_name(&self) -> String {
        self.friendly_name
            .as_deref()
            .or(self.model_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Item #{}", self.id))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
