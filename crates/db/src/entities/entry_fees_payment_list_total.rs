//! `SeaORM` Entity for the entry_fees_payment_list_total table.
//!
//! One row per currency: the announced total frozen at creation time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_fees_payment_list_total")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_fees_payment_list_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total_announced: Decimal,
    pub statements_count: i32,
    pub subscriptions_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::entry_fees_payment_list::Entity",
        from = "Column::EntryFeesPaymentListId",
        to = "super::entry_fees_payment_list::Column::Id"
    )]
    EntryFeesPaymentList,
}

impl Related<super::entry_fees_payment_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesPaymentList.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
