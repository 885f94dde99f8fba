//! `SeaORM` Entity for the entry_fees_payment_list table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_fees_payment_list")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text")]
    pub created_by: String,
    pub group_structure_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub period_label: Option<String>,
    pub subscriptions_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group_structures::Entity",
        from = "Column::GroupStructureId",
        to = "super::group_structures::Column::Id"
    )]
    GroupStructures,
    #[sea_orm(has_many = "super::entry_fees_payment_list_subscription::Entity")]
    EntryFeesPaymentListSubscription,
    #[sea_orm(has_many = "super::entry_fees_payment_list_total::Entity")]
    EntryFeesPaymentListTotal,
    #[sea_orm(has_many = "super::entry_fees_payment_list_event::Entity")]
    EntryFeesPaymentListEvent,
    #[sea_orm(has_many = "super::entry_fees_statement::Entity")]
    EntryFeesStatement,
}

impl Related<super::group_structures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupStructures.def()
    }
}

impl Related<super::entry_fees_payment_list_subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesPaymentListSubscription.def()
    }
}

impl Related<super::entry_fees_payment_list_total::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesPaymentListTotal.def()
    }
}

impl Related<super::entry_fees_payment_list_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesPaymentListEvent.def()
    }
}

impl Related<super::entry_fees_statement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesStatement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
