//! `SeaORM` Entity for the entry_fees_statement table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryFeesIssueStatus, EntryFeesPaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_fees_statement")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_fees_payment_list_id: Uuid,
    pub group_key: Uuid,
    #[sea_orm(column_type = "Text")]
    pub statement_number: String,
    pub issue_status: EntryFeesIssueStatus,
    pub payment_status: EntryFeesPaymentStatus,
    #[sea_orm(column_type = "Text")]
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total_amount: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::entry_fees_payment_list::Entity",
        from = "Column::EntryFeesPaymentListId",
        to = "super::entry_fees_payment_list::Column::Id"
    )]
    EntryFeesPaymentList,
    #[sea_orm(has_many = "super::entry_fees_statement_subscription::Entity")]
    EntryFeesStatementSubscription,
}

impl Related<super::entry_fees_payment_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesPaymentList.def()
    }
}

impl Related<super::entry_fees_statement_subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesStatementSubscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
