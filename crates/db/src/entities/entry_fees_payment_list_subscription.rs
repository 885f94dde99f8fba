//! `SeaORM` Entity for the entry_fees_payment_list_subscription table.
//!
//! Membership rows: which upstream subscriptions a payment list covers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_fees_payment_list_subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_fees_payment_list_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub subscription_id: Uuid,
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
