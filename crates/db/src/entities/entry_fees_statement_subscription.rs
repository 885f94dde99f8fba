//! `SeaORM` Entity for the entry_fees_statement_subscription table.
//!
//! Statement lines: one immutable per-subscription snapshot of the fee and
//! the team it originated from at generation time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_fees_statement_subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_fees_statement_id: Uuid,
    pub subscription_id: Uuid,
    pub snapshot_source_group_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub snapshot_total_amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::entry_fees_statement::Entity",
        from = "Column::EntryFeesStatementId",
        to = "super::entry_fees_statement::Column::Id"
    )]
    EntryFeesStatement,
}

impl Related<super::entry_fees_statement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesStatement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
