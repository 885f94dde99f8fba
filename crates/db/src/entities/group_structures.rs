//! `SeaORM` Entity for the group_structures table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "group_structures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub label: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_structure_map::Entity")]
    GroupStructureMap,
    #[sea_orm(has_many = "super::entry_fees_payment_list::Entity")]
    EntryFeesPaymentList,
}

impl Related<super::group_structure_map::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupStructureMap.def()
    }
}

impl Related<super::entry_fees_payment_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFeesPaymentList.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
