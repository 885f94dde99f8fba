//! `SeaORM` Entity for the group_structure_map table.
//!
//! One row per source team of a structure version, pointing at the billing
//! group that receives its consolidated statement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "group_structure_map")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_structure_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub source_group_id: Uuid,
    pub billing_group_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group_structures::Entity",
        from = "Column::GroupStructureId",
        to = "super::group_structures::Column::Id"
    )]
    GroupStructures,
}

impl Related<super::group_structures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupStructures.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
