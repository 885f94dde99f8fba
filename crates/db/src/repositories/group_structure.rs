//! Group structure repository for database operations.
//!
//! Structure versions are reference data: each version carries a set of
//! source-to-billing mappings, and at most one version is active at a time
//! (enforced by a partial unique index).

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use bordereau_core::billing::{BillingResolver, MappingEntry};
use bordereau_shared::types::{CursorPage, GroupId, GroupStructureId};

use crate::entities::{group_structure_map, group_structures};

/// Error types for group structure operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupStructureError {
    /// The same source group appears twice in the requested mappings.
    #[error("Duplicate source group in mappings: {0}")]
    DuplicateSourceGroup(Uuid),

    /// Group structure not found.
    #[error("Group structure not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a structure version.
#[derive(Debug, Clone)]
pub struct CreateGroupStructureInput {
    /// Optional human-readable label.
    pub label: Option<String>,
    /// Activate the new version immediately.
    pub activate: bool,
    /// Source-to-billing mapping rows.
    pub mappings: Vec<MappingEntry>,
}

/// A structure version together with its mapping rows.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStructureWithMappings {
    /// The structure version record.
    pub structure: group_structures::Model,
    /// Its mapping rows, ordered by source group.
    pub mappings: Vec<group_structure_map::Model>,
}

/// Group structure repository.
#[derive(Debug, Clone)]
pub struct GroupStructureRepository {
    db: DatabaseConnection,
}

impl GroupStructureRepository {
    /// Creates a new group structure repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a structure version with its mappings in one transaction,
    /// optionally activating it immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if a source group appears twice in the mappings or
    /// a database operation fails.
    pub async fn create(
        &self,
        input: CreateGroupStructureInput,
    ) -> Result<GroupStructureWithMappings, GroupStructureError> {
        let mut seen = HashSet::new();
        for entry in &input.mappings {
            if !seen.insert(entry.source_group_id) {
                return Err(GroupStructureError::DuplicateSourceGroup(
                    entry.source_group_id.into_inner(),
                ));
            }
        }

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();
        let structure_id = GroupStructureId::new().into_inner();

        let structure = group_structures::ActiveModel {
            id: Set(structure_id),
            label: Set(input.label),
            is_active: Set(false),
            created_at: Set(now),
        };
        let mut structure = structure.insert(&txn).await?;

        let mut mappings = Vec::with_capacity(input.mappings.len());
        for entry in &input.mappings {
            let row = group_structure_map::ActiveModel {
                group_structure_id: Set(structure_id),
                source_group_id: Set(entry.source_group_id.into_inner()),
                billing_group_id: Set(entry.billing_group_id.into_inner()),
            };
            mappings.push(row.insert(&txn).await?);
        }

        if input.activate {
            structure = activate_in_txn(&txn, structure_id)
                .await?
                .ok_or(GroupStructureError::NotFound(structure_id))?;
        }

        txn.commit().await?;

        tracing::info!(
            structure_id = %structure_id,
            mappings = mappings.len(),
            active = structure.is_active,
            "created group structure version"
        );

        mappings.sort_by_key(|m| m.source_group_id);
        Ok(GroupStructureWithMappings {
            structure,
            mappings,
        })
    }

    /// Lists structure versions newest first with cursor pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        page: &CursorPage,
    ) -> Result<(Vec<group_structures::Model>, u64), GroupStructureError> {
        let total = group_structures::Entity::find().count(&self.db).await?;

        let mut query = group_structures::Entity::find()
            .order_by_desc(group_structures::Column::CreatedAt)
            .order_by_desc(group_structures::Column::Id);
        if let Some(cursor) = page.cursor {
            query = query.filter(group_structures::Column::CreatedAt.lt(cursor));
        }
        let items = query.limit(page.limit()).all(&self.db).await?;

        Ok((items, total))
    }

    /// Finds a structure version by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<group_structures::Model>, GroupStructureError> {
        Ok(group_structures::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Returns the currently active structure version, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self) -> Result<Option<group_structures::Model>, GroupStructureError> {
        Ok(group_structures::Entity::find()
            .filter(group_structures::Column::IsActive.eq(true))
            .one(&self.db)
            .await?)
    }

    /// Activates one version: deactivates every other version and flips the
    /// target, in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GroupStructureError::NotFound`] if the target does not
    /// exist.
    pub async fn activate(&self, id: Uuid) -> Result<group_structures::Model, GroupStructureError> {
        let txn = self.db.begin().await?;

        let Some(structure) = activate_in_txn(&txn, id).await? else {
            return Err(GroupStructureError::NotFound(id));
        };

        txn.commit().await?;
        tracing::info!(structure_id = %id, "activated group structure version");
        Ok(structure)
    }

    /// Returns the mapping rows of a version, ordered by source group.
    ///
    /// # Errors
    ///
    /// Returns [`GroupStructureError::NotFound`] if the version does not
    /// exist.
    pub async fn mappings(
        &self,
        id: Uuid,
    ) -> Result<Vec<group_structure_map::Model>, GroupStructureError> {
        let Some(_) = self.find_by_id(id).await? else {
            return Err(GroupStructureError::NotFound(id));
        };

        Ok(group_structure_map::Entity::find()
            .filter(group_structure_map::Column::GroupStructureId.eq(id))
            .order_by_asc(group_structure_map::Column::SourceGroupId)
            .all(&self.db)
            .await?)
    }

    /// Builds a pure billing resolver from one version's mapping rows.
    ///
    /// # Errors
    ///
    /// Returns [`GroupStructureError::NotFound`] if the version does not
    /// exist.
    pub async fn resolver(&self, id: Uuid) -> Result<BillingResolver, GroupStructureError> {
        let rows = self.mappings(id).await?;
        let entries = rows.into_iter().map(|row| MappingEntry {
            source_group_id: GroupId::from_uuid(row.source_group_id),
            billing_group_id: GroupId::from_uuid(row.billing_group_id),
        });
        Ok(BillingResolver::new(GroupStructureId::from_uuid(id), entries))
    }
}

/// Deactivates every active version and activates the target within the
/// caller's transaction. Returns `None` when the target does not exist.
async fn activate_in_txn(
    txn: &sea_orm::DatabaseTransaction,
    id: Uuid,
) -> Result<Option<group_structures::Model>, DbErr> {
    let existing = group_structures::Entity::find_by_id(id).one(txn).await?;
    if existing.is_none() {
        return Ok(None);
    }

    group_structures::Entity::update_many()
        .col_expr(group_structures::Column::IsActive, Expr::value(false))
        .filter(group_structures::Column::IsActive.eq(true))
        .exec(txn)
        .await?;

    let updated = group_structures::ActiveModel {
        id: Set(id),
        is_active: Set(true),
        ..Default::default()
    }
    .update(txn)
    .await?;

    Ok(Some(updated))
}
