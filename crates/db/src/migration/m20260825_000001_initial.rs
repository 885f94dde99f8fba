//! Initial database migration.
//!
//! Creates the full entry-fee billing schema: status enums, group structure
//! versions and their mappings, periods with a no-overlap exclusion
//! constraint, payment lists with their membership, totals and event ledger,
//! and statements with their line snapshots.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EXTENSIONS & ENUMS
        // ============================================================
        db.execute_unprepared(EXTENSIONS_SQL).await?;
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: GROUP STRUCTURES
        // ============================================================
        db.execute_unprepared(GROUP_STRUCTURES_SQL).await?;
        db.execute_unprepared(GROUP_STRUCTURE_MAP_SQL).await?;

        // ============================================================
        // PART 3: PERIODS
        // ============================================================
        db.execute_unprepared(PERIODS_SQL).await?;

        // ============================================================
        // PART 4: PAYMENT LISTS
        // ============================================================
        db.execute_unprepared(PAYMENT_LISTS_SQL).await?;
        db.execute_unprepared(PAYMENT_LIST_SUBSCRIPTIONS_SQL).await?;
        db.execute_unprepared(PAYMENT_LIST_TOTALS_SQL).await?;
        db.execute_unprepared(PAYMENT_LIST_EVENTS_SQL).await?;

        // ============================================================
        // PART 5: STATEMENTS
        // ============================================================
        db.execute_unprepared(STATEMENTS_SQL).await?;
        db.execute_unprepared(STATEMENT_SUBSCRIPTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const EXTENSIONS_SQL: &str = r"
-- daterange && over scalar-keyed GiST indexes
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ENUMS_SQL: &str = r"
-- Issue axis of a statement's lifecycle
CREATE TYPE entry_fees_issue_status AS ENUM ('ISSUED', 'CANCELLED');

-- Payment axis of a statement's lifecycle
CREATE TYPE entry_fees_payment_status AS ENUM ('UNPAID', 'PAID');
";

const GROUP_STRUCTURES_SQL: &str = r"
CREATE TABLE group_structures (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    label TEXT,
    is_active BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- At most one active version at any time
CREATE UNIQUE INDEX uq_group_structures_active ON group_structures(is_active) WHERE is_active;
CREATE INDEX idx_group_structures_created ON group_structures(created_at DESC);
";

const GROUP_STRUCTURE_MAP_SQL: &str = r"
CREATE TABLE group_structure_map (
    group_structure_id UUID NOT NULL REFERENCES group_structures(id) ON DELETE CASCADE,
    source_group_id UUID NOT NULL,
    billing_group_id UUID NOT NULL,
    PRIMARY KEY (group_structure_id, source_group_id)
);
";

const PERIODS_SQL: &str = r"
CREATE TABLE entry_fees_period (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    CONSTRAINT chk_entry_fees_period_dates CHECK (start_date < end_date),
    CONSTRAINT excl_entry_fees_period_overlap
        EXCLUDE USING gist (daterange(start_date, end_date) WITH &&)
);

CREATE INDEX idx_entry_fees_period_start ON entry_fees_period(start_date, id);
";

const PAYMENT_LISTS_SQL: &str = r"
CREATE TABLE entry_fees_payment_list (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_by TEXT NOT NULL,
    group_structure_id UUID NOT NULL REFERENCES group_structures(id),
    period_label TEXT,
    subscriptions_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_payment_list_created ON entry_fees_payment_list(created_at DESC);
CREATE INDEX idx_payment_list_created_by ON entry_fees_payment_list(created_by);
CREATE INDEX idx_payment_list_structure ON entry_fees_payment_list(group_structure_id);
";

const PAYMENT_LIST_SUBSCRIPTIONS_SQL: &str = r"
CREATE TABLE entry_fees_payment_list_subscription (
    entry_fees_payment_list_id UUID NOT NULL
        REFERENCES entry_fees_payment_list(id) ON DELETE CASCADE,
    subscription_id UUID NOT NULL,
    PRIMARY KEY (entry_fees_payment_list_id, subscription_id)
);

CREATE INDEX idx_payment_list_subscription_sub
    ON entry_fees_payment_list_subscription(subscription_id);
";

const PAYMENT_LIST_TOTALS_SQL: &str = r"
CREATE TABLE entry_fees_payment_list_total (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entry_fees_payment_list_id UUID NOT NULL
        REFERENCES entry_fees_payment_list(id) ON DELETE CASCADE,
    currency TEXT NOT NULL,
    total_announced NUMERIC(18,2) NOT NULL DEFAULT 0,
    statements_count INTEGER NOT NULL DEFAULT 0,
    subscriptions_count INTEGER NOT NULL DEFAULT 0,
    UNIQUE (entry_fees_payment_list_id, currency)
);
";

const PAYMENT_LIST_EVENTS_SQL: &str = r"
CREATE TABLE entry_fees_payment_list_event (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entry_fees_payment_list_id UUID NOT NULL
        REFERENCES entry_fees_payment_list(id) ON DELETE CASCADE,
    currency TEXT NOT NULL,
    amount_delta NUMERIC(18,2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    reason TEXT,
    statement_id UUID
);

-- At most one compensating event per statement
CREATE UNIQUE INDEX uq_payment_list_event_statement
    ON entry_fees_payment_list_event(statement_id) WHERE statement_id IS NOT NULL;
CREATE INDEX idx_payment_list_event_list
    ON entry_fees_payment_list_event(entry_fees_payment_list_id, created_at DESC);
";

const STATEMENTS_SQL: &str = r"
CREATE TABLE entry_fees_statement (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entry_fees_payment_list_id UUID NOT NULL
        REFERENCES entry_fees_payment_list(id) ON DELETE CASCADE,
    group_key UUID NOT NULL,
    statement_number TEXT NOT NULL,
    issue_status entry_fees_issue_status NOT NULL DEFAULT 'ISSUED',
    payment_status entry_fees_payment_status NOT NULL DEFAULT 'UNPAID',
    currency TEXT NOT NULL,
    total_amount NUMERIC(18,2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    paid_at TIMESTAMPTZ,
    cancelled_at TIMESTAMPTZ,
    UNIQUE (entry_fees_payment_list_id, statement_number),
    -- One statement per (billing group, currency) bucket; final authority
    -- behind the idempotent-generation contract
    UNIQUE (entry_fees_payment_list_id, group_key, currency)
);

CREATE INDEX idx_statement_list ON entry_fees_statement(entry_fees_payment_list_id, created_at);
CREATE INDEX idx_statement_created ON entry_fees_statement(created_at DESC);
CREATE INDEX idx_statement_group_key ON entry_fees_statement(group_key);
";

const STATEMENT_SUBSCRIPTIONS_SQL: &str = r"
CREATE TABLE entry_fees_statement_subscription (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entry_fees_statement_id UUID NOT NULL
        REFERENCES entry_fees_statement(id) ON DELETE CASCADE,
    subscription_id UUID NOT NULL,
    snapshot_source_group_id UUID NOT NULL,
    snapshot_total_amount NUMERIC(18,2) NOT NULL DEFAULT 0,
    UNIQUE (entry_fees_statement_id, subscription_id)
);

CREATE INDEX idx_statement_subscription_sub
    ON entry_fees_statement_subscription(subscription_id);
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS entry_fees_statement_subscription CASCADE;
DROP TABLE IF EXISTS entry_fees_statement CASCADE;
DROP TABLE IF EXISTS entry_fees_payment_list_event CASCADE;
DROP TABLE IF EXISTS entry_fees_payment_list_total CASCADE;
DROP TABLE IF EXISTS entry_fees_payment_list_subscription CASCADE;
DROP TABLE IF EXISTS entry_fees_payment_list CASCADE;
DROP TABLE IF EXISTS entry_fees_period CASCADE;
DROP TABLE IF EXISTS group_structure_map CASCADE;
DROP TABLE IF EXISTS group_structures CASCADE;

DROP TYPE IF EXISTS entry_fees_payment_status;
DROP TYPE IF EXISTS entry_fees_issue_status;
";
