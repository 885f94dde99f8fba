//! Database seeder for Bordereau development and testing.
//!
//! Seeds one group structure version with mappings, the current billing
//! period, and one payment list with generated statements.
//!
//! Usage: cargo run --bin seeder

use std::str::FromStr;

use chrono::{Datelike, Months, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use bordereau_core::billing::MappingEntry;
use bordereau_db::entities::{entry_fees_payment_list, group_structures};
use bordereau_db::repositories::group_structure::{
    CreateGroupStructureInput, GroupStructureRepository,
};
use bordereau_db::repositories::payment_list::{CreatePaymentListInput, PaymentListRepository};
use bordereau_db::repositories::period::{PeriodError, PeriodRepository};
use bordereau_shared::feed::FeedRecord;
use bordereau_shared::types::GroupId;

/// Label on the seeded structure version (used to detect a prior run).
const SEED_LABEL: &str = "Seeded structure";
/// Operator recorded on the seeded payment list.
const SEED_OPERATOR: &str = "seeder";

/// Source teams (consistent for all seeds).
const TEAM_LONDON: &str = "00000000-0000-0000-0000-000000000011";
const TEAM_PARIS: &str = "00000000-0000-0000-0000-000000000012";
const TEAM_ZURICH: &str = "00000000-0000-0000-0000-000000000013";
const TEAM_MILAN: &str = "00000000-0000-0000-0000-000000000014";
/// Billing parents the teams consolidate into.
const PARENT_EMEA: &str = "00000000-0000-0000-0000-000000000001";
const PARENT_CH: &str = "00000000-0000-0000-0000-000000000002";

/// Seeded feed snapshot: (subscription, source team, currency, entry fee).
const SEED_FEES: [(&str, &str, &str, &str); 6] = [
    (
        "00000000-0000-0000-0000-000000000101",
        TEAM_LONDON,
        "EUR",
        "1200.00",
    ),
    (
        "00000000-0000-0000-0000-000000000102",
        TEAM_LONDON,
        "EUR",
        "880.50",
    ),
    (
        "00000000-0000-0000-0000-000000000103",
        TEAM_PARIS,
        "EUR",
        "430.25",
    ),
    (
        "00000000-0000-0000-0000-000000000104",
        TEAM_MILAN,
        "EUR",
        "990.00",
    ),
    (
        "00000000-0000-0000-0000-000000000105",
        TEAM_ZURICH,
        "CHF",
        "2100.00",
    ),
    (
        "00000000-0000-0000-0000-000000000106",
        TEAM_ZURICH,
        "CHF",
        "145.75",
    ),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = bordereau_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding group structure...");
    let structure_id = seed_structure(&db).await;

    println!("Seeding entry-fee period...");
    seed_period(&db).await;

    println!("Seeding payment list...");
    seed_payment_list(&db, structure_id).await;

    println!("Seeding complete!");
}

fn group(raw: &str) -> GroupId {
    GroupId::from_uuid(Uuid::parse_str(raw).expect("seed uuid"))
}

/// Seeds the active structure version with its mappings.
async fn seed_structure(db: &DatabaseConnection) -> Uuid {
    // Check if a previous run already created the structure
    if let Some(existing) = group_structures::Entity::find()
        .filter(group_structures::Column::Label.eq(SEED_LABEL))
        .one(db)
        .await
        .ok()
        .flatten()
    {
        println!("  Group structure already exists, skipping...");
        return existing.id;
    }

    let mappings = vec![
        MappingEntry {
            source_group_id: group(TEAM_LONDON),
            billing_group_id: group(PARENT_EMEA),
        },
        MappingEntry {
            source_group_id: group(TEAM_PARIS),
            billing_group_id: group(PARENT_EMEA),
        },
        MappingEntry {
            source_group_id: group(TEAM_MILAN),
            billing_group_id: group(PARENT_EMEA),
        },
        MappingEntry {
            source_group_id: group(TEAM_ZURICH),
            billing_group_id: group(PARENT_CH),
        },
    ];

    let repo = GroupStructureRepository::new(db.clone());
    let created = repo
        .create(CreateGroupStructureInput {
            label: Some(SEED_LABEL.to_string()),
            activate: true,
            mappings,
        })
        .await
        .expect("Failed to seed group structure");

    println!(
        "  Created group structure {} with {} mappings (active)",
        created.structure.id,
        created.mappings.len()
    );
    created.structure.id
}

/// Seeds the current calendar month as a billing period.
async fn seed_period(db: &DatabaseConnection) {
    let today = Utc::now().date_naive();
    let start = today.with_day(1).expect("first day of month");
    let end = start
        .checked_add_months(Months::new(1))
        .expect("first day of next month");

    let repo = PeriodRepository::new(db.clone());
    match repo.create(start, end).await {
        Ok(period) => println!("  Created period {} [{start}, {end})", period.id),
        Err(PeriodError::Overlap) => println!("  Period already exists, skipping..."),
        Err(e) => eprintln!("Failed to seed period: {e}"),
    }
}

/// Seeds one payment list with statements generated from the fee snapshot.
async fn seed_payment_list(db: &DatabaseConnection, structure_id: Uuid) {
    // Check if a previous run already created the list
    if entry_fees_payment_list::Entity::find()
        .filter(entry_fees_payment_list::Column::CreatedBy.eq(SEED_OPERATOR))
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Payment list already exists, skipping...");
        return;
    }

    let records: Vec<FeedRecord> = SEED_FEES
        .iter()
        .map(|(subscription, team, currency, amount)| FeedRecord {
            subscription_id: Uuid::parse_str(subscription).expect("seed uuid"),
            source_group_id: Some(Uuid::parse_str(team).expect("seed uuid")),
            currency: Some((*currency).to_string()),
            entry_fees_amount: Some(Decimal::from_str(amount).expect("seed amount")),
        })
        .collect();

    let subscription_ids = records.iter().map(|r| r.subscription_id).collect();

    let repo = PaymentListRepository::new(db.clone());
    match repo
        .create(CreatePaymentListInput {
            created_by: SEED_OPERATOR.to_string(),
            group_structure_id: Some(structure_id),
            period_label: Some(Utc::now().format("%Y-%m").to_string()),
            subscription_ids,
            totals: None,
            records,
        })
        .await
    {
        Ok(created) => {
            println!(
                "  Created payment list {} with {} statements:",
                created.payment_list.id,
                created.statements.len()
            );
            for statement in &created.statements {
                println!(
                    "    {}  {} {}",
                    statement.statement_number, statement.total_amount, statement.currency
                );
            }
        }
        Err(e) => eprintln!("Failed to seed payment list: {e}"),
    }
}
