//! `SeaORM` entities for the entry-fee billing schema.

pub mod prelude;

pub mod entry_fees_payment_list;
pub mod entry_fees_payment_list_event;
pub mod entry_fees_payment_list_subscription;
pub mod entry_fees_payment_list_total;
pub mod entry_fees_period;
pub mod entry_fees_statement;
pub mod entry_fees_statement_subscription;
pub mod group_structure_map;
pub mod group_structures;
pub mod sea_orm_active_enums;
