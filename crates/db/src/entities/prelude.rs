//! `SeaORM` Entity prelude, re-exporting each entity under its table name.

pub use super::entry_fees_payment_list::Entity as EntryFeesPaymentList;
pub use super::entry_fees_payment_list_event::Entity as EntryFeesPaymentListEvent;
pub use super::entry_fees_payment_list_subscription::Entity as EntryFeesPaymentListSubscription;
pub use super::entry_fees_payment_list_total::Entity as EntryFeesPaymentListTotal;
pub use super::entry_fees_period::Entity as EntryFeesPeriod;
pub use super::entry_fees_statement::Entity as EntryFeesStatement;
pub use super::entry_fees_statement_subscription::Entity as EntryFeesStatementSubscription;
pub use super::group_structure_map::Entity as GroupStructureMap;
pub use super::group_structures::Entity as GroupStructures;
