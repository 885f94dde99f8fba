//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod group_structure;
pub mod payment_list;
pub mod period;
pub mod statement;

pub use group_structure::{
    CreateGroupStructureInput, GroupStructureError, GroupStructureRepository,
    GroupStructureWithMappings,
};
pub use payment_list::{
    CreatePaymentListInput, CreatedPaymentList, GenerationOutcome, PaymentListDetail,
    PaymentListError, PaymentListFilter, PaymentListRepository, PaymentListSummary,
    RecordEventInput, SubscriptionConflict, TotalInput,
};
pub use period::{
    PeriodBatchOutcome, PeriodCursor, PeriodError, PeriodFilter, PeriodPage, PeriodRepository,
};
pub use statement::{
    CancelledStatement, PaymentStatusUpdate, StatementError, StatementFilter, StatementRepository,
    StatementRow, StatusChange,
};
