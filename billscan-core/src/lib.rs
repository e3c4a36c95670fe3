//! billscan-core: data model shared by the carrier bill ingest and analysis crates

pub mod bill;
pub mod charge;
pub mod error;
pub mod money;
pub mod phone;

pub use bill::{
    BillAnalysisResult, BillingPeriod, Subtotals, TableValidation, UNKNOWN, ValidationStatus,
};
pub use charge::{Charge, ChargeCandidate, ChargeType, LineItem, SourcePass, TableType};
pub use error::BillError;
pub use money::{parse_amount, round_cents, sum_cents};
pub use phone::{
    PhoneLine, PhoneMatch, canonicalize_phone, find_phone_numbers, first_phone_number,
    UNKNOWN_DEVICE, UNKNOWN_LINE, UNKNOWN_PLAN,
};
