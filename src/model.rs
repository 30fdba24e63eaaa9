use chrono::NaiveDate;

use crate::plan::PlanKey;

/// Encoded logo bytes as supplied by the user. Decoding happens at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoAttachment {
    /// File path or URL the bytes came from (for log messages)
    pub source: String,
    pub bytes: Vec<u8>,
}

/// Everything the composer needs, captured once before composing.
#[derive(Debug, Clone)]
pub struct InvoiceInput {
    pub business_name: String,
    pub contact_person: String,
    pub phone_number: String,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub plan: PlanKey,
    pub issue_date: NaiveDate,
    pub logo: Option<LogoAttachment>,
}
