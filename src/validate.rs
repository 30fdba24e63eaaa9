use crate::error::{Field, ValidationErrors};
use crate::model::InvoiceInput;

/// Minimum digits a business phone number must contain.
pub const MIN_PHONE_DIGITS: usize = 10;

pub const PHONE_TOO_SHORT: &str = "Phone number must contain at least 10 digits.";

/// Check the snapshot before composing. Only the business phone is checked;
/// every other field is accepted as typed.
pub fn validate(input: &InvoiceInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if digit_count(&input.phone_number) < MIN_PHONE_DIGITS {
        errors.add(Field::PhoneNumber, PHONE_TOO_SHORT);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn digit_count(raw: &str) -> usize {
    raw.chars().filter(|c| c.is_ascii_digit()).count()
}
