use std::borrow::Cow;

use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::AppError;

/// Runs derive-based validation and folds every field message into one
/// `Validation Failed: ...` error.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|err| {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let details = fields
            .iter()
            .flat_map(|(_, errs)| errs.iter())
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => e.code.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        AppError::Validation(format!("Validation Failed: {}", details))
    })
}

/// Builds a `ValidationError` for a blank value, unless `value` has content.
pub fn require_not_blank(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed(message));
        return Err(err);
    }
    Ok(())
}

/// Trims `value`, rejecting it when nothing is left.
pub fn normalize_required(value: &str, message: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn parse_id(raw: &str, message: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(message.to_string()))
}
