use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PinError {
    #[error("Please enter a {expected}-digit PIN")]
    WrongLength { expected: usize },

    #[error("PIN must contain digits only")]
    NotNumeric,

    #[error("PINs do not match. Please try again.")]
    Mismatch,
}

/// Checks a quick PIN and its confirmation before it is stored.
pub fn validate_pin_setup(pin: &str, confirm: &str, length: usize) -> Result<(), PinError> {
    if pin.chars().count() != length {
        return Err(PinError::WrongLength { expected: length });
    }
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(PinError::NotNumeric);
    }
    if pin != confirm {
        return Err(PinError::Mismatch);
    }
    Ok(())
}
