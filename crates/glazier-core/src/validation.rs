//! # Validation Module
//!
//! Opt-in input checks for the shop's forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form input                                                    │
//! │  └── Parse failures become NaN, empty strings stay empty                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (only when the caller asks for it)                │
//! │  ├── Dimensions and quantity are finite and positive                    │
//! │  └── Customer has a name and a phone, email looks like an email         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pricing                                                       │
//! │  └── Never fails; garbage in, NaN out                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use glazier_core::pricing::Dimensions;
//! use glazier_core::units::Unit;
//! use glazier_core::validation::{validate_dimensions, validate_quantity};
//!
//! validate_dimensions(&Dimensions::new(24.0, 36.0, Unit::Inch)).unwrap();
//! validate_quantity(2.0).unwrap();
//! assert!(validate_quantity(0.0).is_err());
//! ```

use crate::error::ValidationError;
use crate::pricing::Dimensions;
use crate::types::Customer;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

fn validate_measure(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    if value <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a measured width and height.
///
/// ## Rules
/// - Both values must be finite
/// - Both values must be greater than zero
///
/// The unit is not checked: unknown labels are priced as feet.
pub fn validate_dimensions(dims: &Dimensions) -> ValidationResult<()> {
    validate_measure("width", dims.width)?;
    validate_measure("height", dims.height)?;
    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be finite and positive
/// - Must not exceed MAX_ITEM_QUANTITY
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Quote: Add Line                                                        │
/// │                                                                         │
/// │  User enters quantity: 5                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5.0) ← THIS FUNCTION                                 │
/// │       │                                                                 │
/// │       ├── NaN / inf?  → Error: "quantity must be a finite number"       │
/// │       ├── qty <= 0?   → Error: "quantity must be positive"              │
/// │       ├── qty > 999?  → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → calculate_price()                                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    validate_measure("quantity", qty)?;

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1.0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty
/// - Digits plus `+`, spaces and hyphens only
/// - Between 7 and 15 digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    validate_required("phone", phone, 20)?;

    let phone = phone.trim();
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, hyphens and a leading +".to_string(),
        });
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must have between 7 and 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address. Only the overall shape is checked.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer before it is saved.
///
/// ## Rules
/// - Name is required, at most 200 characters
/// - Phone is required and well formed
/// - Email, when present and non-empty, is well formed
///
/// ## Example
/// ```rust
/// use glazier_core::types::Customer;
/// use glazier_core::validation::validate_customer;
///
/// let customer = Customer::new("Asha Traders", "+91 98765 43210");
/// assert!(validate_customer(&customer).is_ok());
///
/// let nameless = Customer::new("", "98765 43210");
/// assert!(validate_customer(&nameless).is_err());
/// ```
pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_required("name", &customer.name, 200)?;
    validate_phone(&customer.phone)?;

    if let Some(email) = customer.email.as_deref() {
        if !email.trim().is_empty() {
            validate_email(email)?;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
