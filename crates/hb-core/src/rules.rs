//! Small business rules, one per error kind.

use std::{io, path::Path};

use crate::failure::AppError;

/// Discount multiplier per membership tier.
pub const TIERS: [(&str, f64); 3] = [("vip", 0.8), ("pro", 0.9), ("normal", 1.0)];

/// Parse an age typed by a user.
pub fn parse_age(text: &str) -> Result<u32, AppError> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::user_input("age must be a positive integer"));
    }
    let age = text
        .parse::<u32>()
        .map_err(|_| AppError::user_input("age is too large"))?;
    if age == 0 {
        return Err(AppError::user_input("age must be greater than 0"));
    }
    Ok(age)
}

/// Apply the tier discount, rounded to cents.
pub fn apply_discount(price: f64, tier: &str) -> Result<f64, AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::user_input("price cannot be negative"));
    }
    let Some((_, factor)) = TIERS.iter().find(|(name, _)| *name == tier) else {
        let known = TIERS.map(|(name, _)| name).join(", ");
        return Err(
            AppError::domain_rule(format!("unknown membership tier: {tier}"))
                .with_hint(format!("known tiers: {known}")),
        );
    };
    let total = (price * factor * 100.0).round() / 100.0;
    if !total.is_finite() {
        return Err(AppError::user_input(format!("price is too large: {price}")));
    }
    Ok(total)
}

/// Read a config file as text.
pub fn read_config_text(path: &Path) -> Result<String, AppError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AppError::system(format!(
            "config file not found: {}",
            path.display()
        ))),
        Err(e) => Err(AppError::system(format!("failed to read config file: {e}"))),
    }
}
