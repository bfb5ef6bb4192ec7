//! Basic arithmetic used by `/calc` and `hb calc`.

use std::{fmt, str::FromStr};

use crate::failure::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
}

impl From<MathError> for AppError {
    fn from(e: MathError) -> Self {
        match e {
            MathError::DivisionByZero => {
                AppError::domain_rule(e.to_string()).with_hint("use a non-zero divisor")
            }
        }
    }
}

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

pub fn divide(a: f64, b: f64) -> Result<f64, MathError> {
    if b == 0.0 {
        return Err(MathError::DivisionByZero);
    }
    Ok(a / b)
}

pub fn power(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

pub fn is_even(n: i64) -> bool {
    n % 2 == 0
}

/// Sum of any number of values; `0.0` for none.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, add)
}

/// Binary operation accepted by the calculators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operation {
    pub fn apply(self, a: f64, b: f64) -> Result<f64, MathError> {
        match self {
            Self::Add => Ok(add(a, b)),
            Self::Sub => Ok(subtract(a, b)),
            Self::Mul => Ok(multiply(a, b)),
            Self::Div => divide(a, b),
            Self::Pow => Ok(power(a, b)),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "×",
            Self::Div => "÷",
            Self::Pow => "^",
        }
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" | "add" => Ok(Self::Add),
            "-" | "sub" | "subtract" => Ok(Self::Sub),
            "*" | "x" | "×" | "mul" | "multiply" => Ok(Self::Mul),
            "/" | "÷" | "div" | "divide" => Ok(Self::Div),
            "^" | "**" | "pow" | "power" => Ok(Self::Pow),
            other => Err(AppError::user_input(format!("unknown operator: {other}"))
                .with_hint("use one of + - * / ^")),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parse a number typed by a user.
pub fn parse_number(s: &str) -> Result<f64, AppError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| AppError::user_input(format!("not a number: {s}")))
}
