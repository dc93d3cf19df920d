//! Card record and form input
//!
//! Field names on the wire match the keys already present in users'
//! LocalStorage (`nombre`, `apellidos`, ...), so existing data keeps loading.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::platform::parse_int;

/// Card identifier (creation timestamp in ms, bumped to stay unique)
pub type CardId = i64;

/// Form fields that must not be empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FirstName,
    LastName,
    Age,
    Gender,
    Calories,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FirstName => "first name",
            Field::LastName => "last name",
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Calories => "calories",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One person's calorie budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_name: String,
    /// Older snapshots stored the age as a string
    #[serde(rename = "edad", default, deserialize_with = "age_from_number_or_string")]
    pub age: u32,
    #[serde(rename = "genero")]
    pub gender: String,
    /// Budget fixed at creation
    #[serde(rename = "caloriasIniciales")]
    pub initial_calories: i64,
    /// Unused allowance, `0 <= remaining <= initial`
    #[serde(rename = "caloriasRestantes")]
    pub remaining_calories: i64,
    /// `dd/mm/yyyy`
    #[serde(rename = "fechaCreacion")]
    pub created_on: String,
    /// CSS colour for the list tile
    pub color: String,
}

impl Card {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check that `amount` can come off the remaining budget
    pub fn check_subtract(&self, amount: Option<i64>) -> Result<i64, ValidationError> {
        let amount = match amount {
            Some(a) if a > 0 => a,
            _ => return Err(ValidationError::InvalidAmount),
        };
        if amount > self.remaining_calories {
            return Err(ValidationError::ExceedsRemaining {
                remaining: self.remaining_calories,
            });
        }
        Ok(amount)
    }

    /// Pull `remaining` back into `0..=initial`; true if it changed
    pub fn clamp_remaining(&mut self) -> bool {
        let clamped = self.remaining_calories.clamp(0, self.initial_calories.max(0));
        let changed = clamped != self.remaining_calories;
        self.remaining_calories = clamped;
        changed
    }
}

/// Lenient age decoder: numbers are truncated, strings take their leading
/// integer, anything else becomes 0. One odd age must not fail the array.
fn age_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let age = match &raw {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => parse_int(s).and_then(|n| u64::try_from(n).ok()),
        _ => None,
    };
    Ok(age
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_else(|| {
            log::warn!("Unreadable age {}, using 0", raw);
            0
        }))
}

/// Raw values from the creation form
#[derive(Debug, Clone, Default)]
pub struct CardForm {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub initial_calories: Option<i64>,
}

/// Form input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCard {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub gender: String,
    pub initial_calories: i64,
}

impl CardForm {
    /// Empty fields first, then the calorie range
    pub fn validate(&self) -> Result<ValidCard, ValidationError> {
        let first_name = required(&self.first_name, Field::FirstName)?;
        let last_name = required(&self.last_name, Field::LastName)?;
        let age = self.age.ok_or(ValidationError::MissingField(Field::Age))?;
        let gender = required(&self.gender, Field::Gender)?;
        let initial_calories = self
            .initial_calories
            .ok_or(ValidationError::MissingField(Field::Calories))?;
        ValidationError::check_budget(initial_calories)?;

        Ok(ValidCard {
            first_name,
            last_name,
            age,
            gender,
            initial_calories,
        })
    }
}

fn required(value: &str, field: Field) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}

/// Random pastel tile colour
pub fn random_pastel_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let hue: u32 = rng.random_range(0..360);
    format!("hsl({}, 80%, 80%)", hue)
}

/// Colour band of the remaining-calories bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Danger,
    Warning,
    Healthy,
}

impl ProgressLevel {
    pub fn from_percent(percent: f64, danger_below: f64, warning_below: f64) -> Self {
        if percent < danger_below {
            ProgressLevel::Danger
        } else if percent < warning_below {
            ProgressLevel::Warning
        } else {
            ProgressLevel::Healthy
        }
    }

    /// CSS variable used for the bar
    pub fn css_color(&self) -> &'static str {
        match self {
            ProgressLevel::Danger => "var(--danger-color)",
            ProgressLevel::Warning => "var(--secondary-color)",
            ProgressLevel::Healthy => "var(--primary-color)",
        }
    }
}
