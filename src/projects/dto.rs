use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

use crate::error::ApiError;

pub const PRIORITIES: [&str; 3] = ["Low", "Medium", "High"];
pub const STATUSES: [&str; 4] = ["Pending", "In Progress", "On Hold", "Completed"];

/// Loose request body shared by create and update. Clients send budgets and
/// dates as strings or numbers; coercion happens at deserialization, the
/// required-field check at validation.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectInput {
    pub title: Option<String>,
    pub client: Option<String>,
    /// Outer None: field absent, keep the stored value. Inner None: explicit
    /// null, clear it.
    #[serde(default, deserialize_with = "de_opt_opt_string")]
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub budget: Option<Decimal>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub deadline: Option<Date>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i32")]
    pub progress: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub paid: Option<Decimal>,
}

/// Fully validated payload for an insert.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub client: String,
    pub description: Option<String>,
    pub category: String,
    pub budget: Decimal,
    pub deadline: Date,
    pub priority: String,
    pub status: String,
    pub progress: i32,
    pub paid: Decimal,
}

impl ProjectInput {
    pub fn validate_create(self) -> Result<NewProject, ApiError> {
        let title = required_text(self.title, "title")?;
        let client = required_text(self.client, "client")?;
        let category = required_text(self.category, "category")?;
        let budget = self
            .budget
            .ok_or_else(|| ApiError::Validation("budget is required".into()))?;
        let deadline = self
            .deadline
            .ok_or_else(|| ApiError::Validation("deadline is required".into()))?;

        let priority = check_enum(self.priority, &PRIORITIES, "priority")?
            .unwrap_or_else(|| "Medium".to_string());
        let status =
            check_enum(self.status, &STATUSES, "status")?.unwrap_or_else(|| "Pending".to_string());
        let progress = check_progress(self.progress)?.unwrap_or(0);
        check_money(budget, "budget")?;
        let paid = self.paid.unwrap_or(Decimal::ZERO);
        check_money(paid, "paid")?;

        Ok(NewProject {
            title,
            client,
            description: self.description.flatten().map(|d| d.trim().to_string()),
            category,
            budget,
            deadline,
            priority,
            status,
            progress,
            paid,
        })
    }

    /// Checks every provided field without requiring any; the merge itself
    /// happens against the stored record.
    pub fn validate_update(&self) -> Result<(), ApiError> {
        for (value, name) in [
            (&self.title, "title"),
            (&self.client, "client"),
            (&self.category, "category"),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(ApiError::Validation(format!("{name} cannot be empty")));
                }
            }
        }
        check_enum(self.priority.clone(), &PRIORITIES, "priority")?;
        check_enum(self.status.clone(), &STATUSES, "status")?;
        check_progress(self.progress)?;
        if let Some(b) = self.budget {
            check_money(b, "budget")?;
        }
        if let Some(p) = self.paid {
            check_money(p, "paid")?;
        }
        Ok(())
    }
}

fn required_text(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApiError::Validation(format!("{name} is required"))),
    }
}

fn check_enum(
    value: Option<String>,
    allowed: &[&str],
    name: &str,
) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(v) if allowed.contains(&v.as_str()) => Ok(Some(v)),
        Some(v) => Err(ApiError::Validation(format!("Invalid {name}: {v}"))),
    }
}

fn check_progress(value: Option<i32>) -> Result<Option<i32>, ApiError> {
    match value {
        Some(p) if !(0..=100).contains(&p) => Err(ApiError::Validation(
            "progress must be between 0 and 100".into(),
        )),
        other => Ok(other),
    }
}

fn check_money(value: Decimal, name: &str) -> Result<(), ApiError> {
    if value.is_sign_negative() {
        return Err(ApiError::Validation(format!("{name} must be non-negative")));
    }
    Ok(())
}

fn de_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<Decimal>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid decimal: {s}")))
        }
        Some(Value::Number(n)) => n
            .to_string()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid decimal: {n}"))),
        Some(other) => Err(de::Error::custom(format!(
            "expected a number or string, got {other}"
        ))),
    }
}

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            // JS clients often send a full ISO datetime; the date part is
            // the first ten characters.
            let date_part = trimmed.get(..10).unwrap_or(trimmed);
            Date::parse(date_part, DATE_FORMAT)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid date: {s}")))
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected a YYYY-MM-DD string, got {other}"
        ))),
    }
}

fn de_opt_opt_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn de_opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid integer: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid integer: {s}"))),
        Some(other) => Err(de::Error::custom(format!(
            "expected an integer, got {other}"
        ))),
    }
}
