//! Input rules for entries. Every check runs and appends its message, so a
//! client sees all problems with a payload at once.

use serde_json::Value;
use time::{
    Date, OffsetDateTime, Time, format_description::well_known::Rfc3339,
    macros::{format_description, time},
};

use crate::constants::*;
use crate::models::{
    CardBrand, EntryCandidate, EntryFilter, EntryPatch, EntryPatchInput, EntryType,
    ListEntriesQuery, NewEntry,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<String>,
}

impl Validation {
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Validation> {
        if self.valid() { Ok(value()) } else { Err(self) }
    }
}

fn type_error() -> String {
    "'type' must be 'income' or 'expense'.".to_string()
}

fn amount_error() -> String {
    "'amount' must be a number greater than 0.".to_string()
}

fn brand_error() -> String {
    format!("'cardBrand' is invalid. Use one of: {}.", CardBrand::options())
}

fn parse_kind(raw: Option<&str>) -> Option<EntryType> {
    raw.and_then(|s| s.parse().ok())
}

/// Accepts JSON numbers and numeric strings; rejects NaN, infinities, and
/// anything not strictly positive.
pub fn parse_amount(raw: Option<&Value>) -> Option<f64> {
    let amount = match raw? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

fn check_description(description: Option<&str>, validation: &mut Validation) -> Option<String> {
    let trimmed = description.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        validation.push("'description' is required.");
        return None;
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        validation.push(format!(
            "'description' must be at most {} characters.",
            MAX_DESCRIPTION_LENGTH
        ));
        return None;
    }
    Some(trimmed.to_string())
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    parse_date(raw).map(|date| date.midnight().assume_utc())
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Last storable instant of a day.
const END_OF_DAY: Time = time!(23:59:59.999);

fn timestamp_error(field: &str) -> String {
    format!("'{field}' must be an RFC 3339 timestamp or a YYYY-MM-DD date.")
}

/// Checks a creation payload, collecting every violated rule.
pub fn validate(candidate: &EntryCandidate) -> Validation {
    let mut validation = Validation::default();
    check_candidate(candidate, &mut validation);
    validation
}

fn check_candidate(candidate: &EntryCandidate, validation: &mut Validation) -> Option<NewEntry> {
    let kind = parse_kind(candidate.kind.as_deref());
    if kind.is_none() {
        validation.push(type_error());
    }

    let amount = parse_amount(candidate.amount.as_ref());
    if amount.is_none() {
        validation.push(amount_error());
    }

    let description = check_description(candidate.description.as_deref(), validation);

    let mut brand_ok = true;
    let card_brand = match candidate.card_brand.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let brand = raw.parse::<CardBrand>().ok();
            if brand.is_none() {
                brand_ok = false;
                validation.push(brand_error());
            }
            brand
        }
    };

    let mut occurred_ok = true;
    let occurred_at = match candidate.occurred_at.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                occurred_ok = false;
                validation.push(timestamp_error("occurredAt"));
            }
            parsed
        }
    };

    match (kind, amount, description) {
        (Some(kind), Some(amount), Some(description)) if brand_ok && occurred_ok => {
            Some(NewEntry {
                description,
                amount,
                kind,
                card_brand,
                occurred_at,
            })
        }
        _ => None,
    }
}

/// Validates and converts a creation payload into typed input.
pub fn parse_new_entry(candidate: &EntryCandidate) -> Result<NewEntry, Validation> {
    let mut validation = Validation::default();
    let entry = check_candidate(candidate, &mut validation);
    match entry {
        Some(entry) if validation.valid() => Ok(entry),
        _ => Err(validation),
    }
}

/// Validates a partial update. Present fields follow the creation rules.
pub fn parse_patch(input: &EntryPatchInput) -> Result<EntryPatch, Validation> {
    let mut validation = Validation::default();
    let mut patch = EntryPatch::default();

    if let Some(raw) = input.kind.as_deref() {
        patch.kind = parse_kind(Some(raw));
        if patch.kind.is_none() {
            validation.push(type_error());
        }
    }

    if let Some(raw) = input.amount.as_ref() {
        patch.amount = parse_amount(Some(raw));
        if patch.amount.is_none() {
            validation.push(amount_error());
        }
    }

    if input.description.is_some() {
        patch.description = check_description(input.description.as_deref(), &mut validation);
    }

    if let Some(brand) = &input.card_brand {
        patch.card_brand = match brand.as_deref().map(str::trim) {
            None | Some("") => Some(None),
            Some(raw) => match raw.parse::<CardBrand>() {
                Ok(brand) => Some(Some(brand)),
                Err(()) => {
                    validation.push(brand_error());
                    None
                }
            },
        };
    }

    if let Some(raw) = input.occurred_at.as_deref() {
        patch.occurred_at = parse_timestamp(raw);
        if patch.occurred_at.is_none() {
            validation.push(timestamp_error("occurredAt"));
        }
    }

    if validation.valid() && patch.is_empty() {
        validation.push("At least one field must be provided for update.");
    }

    validation.into_result(|| patch)
}

pub fn validate_limit(limit: Option<u32>, validation: &mut Validation) -> u32 {
    match limit {
        Some(0) => {
            validation.push("Limit must be greater than 0.");
            DEFAULT_ENTRIES_LIMIT
        }
        Some(l) if l > MAX_LIMIT => {
            validation.push(format!("Limit cannot exceed {}.", MAX_LIMIT));
            DEFAULT_ENTRIES_LIMIT
        }
        Some(l) => l,
        None => DEFAULT_ENTRIES_LIMIT,
    }
}

pub fn validate_offset(offset: Option<u32>, validation: &mut Validation) -> u32 {
    match offset {
        Some(o) if o > MAX_OFFSET => {
            validation.push(format!("Offset cannot exceed {}.", MAX_OFFSET));
            0
        }
        Some(o) => o,
        None => 0,
    }
}

/// Turns the raw list query into a filter. A date-only `to` covers that whole day.
pub fn parse_filter(query: &ListEntriesQuery) -> Result<EntryFilter, Validation> {
    let mut validation = Validation::default();
    let mut filter = EntryFilter::default();

    if let Some(raw) = non_empty(query.kind.as_deref()) {
        filter.kind = parse_kind(Some(raw));
        if filter.kind.is_none() {
            validation.push(type_error());
        }
    }

    if let Some(q) = non_empty(query.q.as_deref()) {
        if q.chars().count() > MAX_SEARCH_TERM_LENGTH {
            validation.push(format!(
                "Search term must be at most {} characters.",
                MAX_SEARCH_TERM_LENGTH
            ));
        } else {
            filter.query = Some(q.to_string());
        }
    }

    if let Some(raw) = non_empty(query.card_brand.as_deref()) {
        filter.card_brand = raw.parse().ok();
        if filter.card_brand.is_none() {
            validation.push(brand_error());
        }
    }

    if let Some(raw) = non_empty(query.from.as_deref()) {
        filter.from = parse_timestamp(raw);
        if filter.from.is_none() {
            validation.push(timestamp_error("from"));
        }
    }

    if let Some(raw) = non_empty(query.to.as_deref()) {
        filter.to = match parse_date(raw) {
            Some(date) => Some(date.with_time(END_OF_DAY).assume_utc()),
            None => parse_timestamp(raw),
        };
        if filter.to.is_none() {
            validation.push(timestamp_error("to"));
        }
    }

    filter.limit = validate_limit(query.limit, &mut validation);
    filter.offset = validate_offset(query.offset, &mut validation);

    validation.into_result(|| filter)
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
