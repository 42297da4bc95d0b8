use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// The only user shape that ever leaves the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Identity claims carried by a bearer token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub const ALL: [EntryType; 2] = [EntryType::Income, EntryType::Expense];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }
}

impl FromStr for EntryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Elo,
    Amex,
    Hipercard,
    Discover,
    Diners,
    Other,
}

impl CardBrand {
    pub const ALL: [CardBrand; 8] = [
        CardBrand::Visa,
        CardBrand::Mastercard,
        CardBrand::Elo,
        CardBrand::Amex,
        CardBrand::Hipercard,
        CardBrand::Discover,
        CardBrand::Diners,
        CardBrand::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Elo => "elo",
            CardBrand::Amex => "amex",
            CardBrand::Hipercard => "hipercard",
            CardBrand::Discover => "discover",
            CardBrand::Diners => "diners",
            CardBrand::Other => "other",
        }
    }

    pub fn options() -> String {
        CardBrand::ALL
            .iter()
            .map(|brand| brand.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for CardBrand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardBrand::ALL
            .into_iter()
            .find(|brand| brand.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    #[serde(skip)]
    pub owner_id: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<CardBrand>,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated creation input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub description: String,
    pub amount: f64,
    pub kind: EntryType,
    pub card_brand: Option<CardBrand>,
    pub occurred_at: Option<OffsetDateTime>,
}

/// Validated partial update; `None` leaves a field untouched, and
/// `card_brand: Some(None)` clears the brand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub kind: Option<EntryType>,
    pub card_brand: Option<Option<CardBrand>>,
    pub occurred_at: Option<OffsetDateTime>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.card_brand.is_none()
            && self.occurred_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryFilter {
    pub kind: Option<EntryType>,
    pub query: Option<String>,
    pub card_brand: Option<CardBrand>,
    pub from: Option<OffsetDateTime>,
    pub to: Option<OffsetDateTime>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            kind: None,
            query: None,
            card_brand: None,
            from: None,
            to: None,
            limit: crate::constants::DEFAULT_ENTRIES_LIMIT,
            offset: 0,
        }
    }
}

/// Aggregates cover every entry matching the filter; `items` is one page.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryList {
    pub total: u64,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub items: Vec<Entry>,
}

// Request payloads

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

/// Raw entry input as sent by clients, before validation. `amount` stays a
/// JSON value because numeric strings are accepted too.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryCandidate {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub description: Option<String>,
    pub card_brand: Option<String>,
    #[serde(alias = "date")]
    pub occurred_at: Option<String>,
}

/// Raw partial update. `card_brand` distinguishes an absent key from `null`.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPatchInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub description: Option<String>,
    #[serde(deserialize_with = "present")]
    pub card_brand: Option<Option<String>>,
    #[serde(alias = "date")]
    pub occurred_at: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct ListEntriesQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub q: Option<String>,
    pub card_brand: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// Response bodies

#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Serialize, Debug)]
pub struct EntryListResponse {
    pub total: u64,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub data: Vec<Entry>,
}

impl From<EntryList> for EntryListResponse {
    fn from(list: EntryList) -> Self {
        Self {
            total: list.total,
            income: list.income,
            expenses: list.expenses,
            balance: list.balance,
            data: list.items,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct DeletedEntry {
    pub id: String,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct RemovedEntries {
    pub removed: u64,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct SeededEntries {
    pub seeded: u64,
    pub message: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAccount {
    pub id: String,
    pub removed_entries: u64,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub uptime: String,
    pub timestamp: String,
}
