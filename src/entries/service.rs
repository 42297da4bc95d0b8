use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

use super::store::EntryStore;
use crate::database::truncate_millis;
use crate::models::{CardBrand, Entry, EntryFilter, EntryList, EntryPatch, EntryType, NewEntry};

struct DemoEntry {
    description: &'static str,
    amount: f64,
    kind: EntryType,
    card_brand: Option<CardBrand>,
    occurred_at: OffsetDateTime,
}

const DEMO_ENTRIES: [DemoEntry; 6] = [
    DemoEntry {
        description: "Salary",
        amount: 5000.0,
        kind: EntryType::Income,
        card_brand: None,
        occurred_at: datetime!(2024-01-05 0:00 UTC),
    },
    DemoEntry {
        description: "Freelance",
        amount: 1500.0,
        kind: EntryType::Income,
        card_brand: None,
        occurred_at: datetime!(2024-01-15 0:00 UTC),
    },
    DemoEntry {
        description: "Rent",
        amount: 1200.0,
        kind: EntryType::Expense,
        card_brand: Some(CardBrand::Visa),
        occurred_at: datetime!(2024-01-10 0:00 UTC),
    },
    DemoEntry {
        description: "Groceries",
        amount: 450.0,
        kind: EntryType::Expense,
        card_brand: Some(CardBrand::Mastercard),
        occurred_at: datetime!(2024-01-12 0:00 UTC),
    },
    DemoEntry {
        description: "Internet",
        amount: 99.9,
        kind: EntryType::Expense,
        card_brand: Some(CardBrand::Elo),
        occurred_at: datetime!(2024-01-08 0:00 UTC),
    },
    DemoEntry {
        description: "Gym",
        amount: 120.0,
        kind: EntryType::Expense,
        card_brand: Some(CardBrand::Visa),
        occurred_at: datetime!(2024-01-07 0:00 UTC),
    },
];

/// Number of entries [`EntriesService::seed_demo`] inserts.
pub const DEMO_ENTRY_COUNT: u64 = DEMO_ENTRIES.len() as u64;

/// Card brands only make sense on expenses.
fn brand_for(kind: EntryType, brand: Option<CardBrand>) -> Option<CardBrand> {
    match kind {
        EntryType::Expense => brand,
        EntryType::Income => None,
    }
}

/// Owner-scoped entry operations. An entry belonging to someone else behaves
/// exactly like one that does not exist.
#[derive(Clone)]
pub struct EntriesService {
    store: EntryStore,
}

impl EntriesService {
    pub fn new(store: EntryStore) -> Self {
        Self { store }
    }

    /// Aggregates are computed over every entry matching `filter`, not just
    /// the returned page.
    pub async fn list(&self, owner_id: &str, filter: &EntryFilter) -> anyhow::Result<EntryList> {
        let totals = self.store.totals(owner_id, filter).await?;
        let items = self.store.page(owner_id, filter).await?;

        Ok(EntryList {
            total: totals.count,
            income: totals.income,
            expenses: totals.expenses,
            balance: totals.income - totals.expenses,
            items,
        })
    }

    pub async fn get_by_id(&self, owner_id: &str, id: &str) -> anyhow::Result<Option<Entry>> {
        self.store.find(owner_id, id).await
    }

    pub async fn create(&self, owner_id: &str, input: NewEntry) -> anyhow::Result<Entry> {
        let now = truncate_millis(OffsetDateTime::now_utc());
        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            description: input.description,
            amount: input.amount,
            kind: input.kind,
            card_brand: brand_for(input.kind, input.card_brand),
            occurred_at: input.occurred_at.map(truncate_millis).unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&entry).await?;
        Ok(entry)
    }

    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        patch: EntryPatch,
    ) -> anyhow::Result<Option<Entry>> {
        let Some(mut entry) = self.store.find(owner_id, id).await? else {
            return Ok(None);
        };

        if let Some(description) = patch.description {
            entry.description = description;
        }
        if let Some(amount) = patch.amount {
            entry.amount = amount;
        }
        if let Some(kind) = patch.kind {
            entry.kind = kind;
        }
        if let Some(card_brand) = patch.card_brand {
            entry.card_brand = card_brand;
        }
        if let Some(occurred_at) = patch.occurred_at {
            entry.occurred_at = truncate_millis(occurred_at);
        }
        entry.card_brand = brand_for(entry.kind, entry.card_brand);
        entry.updated_at = truncate_millis(OffsetDateTime::now_utc());

        if !self.store.update(&entry).await? {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    pub async fn delete_by_id(&self, owner_id: &str, id: &str) -> anyhow::Result<bool> {
        self.store.delete(owner_id, id).await
    }

    pub async fn delete_all(&self, owner_id: &str) -> anyhow::Result<u64> {
        self.store.delete_all(owner_id).await
    }

    /// Replaces the owner's entries with the fixed demonstration set.
    pub async fn seed_demo(&self, owner_id: &str) -> anyhow::Result<u64> {
        let now = truncate_millis(OffsetDateTime::now_utc());
        let entries: Vec<Entry> = DEMO_ENTRIES
            .iter()
            .map(|demo| Entry {
                id: Uuid::new_v4().to_string(),
                owner_id: owner_id.to_string(),
                description: demo.description.to_string(),
                amount: demo.amount,
                kind: demo.kind,
                card_brand: demo.card_brand,
                occurred_at: demo.occurred_at,
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.store.replace_all(owner_id, &entries).await
    }
}
