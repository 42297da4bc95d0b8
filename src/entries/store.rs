//! Entry persistence. Every statement carries `user_id = ?` so one owner can
//! never see or touch another owner's rows.

use anyhow::Context;
use libsql::{Value, params::Params};
use tracing::debug;

use crate::database::{Db, from_millis, to_millis, value_as_f64, value_as_opt_string};
use crate::models::{CardBrand, Entry, EntryFilter, EntryType};

const ENTRY_COLUMNS: &str =
    "id, user_id, description, amount, type, card_brand, occurred_at, created_at, updated_at";

/// Totals over every row matching a filter, independent of paging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub count: u64,
    pub income: f64,
    pub expenses: f64,
}

#[derive(Clone)]
pub struct EntryStore {
    db: Db,
}

pub fn extract_entry_from_row(row: libsql::Row) -> anyhow::Result<Entry> {
    let id: String = row.get(0).context("Failed to get entry id")?;
    let owner_id: String = row.get(1).context("Failed to get entry user_id")?;
    let description: String = row.get(2).context("Failed to get entry description")?;
    let amount = value_as_f64(&row.get_value(3)?).context("Failed to get entry amount")?;
    let kind: String = row.get(4).context("Failed to get entry type")?;
    let card_brand = value_as_opt_string(row.get_value(5)?)?;
    let occurred_at: i64 = row.get(6).context("Failed to get entry occurred_at")?;
    let created_at: i64 = row.get(7).context("Failed to get entry created_at")?;
    let updated_at: i64 = row.get(8).context("Failed to get entry updated_at")?;

    Ok(Entry {
        id,
        owner_id,
        description,
        amount,
        kind: kind
            .parse::<EntryType>()
            .map_err(|_| anyhow::anyhow!("unknown entry type in storage: {kind}"))?,
        card_brand: card_brand
            .map(|b| {
                b.parse::<CardBrand>()
                    .map_err(|_| anyhow::anyhow!("unknown card brand in storage: {b}"))
            })
            .transpose()?,
        occurred_at: from_millis(occurred_at)?,
        created_at: from_millis(created_at)?,
        updated_at: from_millis(updated_at)?,
    })
}

fn brand_value(brand: Option<CardBrand>) -> Value {
    brand.map_or(Value::Null, |b| Value::Text(b.as_str().to_string()))
}

fn entry_values(entry: &Entry) -> Vec<Value> {
    vec![
        Value::Text(entry.id.clone()),
        Value::Text(entry.owner_id.clone()),
        Value::Text(entry.description.clone()),
        Value::Real(entry.amount),
        Value::Text(entry.kind.as_str().to_string()),
        brand_value(entry.card_brand),
        Value::Integer(to_millis(entry.occurred_at)),
        Value::Integer(to_millis(entry.created_at)),
        Value::Integer(to_millis(entry.updated_at)),
    ]
}

const INSERT_ENTRY: &str = "INSERT INTO entries (id, user_id, description, amount, type, card_brand, occurred_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Builds the `WHERE` clause for a filter; the owner condition always comes first.
fn filter_clause(owner_id: &str, filter: &EntryFilter) -> (String, Vec<Value>) {
    let mut clause = String::from("WHERE user_id = ?");
    let mut values = vec![Value::Text(owner_id.to_string())];

    if let Some(kind) = filter.kind {
        clause.push_str(" AND type = ?");
        values.push(Value::Text(kind.as_str().to_string()));
    }
    if let Some(q) = &filter.query {
        // instr() avoids LIKE wildcards in user input.
        clause.push_str(" AND instr(lower(description), lower(?)) > 0");
        values.push(Value::Text(q.clone()));
    }
    if let Some(brand) = filter.card_brand {
        clause.push_str(" AND card_brand = ?");
        values.push(Value::Text(brand.as_str().to_string()));
    }
    if let Some(from) = filter.from {
        clause.push_str(" AND occurred_at >= ?");
        values.push(Value::Integer(to_millis(from)));
    }
    if let Some(to) = filter.to {
        clause.push_str(" AND occurred_at <= ?");
        values.push(Value::Integer(to_millis(to)));
    }

    (clause, values)
}

impl EntryStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn insert(&self, entry: &Entry) -> anyhow::Result<()> {
        let conn = self.db.write().await;
        conn.execute(INSERT_ENTRY, Params::Positional(entry_values(entry)))
            .await
            .context("Failed to create entry")?;
        debug!(entry_id = %entry.id, user_id = %entry.owner_id, "entry created");
        Ok(())
    }

    pub async fn find(&self, owner_id: &str, id: &str) -> anyhow::Result<Option<Entry>> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ? AND user_id = ?"),
                [id, owner_id],
            )
            .await
            .context("Failed to query entry")?;

        match rows.next().await? {
            Some(row) => Ok(Some(extract_entry_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Overwrites the mutable columns of an existing entry. Returns false when
    /// nothing matched for this owner.
    pub async fn update(&self, entry: &Entry) -> anyhow::Result<bool> {
        let conn = self.db.write().await;
        let affected = conn
            .execute(
                "UPDATE entries SET description = ?, amount = ?, type = ?, card_brand = ?, occurred_at = ?, updated_at = ? WHERE id = ? AND user_id = ?",
                Params::Positional(vec![
                    Value::Text(entry.description.clone()),
                    Value::Real(entry.amount),
                    Value::Text(entry.kind.as_str().to_string()),
                    brand_value(entry.card_brand),
                    Value::Integer(to_millis(entry.occurred_at)),
                    Value::Integer(to_millis(entry.updated_at)),
                    Value::Text(entry.id.clone()),
                    Value::Text(entry.owner_id.clone()),
                ]),
            )
            .await
            .context("Failed to update entry")?;
        Ok(affected > 0)
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> anyhow::Result<bool> {
        let conn = self.db.write().await;
        let affected = conn
            .execute(
                "DELETE FROM entries WHERE id = ? AND user_id = ?",
                [id, owner_id],
            )
            .await
            .context("Failed to delete entry")?;
        Ok(affected > 0)
    }

    pub async fn delete_all(&self, owner_id: &str) -> anyhow::Result<u64> {
        let conn = self.db.write().await;
        let removed = conn
            .execute("DELETE FROM entries WHERE user_id = ?", [owner_id])
            .await
            .context("Failed to delete entries")?;
        debug!(user_id = %owner_id, removed, "entries cleared");
        Ok(removed)
    }

    /// Atomically swaps an owner's entries for `entries`.
    pub async fn replace_all(&self, owner_id: &str, entries: &[Entry]) -> anyhow::Result<u64> {
        let conn = self.db.write().await;
        let tx = conn.transaction().await?;

        tx.execute("DELETE FROM entries WHERE user_id = ?", [owner_id])
            .await?;
        for entry in entries {
            tx.execute(INSERT_ENTRY, Params::Positional(entry_values(entry)))
                .await?;
        }

        tx.commit().await?;
        Ok(entries.len() as u64)
    }

    pub async fn totals(&self, owner_id: &str, filter: &EntryFilter) -> anyhow::Result<Totals> {
        let (clause, values) = filter_clause(owner_id, filter);
        let sql = format!(
            "SELECT COUNT(*), \
             COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0.0), \
             COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0.0) \
             FROM entries {clause}"
        );

        let conn = self.db.read().await;
        let mut rows = conn
            .query(&sql, Params::Positional(values))
            .await
            .context("Failed to aggregate entries")?;

        let Some(row) = rows.next().await? else {
            return Ok(Totals::default());
        };
        let count: i64 = row.get(0).context("Failed to get entry count")?;
        Ok(Totals {
            count: count as u64,
            income: value_as_f64(&row.get_value(1)?)?,
            expenses: value_as_f64(&row.get_value(2)?)?,
        })
    }

    /// One page of matching entries, newest `occurred_at` first, then newest
    /// `created_at`, then latest insert.
    pub async fn page(&self, owner_id: &str, filter: &EntryFilter) -> anyhow::Result<Vec<Entry>> {
        let (clause, mut values) = filter_clause(owner_id, filter);
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries {clause} \
             ORDER BY occurred_at DESC, created_at DESC, rowid DESC LIMIT ? OFFSET ?"
        );
        values.push(Value::Integer(i64::from(filter.limit)));
        values.push(Value::Integer(i64::from(filter.offset)));

        let conn = self.db.read().await;
        let mut rows = conn
            .query(&sql, Params::Positional(values))
            .await
            .context("Failed to query entries")?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(extract_entry_from_row(row)?);
        }
        Ok(entries)
    }
}
