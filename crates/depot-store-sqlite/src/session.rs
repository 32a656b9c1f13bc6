//! [`SqliteSession`], the SQLite implementation of [`StockStore`].
//!
//! A session borrows one connection for the duration of a service call.
//! [`begin`](StockStore::begin) issues `BEGIN IMMEDIATE`, taking the database
//! write lock up front, so concurrent writers are serialised before any
//! balance is read.

use chrono::Utc;
use depot_core::{
  audit::AuditEntry,
  balance::{Balance, BalanceQuery, next_quantity},
  document::{Document, DocumentLine, DocumentQuery},
  item::Item,
  key::StockKey,
  movement::{Move, MoveQuery, NewMove},
  store::StockStore,
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    AUDIT_COLUMNS, BALANCE_COLUMNS, DOCUMENT_COLUMNS, ITEM_COLUMNS,
    LINE_COLUMNS, MOVE_COLUMNS, RawAudit, RawBalance, RawDocument, RawItem,
    RawLine, RawMove, encode_decimal, encode_dim_date, encode_dim_text,
    encode_dim_uuid, encode_dt, encode_key, encode_uuid,
  },
};

/// A [`StockStore`] over a borrowed SQLite connection.
pub struct SqliteSession<'c> {
  conn: &'c Connection,
}

impl<'c> SqliteSession<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }
}

/// Collects `AND`-joined conditions and their text parameters.
#[derive(Default)]
struct Filter {
  clauses: Vec<&'static str>,
  params:  Vec<String>,
}

impl Filter {
  fn eq(&mut self, clause: &'static str, value: Option<String>) -> &mut Self {
    if let Some(value) = value {
      self.clauses.push(clause);
      self.params.push(value);
    }
    self
  }

  /// `WHERE ...` with `?` placeholders, or nothing when there are no
  /// conditions.
  fn sql(&self) -> String {
    if self.clauses.is_empty() {
      String::new()
    } else {
      format!(" WHERE {}", self.clauses.join(" AND "))
    }
  }
}

impl StockStore for SqliteSession<'_> {
  type Error = Error;

  // ── Transactions ──────────────────────────────────────────────────────────

  fn begin(&mut self) -> Result<()> {
    self.conn.execute_batch("BEGIN IMMEDIATE")?;
    Ok(())
  }

  fn commit(&mut self) -> Result<()> {
    self.conn.execute_batch("COMMIT")?;
    Ok(())
  }

  fn rollback(&mut self) -> Result<()> {
    self.conn.execute_batch("ROLLBACK")?;
    Ok(())
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  fn insert_item(&mut self, item: &Item) -> Result<()> {
    self.conn.execute(
      "INSERT INTO items (item_id, client_id, sku, name, unit, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(item.item_id),
        encode_uuid(item.client_id),
        item.sku,
        item.name,
        item.unit,
        encode_dt(item.created_at),
      ],
    )?;
    Ok(())
  }

  fn get_item(&self, item_id: Uuid) -> Result<Option<Item>> {
    self
      .conn
      .query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1"),
        params![encode_uuid(item_id)],
        RawItem::from_row,
      )
      .optional()?
      .map(RawItem::into_item)
      .transpose()
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  fn insert_document(&mut self, document: &Document) -> Result<()> {
    let header = &document.header;
    self.conn.execute(
      &format!(
        "INSERT INTO documents ({DOCUMENT_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
      ),
      params![
        encode_uuid(document.document_id),
        document.kind.as_str(),
        document.status.as_str(),
        header.number,
        header.client_id.map(encode_uuid),
        encode_uuid(header.warehouse_id),
        header.counterparty,
        header.comment,
        document.created_by,
        encode_dt(document.created_at),
        document.posted_by,
        document.posted_at.map(encode_dt),
      ],
    )?;
    Ok(())
  }

  fn get_document(&self, document_id: Uuid) -> Result<Option<Document>> {
    self
      .conn
      .query_row(
        &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = ?1"),
        params![encode_uuid(document_id)],
        RawDocument::from_row,
      )
      .optional()?
      .map(RawDocument::into_document)
      .transpose()
  }

  fn list_documents(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
    let mut filter = Filter::default();
    filter
      .eq("kind = ?", query.kind.map(|k| k.as_str().to_owned()))
      .eq("status = ?", query.status.map(|s| s.as_str().to_owned()));

    let sql = format!(
      "SELECT {DOCUMENT_COLUMNS} FROM documents{} ORDER BY created_at, rowid",
      filter.sql()
    );
    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params_from_iter(filter.params.iter()), RawDocument::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawDocument::into_document).collect()
  }

  fn update_document(&mut self, document: &Document) -> Result<()> {
    let header = &document.header;
    let changed = self.conn.execute(
      "UPDATE documents
          SET status = ?2, number = ?3, client_id = ?4, warehouse_id = ?5,
              counterparty = ?6, comment = ?7, posted_by = ?8, posted_at = ?9
        WHERE document_id = ?1",
      params![
        encode_uuid(document.document_id),
        document.status.as_str(),
        header.number,
        header.client_id.map(encode_uuid),
        encode_uuid(header.warehouse_id),
        header.counterparty,
        header.comment,
        document.posted_by,
        document.posted_at.map(encode_dt),
      ],
    )?;
    if changed == 0 {
      return Err(depot_core::Error::DocumentNotFound(document.document_id).into());
    }
    Ok(())
  }

  fn delete_document(&mut self, document_id: Uuid) -> Result<()> {
    let id = encode_uuid(document_id);
    self
      .conn
      .execute("DELETE FROM document_lines WHERE document_id = ?1", params![id])?;
    self
      .conn
      .execute("DELETE FROM documents WHERE document_id = ?1", params![id])?;
    Ok(())
  }

  fn insert_line(&mut self, line: &DocumentLine) -> Result<()> {
    let q = &line.quantities;
    self.conn.execute(
      &format!(
        "INSERT INTO document_lines ({LINE_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
      ),
      params![
        encode_uuid(line.line_id),
        encode_uuid(line.document_id),
        line.line_no,
        encode_uuid(line.item_id),
        encode_dim_text(&line.batch),
        encode_dim_text(&line.serial),
        encode_dim_date(&line.expiry),
        encode_decimal(q.qty),
        encode_decimal(q.qty_plan),
        encode_decimal(q.qty_fact),
        encode_decimal(q.qty_count),
        encode_decimal(q.qty_system),
        encode_decimal(q.qty_reserved),
        encode_decimal(q.qty_picked),
      ],
    )?;
    Ok(())
  }

  fn delete_line(&mut self, document_id: Uuid, line_id: Uuid) -> Result<bool> {
    let removed = self.conn.execute(
      "DELETE FROM document_lines WHERE document_id = ?1 AND line_id = ?2",
      params![encode_uuid(document_id), encode_uuid(line_id)],
    )?;
    Ok(removed > 0)
  }

  fn list_lines(&self, document_id: Uuid) -> Result<Vec<DocumentLine>> {
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {LINE_COLUMNS} FROM document_lines
        WHERE document_id = ?1 ORDER BY line_no"
    ))?;
    let raws = stmt
      .query_map(params![encode_uuid(document_id)], RawLine::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawLine::into_line).collect()
  }

  // ── Balances ──────────────────────────────────────────────────────────────

  fn get_balance(&self, key: &StockKey) -> Result<Option<Balance>> {
    self
      .conn
      .query_row(
        &format!(
          "SELECT {BALANCE_COLUMNS} FROM balances
            WHERE client_id = ?1 AND warehouse_id = ?2 AND location_id = ?3
              AND item_id = ?4 AND batch = ?5 AND serial = ?6 AND expiry = ?7"
        ),
        params_from_iter(encode_key(key).iter()),
        RawBalance::from_row,
      )
      .optional()?
      .map(RawBalance::into_balance)
      .transpose()
  }

  fn apply_delta(&mut self, key: &StockKey, delta: Decimal) -> Result<Balance> {
    let current = self.get_balance(key)?;
    let qty = next_quantity(key, current.as_ref().map(|b| b.qty), delta)?;
    let updated_at = Utc::now();

    let [client, warehouse, location, item, batch, serial, expiry] =
      encode_key(key);
    self.conn.execute(
      "INSERT INTO balances
              (client_id, warehouse_id, location_id, item_id, batch, serial,
               expiry, qty, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
       ON CONFLICT (client_id, warehouse_id, location_id, item_id, batch,
                    serial, expiry)
       DO UPDATE SET qty = excluded.qty, updated_at = excluded.updated_at",
      params![
        client,
        warehouse,
        location,
        item,
        batch,
        serial,
        expiry,
        encode_decimal(qty),
        encode_dt(updated_at),
      ],
    )?;

    Ok(Balance {
      key: key.clone(),
      qty,
      reserved_qty: current.map_or(Decimal::ZERO, |b| b.reserved_qty),
      updated_at,
    })
  }

  fn list_balances(&self, query: &BalanceQuery) -> Result<Vec<Balance>> {
    let mut filter = Filter::default();
    filter
      .eq("client_id = ?", query.client_id.map(encode_uuid))
      .eq("warehouse_id = ?", query.warehouse_id.map(encode_uuid))
      .eq("item_id = ?", query.item_id.map(encode_uuid));

    let sql = format!(
      "SELECT {BALANCE_COLUMNS} FROM balances{}
        ORDER BY client_id, warehouse_id, location_id, item_id, batch,
                 serial, expiry",
      filter.sql()
    );
    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params_from_iter(filter.params.iter()), RawBalance::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    // Quantities are text, so the zero filter runs after decoding.
    let mut balances = Vec::with_capacity(raws.len());
    for raw in raws {
      let balance = raw.into_balance()?;
      if query.matches(&balance) {
        balances.push(balance);
      }
    }
    Ok(balances)
  }

  // ── Moves ─────────────────────────────────────────────────────────────────

  fn record_move(&mut self, input: NewMove) -> Result<Move> {
    let recorded = input.into_move(Uuid::new_v4());
    self.conn.execute(
      &format!(
        "INSERT INTO moves ({MOVE_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                 ?15, ?16)"
      ),
      params![
        encode_uuid(recorded.move_id),
        recorded.move_type.as_str(),
        recorded.document_kind.as_str(),
        encode_uuid(recorded.document_id),
        encode_uuid(recorded.client_id),
        encode_uuid(recorded.warehouse_id),
        encode_dim_uuid(&recorded.location_from),
        encode_dim_uuid(&recorded.location_to),
        encode_uuid(recorded.item_id),
        encode_dim_text(&recorded.batch),
        encode_dim_text(&recorded.serial),
        encode_dim_date(&recorded.expiry),
        encode_decimal(recorded.qty),
        recorded.created_by,
        encode_dt(recorded.created_at),
        recorded.note,
      ],
    )?;
    Ok(recorded)
  }

  fn list_moves(&self, query: &MoveQuery) -> Result<Vec<Move>> {
    let mut filter = Filter::default();
    filter
      .eq("item_id = ?", query.item_id.map(encode_uuid))
      .eq("document_id = ?", query.document_id.map(encode_uuid))
      .eq("client_id = ?", query.client_id.map(encode_uuid))
      .eq("warehouse_id = ?", query.warehouse_id.map(encode_uuid))
      .eq("created_at >= ?", query.from.map(encode_dt))
      .eq("created_at < ?", query.until.map(encode_dt));

    let mut sql = format!(
      "SELECT {MOVE_COLUMNS} FROM moves{} ORDER BY created_at, rowid",
      filter.sql()
    );
    if let Some(limit) = query.limit {
      sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params_from_iter(filter.params.iter()), RawMove::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawMove::into_move).collect()
  }

  // ── Audit ─────────────────────────────────────────────────────────────────

  fn insert_audit(&mut self, entry: &AuditEntry) -> Result<()> {
    let action: &'static str = entry.action.into();
    let entity: &'static str = entry.entity.into();
    self.conn.execute(
      &format!(
        "INSERT INTO audit_log ({AUDIT_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
      ),
      params![
        encode_uuid(entry.audit_id),
        entry.actor_id,
        action,
        entity,
        encode_uuid(entry.entity_id),
        entry.description,
        encode_dt(entry.recorded_at),
      ],
    )?;
    Ok(())
  }

  fn list_audit(&self, entity_id: Option<Uuid>) -> Result<Vec<AuditEntry>> {
    let mut filter = Filter::default();
    filter.eq("entity_id = ?", entity_id.map(encode_uuid));

    let sql = format!(
      "SELECT {AUDIT_COLUMNS} FROM audit_log{} ORDER BY recorded_at, rowid",
      filter.sql()
    );
    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params_from_iter(filter.params.iter()), RawAudit::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawAudit::into_entry).collect()
  }
}
