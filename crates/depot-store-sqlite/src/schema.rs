//! SQL schema for the Depot SQLite store.
//!
//! Executed once at connection startup. Optional stock dimensions are stored
//! as `''` when unspecified, so every balance key column is `NOT NULL` and
//! the composite primary key compares them like any other value.
//! Quantities are stored as decimal text; timestamps as fixed-width RFC 3339
//! so text order is time order.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS items (
    item_id     TEXT PRIMARY KEY,
    client_id   TEXT NOT NULL,
    sku         TEXT NOT NULL,
    name        TEXT NOT NULL,
    unit        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (client_id, sku)
);

CREATE TABLE IF NOT EXISTS documents (
    document_id  TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'draft',
    number       TEXT NOT NULL,
    client_id    TEXT,
    warehouse_id TEXT NOT NULL,
    counterparty TEXT,
    comment      TEXT,
    created_by   TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    posted_by    TEXT,
    posted_at    TEXT,
    UNIQUE (kind, number),
    CHECK  (status IN ('draft', 'posted'))
);

CREATE TABLE IF NOT EXISTS document_lines (
    line_id      TEXT PRIMARY KEY,
    document_id  TEXT NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE,
    line_no      INTEGER NOT NULL,
    item_id      TEXT NOT NULL REFERENCES items(item_id),
    batch        TEXT NOT NULL DEFAULT '',
    serial       TEXT NOT NULL DEFAULT '',
    expiry       TEXT NOT NULL DEFAULT '',
    qty          TEXT NOT NULL DEFAULT '0',
    qty_plan     TEXT NOT NULL DEFAULT '0',
    qty_fact     TEXT NOT NULL DEFAULT '0',
    qty_count    TEXT NOT NULL DEFAULT '0',
    qty_system   TEXT NOT NULL DEFAULT '0',
    qty_reserved TEXT NOT NULL DEFAULT '0',
    qty_picked   TEXT NOT NULL DEFAULT '0',
    UNIQUE (document_id, line_no)
);

-- One row per stock key. Written only by the posting engine.
CREATE TABLE IF NOT EXISTS balances (
    client_id    TEXT NOT NULL,
    warehouse_id TEXT NOT NULL,
    location_id  TEXT NOT NULL DEFAULT '',
    item_id      TEXT NOT NULL REFERENCES items(item_id),
    batch        TEXT NOT NULL DEFAULT '',
    serial       TEXT NOT NULL DEFAULT '',
    expiry       TEXT NOT NULL DEFAULT '',
    qty          TEXT NOT NULL,
    reserved_qty TEXT NOT NULL DEFAULT '0',
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (client_id, warehouse_id, location_id, item_id, batch, serial, expiry)
);

-- Moves are strictly append-only; the triggers below refuse UPDATE and DELETE.
CREATE TABLE IF NOT EXISTS moves (
    move_id       TEXT PRIMARY KEY,
    move_type     TEXT NOT NULL,
    document_kind TEXT NOT NULL,
    document_id   TEXT NOT NULL REFERENCES documents(document_id),
    client_id     TEXT NOT NULL,
    warehouse_id  TEXT NOT NULL,
    location_from TEXT NOT NULL DEFAULT '',
    location_to   TEXT NOT NULL DEFAULT '',
    item_id       TEXT NOT NULL REFERENCES items(item_id),
    batch         TEXT NOT NULL DEFAULT '',
    serial        TEXT NOT NULL DEFAULT '',
    expiry        TEXT NOT NULL DEFAULT '',
    qty           TEXT NOT NULL,
    created_by    TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    note          TEXT
);

CREATE TRIGGER IF NOT EXISTS moves_no_update BEFORE UPDATE ON moves
BEGIN
    SELECT RAISE(ABORT, 'moves are append-only');
END;

CREATE TRIGGER IF NOT EXISTS moves_no_delete BEFORE DELETE ON moves
BEGIN
    SELECT RAISE(ABORT, 'moves are append-only');
END;

CREATE TABLE IF NOT EXISTS audit_log (
    audit_id    TEXT PRIMARY KEY,
    actor_id    TEXT NOT NULL,
    action      TEXT NOT NULL,
    entity      TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    description TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS moves_document_idx ON moves(document_id);
CREATE INDEX IF NOT EXISTS moves_item_idx     ON moves(item_id);
CREATE INDEX IF NOT EXISTS moves_created_idx  ON moves(created_at);
CREATE INDEX IF NOT EXISTS audit_entity_idx   ON audit_log(entity_id);

PRAGMA user_version = 1;
";
