//! Service-level tests for the lifecycle and posting engine against
//! [`MemoryStore`].

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error, StockService,
  access::{Actor, StaticPermissions},
  audit::AuditAction,
  balance::BalanceQuery,
  document::{
    Document, DocumentHeader, DocumentKind, DocumentStatus, LineQuantities,
    NewLine,
  },
  item::{Item, NewItem},
  key::{Dim, StockKey},
  memory::MemoryStore,
  movement::{MoveQuery, MoveType},
  report::reconcile,
  store::StockStore,
};

// ─── Fixture ─────────────────────────────────────────────────────────────────

struct Fixture {
  svc:       StockService<MemoryStore, StaticPermissions>,
  admin:     Actor,
  client:    Uuid,
  warehouse: Uuid,
  item:      Item,
}

fn qty(n: i64) -> Decimal { Decimal::new(n, 0) }

fn gate() -> StaticPermissions {
  StaticPermissions::new()
    .grant("admin", "*")
    .grant("clerk", "receipt.create")
    .grant("clerk", "receipt.update")
}

fn fixture() -> Fixture {
  let mut svc = StockService::new(MemoryStore::new(), gate());
  let admin = Actor::new("alice", "admin");
  let client = Uuid::new_v4();
  let item = svc
    .register_item(&admin, NewItem {
      client_id: client,
      sku:       "SKU-1".into(),
      name:      "Widget".into(),
      unit:      "pcs".into(),
    })
    .unwrap();
  Fixture { svc, admin, client, warehouse: Uuid::new_v4(), item }
}

impl Fixture {
  fn header(&self, number: &str) -> DocumentHeader {
    DocumentHeader {
      number:       number.into(),
      client_id:    Some(self.client),
      warehouse_id: self.warehouse,
      counterparty: None,
      comment:      None,
    }
  }

  fn key(&self) -> StockKey {
    StockKey::new(self.client, self.warehouse, self.item.item_id)
  }

  fn on_hand(&self) -> Option<Decimal> {
    self.svc.balance(&self.key()).unwrap().map(|b| b.qty)
  }

  fn move_count(&self) -> usize {
    self.svc.moves(&MoveQuery::default()).unwrap().len()
  }

  fn another_item(&mut self, sku: &str) -> Item {
    self
      .svc
      .register_item(&self.admin, NewItem {
        client_id: self.client,
        sku:       sku.into(),
        name:      sku.into(),
        unit:      "pcs".into(),
      })
      .unwrap()
  }

  fn draft(&mut self, kind: DocumentKind, number: &str) -> Document {
    let header = self.header(number);
    self.svc.create_document(&self.admin, kind, header).unwrap()
  }

  fn add(&mut self, doc: &Document, item_id: Uuid, q: LineQuantities) {
    self
      .svc
      .add_line(&self.admin, doc.document_id, NewLine::new(item_id, q))
      .unwrap();
  }

  /// Draft a single-line document for the fixture item and post it.
  fn post_one(
    &mut self,
    kind: DocumentKind,
    number: &str,
    q: LineQuantities,
  ) -> Result<Document, Error> {
    let doc = self.draft(kind, number);
    let item_id = self.item.item_id;
    self.add(&doc, item_id, q);
    self
      .svc
      .post_document(&self.admin, doc.document_id)
      .map(|outcome| outcome.document)
  }

  fn status(&self, id: Uuid) -> DocumentStatus {
    self.svc.document(id).unwrap().unwrap().document.status
  }
}

fn with_qty(n: i64) -> LineQuantities {
  LineQuantities { qty: qty(n), ..LineQuantities::default() }
}

fn with_plan(n: i64) -> LineQuantities {
  LineQuantities { qty_plan: qty(n), ..LineQuantities::default() }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn receipt_into_empty_key_creates_balance() {
  let mut f = fixture();
  assert_eq!(f.on_hand(), None);

  let doc = f.post_one(DocumentKind::Receipt, "RC-1", with_qty(50)).unwrap();

  assert_eq!(doc.status, DocumentStatus::Posted);
  assert_eq!(doc.posted_by.as_deref(), Some("alice"));
  assert_eq!(f.on_hand(), Some(qty(50)));

  let moves = f.svc.moves(&MoveQuery::for_document(doc.document_id)).unwrap();
  assert_eq!(moves.len(), 1);
  assert_eq!(moves[0].qty, qty(50));
  assert_eq!(moves[0].move_type, MoveType::InReceipt);
  assert_eq!(moves[0].created_by, "alice");
  assert_eq!(moves[0].key(), f.key());
}

#[test]
fn outbound_beyond_stock_fails_and_changes_nothing() {
  let mut f = fixture();
  f.post_one(DocumentKind::Receipt, "RC-1", with_qty(10)).unwrap();
  let moves_before = f.move_count();

  let doc = f.draft(DocumentKind::OutboundOrder, "OUT-1");
  f.add(&doc, f.item.item_id, with_plan(15));
  let err = f.svc.post_document(&f.admin, doc.document_id).unwrap_err();

  assert!(matches!(err, Error::InsufficientStock { .. }));
  assert_eq!(f.on_hand(), Some(qty(10)));
  assert_eq!(f.move_count(), moves_before);
  assert_eq!(f.status(doc.document_id), DocumentStatus::Draft);
}

#[test]
fn count_without_variance_posts_without_moves() {
  let mut f = fixture();
  f.post_one(DocumentKind::Receipt, "RC-1", with_qty(20)).unwrap();
  let moves_before = f.move_count();

  let doc = f
    .post_one(DocumentKind::InventoryCount, "CNT-1", LineQuantities {
      qty_count: qty(20),
      qty_system: qty(20),
      ..LineQuantities::default()
    })
    .unwrap();

  assert_eq!(doc.status, DocumentStatus::Posted);
  assert_eq!(f.move_count(), moves_before);
  assert_eq!(f.on_hand(), Some(qty(20)));
}

#[test]
fn posted_document_rejects_every_edit() {
  let mut f = fixture();
  let doc = f.post_one(DocumentKind::Receipt, "RC-1", with_qty(5)).unwrap();
  let id = doc.document_id;
  let lines_before = f.svc.document(id).unwrap().unwrap().lines;

  let err = f
    .svc
    .add_line(&f.admin, id, NewLine::new(f.item.item_id, with_qty(1)))
    .unwrap_err();
  assert!(matches!(err, Error::DocumentLocked(d) if d == id));

  let err = f
    .svc
    .remove_line(&f.admin, id, lines_before[0].line_id)
    .unwrap_err();
  assert_eq!(err.code(), "DOCUMENT_LOCKED");

  let err = f
    .svc
    .update_document(&f.admin, id, f.header("RC-1b"))
    .unwrap_err();
  assert_eq!(err.code(), "DOCUMENT_LOCKED");

  let err = f.svc.delete_document(&f.admin, id).unwrap_err();
  assert_eq!(err.code(), "DOCUMENT_LOCKED");

  let view = f.svc.document(id).unwrap().unwrap();
  assert_eq!(view.lines, lines_before);
  assert_eq!(view.document.header.number, "RC-1");
}

#[test]
fn write_off_to_zero_then_overdraw() {
  let mut f = fixture();
  f.post_one(DocumentKind::Receipt, "RC-1", with_qty(5)).unwrap();

  f.post_one(DocumentKind::WriteOff, "WO-1", with_qty(5)).unwrap();
  assert_eq!(f.on_hand(), Some(Decimal::ZERO));

  let err = f
    .post_one(DocumentKind::WriteOff, "WO-2", with_qty(1))
    .unwrap_err();
  assert!(matches!(err, Error::InsufficientStock { .. }));
  assert_eq!(f.on_hand(), Some(Decimal::ZERO));
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[test]
fn reposting_is_rejected_without_side_effects() {
  let mut f = fixture();
  let doc = f.post_one(DocumentKind::Receipt, "RC-1", with_qty(8)).unwrap();
  let moves_before = f.move_count();
  let audit_before = f.svc.audit_trail(None).unwrap().len();

  let err = f.svc.post_document(&f.admin, doc.document_id).unwrap_err();

  assert!(matches!(
    err,
    Error::PostingRejected { status: DocumentStatus::Posted, .. }
  ));
  assert_eq!(f.move_count(), moves_before);
  assert_eq!(f.on_hand(), Some(qty(8)));
  assert_eq!(f.svc.audit_trail(None).unwrap().len(), audit_before);
}

#[test]
fn failing_line_rolls_back_earlier_lines() {
  let mut f = fixture();
  let second = f.another_item("SKU-2");
  let third = f.another_item("SKU-3");

  let stock = f.draft(DocumentKind::Receipt, "RC-1");
  f.add(&stock, f.item.item_id, with_qty(10));
  f.add(&stock, second.item_id, with_qty(2));
  f.add(&stock, third.item_id, with_qty(10));
  f.svc.post_document(&f.admin, stock.document_id).unwrap();
  let balances_before = f.svc.balances(&BalanceQuery::default()).unwrap();
  let moves_before = f.move_count();

  // Line 2 overdraws; lines 1 and 3 alone would succeed.
  let out = f.draft(DocumentKind::OutboundOrder, "OUT-1");
  f.add(&out, f.item.item_id, with_plan(4));
  f.add(&out, second.item_id, with_plan(3));
  f.add(&out, third.item_id, with_plan(4));
  let err = f.svc.post_document(&f.admin, out.document_id).unwrap_err();

  assert_eq!(err.code(), "INSUFFICIENT_STOCK");
  assert_eq!(f.svc.balances(&BalanceQuery::default()).unwrap(), balances_before);
  assert_eq!(f.move_count(), moves_before);
  assert_eq!(f.status(out.document_id), DocumentStatus::Draft);
}

#[test]
fn empty_document_cannot_be_posted() {
  let mut f = fixture();
  let doc = f.draft(DocumentKind::Receipt, "RC-1");

  let err = f.svc.post_document(&f.admin, doc.document_id).unwrap_err();

  assert!(matches!(err, Error::EmptyDocument(_)));
  assert_eq!(f.status(doc.document_id), DocumentStatus::Draft);
}

#[test]
fn permission_denied_blocks_posting_and_is_not_audited() {
  let mut f = fixture();
  let clerk = Actor::new("bob", "clerk");
  let doc = f
    .svc
    .create_document(&clerk, DocumentKind::Receipt, f.header("RC-1"))
    .unwrap();
  f.svc
    .add_line(&clerk, doc.document_id, NewLine::new(f.item.item_id, with_qty(3)))
    .unwrap();
  let audit_before = f.svc.audit_trail(Some(doc.document_id)).unwrap();

  let err = f.svc.post_document(&clerk, doc.document_id).unwrap_err();

  assert!(matches!(
    err,
    Error::PermissionDenied { ref permission, .. } if permission == "receipt.post"
  ));
  assert_eq!(f.on_hand(), None);
  assert_eq!(f.move_count(), 0);
  assert_eq!(f.status(doc.document_id), DocumentStatus::Draft);
  assert_eq!(f.svc.audit_trail(Some(doc.document_id)).unwrap(), audit_before);
}

#[test]
fn permission_is_checked_before_status() {
  let mut f = fixture();
  let doc = f.post_one(DocumentKind::Receipt, "RC-1", with_qty(1)).unwrap();
  let outsider = Actor::new("eve", "guest");

  let err = f.svc.post_document(&outsider, doc.document_id).unwrap_err();
  assert_eq!(err.code(), "PERMISSION_DENIED");

  let err = f.svc.delete_document(&outsider, doc.document_id).unwrap_err();
  assert_eq!(err.code(), "PERMISSION_DENIED");
}

#[test]
fn balances_match_move_sums_after_mixed_activity() {
  let mut f = fixture();
  let batch_item = f.another_item("SKU-B");

  let rc = f.draft(DocumentKind::Receipt, "RC-1");
  f.add(&rc, f.item.item_id, with_qty(30));
  f.svc
    .add_line(&f.admin, rc.document_id, NewLine {
      batch: Dim::text(Some("LOT-7")),
      ..NewLine::new(batch_item.item_id, with_qty(12))
    })
    .unwrap();
  f.svc.post_document(&f.admin, rc.document_id).unwrap();

  f.post_one(DocumentKind::OutboundOrder, "OUT-1", with_plan(11)).unwrap();
  f.post_one(DocumentKind::Return, "RET-1", with_qty(2)).unwrap();
  f.post_one(DocumentKind::InboundOrder, "IN-1", with_plan(4)).unwrap();
  f.post_one(DocumentKind::WriteOff, "WO-1", with_qty(1)).unwrap();
  f.post_one(DocumentKind::InventoryCount, "CNT-1", LineQuantities {
    qty_count: qty(20),
    qty_system: qty(24),
    ..LineQuantities::default()
  })
  .unwrap();
  // Failed attempts leave no trace.
  f.post_one(DocumentKind::WriteOff, "WO-2", with_qty(500)).unwrap_err();

  assert_eq!(f.on_hand(), Some(qty(20)));

  let balances = f
    .svc
    .balances(&BalanceQuery { include_zero: true, ..BalanceQuery::default() })
    .unwrap();
  let moves = f.svc.moves(&MoveQuery::default()).unwrap();
  assert_eq!(balances.len(), 2);
  assert!(reconcile(&balances, &moves).unwrap().is_empty());
  assert!(balances.iter().all(|b| b.qty >= Decimal::ZERO));
}

#[test]
fn count_and_write_off_resolve_client_from_item() {
  let mut f = fixture();
  f.post_one(DocumentKind::Receipt, "RC-1", with_qty(10)).unwrap();

  let header = DocumentHeader { client_id: None, ..f.header("CNT-1") };
  let count = f
    .svc
    .create_document(&f.admin, DocumentKind::InventoryCount, header)
    .unwrap();
  f.add(&count, f.item.item_id, LineQuantities {
    qty_count: qty(13),
    qty_system: qty(10),
    ..LineQuantities::default()
  });
  let outcome = f.svc.post_document(&f.admin, count.document_id).unwrap();

  assert_eq!(outcome.moves.len(), 1);
  assert_eq!(outcome.moves[0].client_id, f.client);
  assert_eq!(outcome.moves[0].move_type, MoveType::Adjustment);
  assert_eq!(outcome.moves[0].qty, qty(3));
  assert_eq!(f.on_hand(), Some(qty(13)));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn draft_lines_are_numbered_and_removable() {
  let mut f = fixture();
  let doc = f.draft(DocumentKind::Receipt, "RC-1");
  f.add(&doc, f.item.item_id, with_qty(1));
  f.add(&doc, f.item.item_id, with_qty(2));

  let lines = f.svc.document(doc.document_id).unwrap().unwrap().lines;
  assert_eq!(lines.iter().map(|l| l.line_no).collect::<Vec<_>>(), [1, 2]);

  f.svc
    .remove_line(&f.admin, doc.document_id, lines[0].line_id)
    .unwrap();
  f.add(&doc, f.item.item_id, with_qty(3));

  let lines = f.svc.document(doc.document_id).unwrap().unwrap().lines;
  assert_eq!(lines.iter().map(|l| l.line_no).collect::<Vec<_>>(), [2, 3]);

  let err = f
    .svc
    .remove_line(&f.admin, doc.document_id, Uuid::new_v4())
    .unwrap_err();
  assert_eq!(err.code(), "LINE_NOT_FOUND");
}

#[test]
fn deleting_a_draft_leaves_the_ledger_alone() {
  let mut f = fixture();
  let doc = f.draft(DocumentKind::Receipt, "RC-1");
  f.add(&doc, f.item.item_id, with_qty(4));

  f.svc.delete_document(&f.admin, doc.document_id).unwrap();

  assert!(f.svc.document(doc.document_id).unwrap().is_none());
  assert!(f.svc.store().list_lines(doc.document_id).unwrap().is_empty());
  assert_eq!(f.move_count(), 0);
  assert_eq!(f.on_hand(), None);
}

#[test]
fn document_numbers_are_unique_per_kind() {
  let mut f = fixture();
  f.draft(DocumentKind::Receipt, "N-1");
  f.draft(DocumentKind::Return, "N-1");

  let err = f
    .svc
    .create_document(&f.admin, DocumentKind::Receipt, f.header("N-1"))
    .unwrap_err();
  assert_eq!(err.code(), "INTEGRITY_VIOLATION");
  assert_eq!(
    f.svc
      .documents(&Default::default())
      .unwrap()
      .iter()
      .filter(|d| d.header.number == "N-1")
      .count(),
    2
  );
}

#[test]
fn header_rules_are_enforced() {
  let mut f = fixture();
  let no_client = DocumentHeader { client_id: None, ..f.header("RC-1") };
  let err = f
    .svc
    .create_document(&f.admin, DocumentKind::Receipt, no_client)
    .unwrap_err();
  assert_eq!(err.code(), "VALIDATION");

  let blank = f.header("   ");
  let err = f
    .svc
    .create_document(&f.admin, DocumentKind::Receipt, blank)
    .unwrap_err();
  assert_eq!(err.code(), "VALIDATION");

  let doc = f.draft(DocumentKind::Receipt, "RC-2");
  let updated = f
    .svc
    .update_document(&f.admin, doc.document_id, DocumentHeader {
      comment: Some("dock 4".into()),
      ..f.header("RC-2")
    })
    .unwrap();
  assert_eq!(updated.header.comment.as_deref(), Some("dock 4"));
}

#[test]
fn moving_a_draft_to_another_client_keeps_items_with_their_owner() {
  let mut f = fixture();
  let doc = f.draft(DocumentKind::Receipt, "RC-1");
  let item_id = f.item.item_id;
  f.add(&doc, item_id, with_qty(5));

  let other_client = Uuid::new_v4();
  let err = f
    .svc
    .update_document(&f.admin, doc.document_id, DocumentHeader {
      client_id: Some(other_client),
      ..f.header("RC-1")
    })
    .unwrap_err();
  assert_eq!(err.code(), "VALIDATION");
  let view = f.svc.document(doc.document_id).unwrap().unwrap();
  assert_eq!(view.document.header.client_id, Some(f.client));

  f.svc.post_document(&f.admin, doc.document_id).unwrap();
  let stray = StockKey::new(other_client, f.warehouse, item_id);
  assert_eq!(f.svc.balance(&stray).unwrap(), None);
  assert_eq!(f.on_hand(), Some(qty(5)));

  // An empty draft may change hands freely.
  let empty = f.draft(DocumentKind::Receipt, "RC-2");
  let moved = f
    .svc
    .update_document(&f.admin, empty.document_id, DocumentHeader {
      client_id: Some(other_client),
      ..f.header("RC-2")
    })
    .unwrap();
  assert_eq!(moved.header.client_id, Some(other_client));
}

#[test]
fn receipt_past_the_decimal_range_fails_cleanly() {
  let mut f = fixture();
  f.post_one(DocumentKind::Receipt, "RC-1", LineQuantities {
    qty: Decimal::MAX,
    ..LineQuantities::default()
  })
  .unwrap();
  let moves_before = f.move_count();

  let doc = f.draft(DocumentKind::Receipt, "RC-2");
  let item_id = f.item.item_id;
  f.add(&doc, item_id, with_qty(1));
  let err = f.svc.post_document(&f.admin, doc.document_id).unwrap_err();
  assert_eq!(err.code(), "VALIDATION");
  assert_eq!(f.on_hand(), Some(Decimal::MAX));
  assert_eq!(f.move_count(), moves_before);
  assert_eq!(f.status(doc.document_id), DocumentStatus::Draft);

  // The store is still usable afterwards.
  f.post_one(DocumentKind::WriteOff, "WO-1", with_qty(1)).unwrap();
  assert_eq!(f.on_hand(), Some(Decimal::MAX - Decimal::ONE));
}

#[test]
fn nested_begin_is_refused_without_an_integrity_code() {
  let mut store = MemoryStore::new();
  store.begin().unwrap();
  let err = store.begin().unwrap_err();
  assert_eq!(err.code(), "VALIDATION");
  store.rollback().unwrap();
  store.begin().unwrap();
}

#[test]
fn line_input_is_validated() {
  let mut f = fixture();
  let doc = f.draft(DocumentKind::Receipt, "RC-1");

  let err = f
    .svc
    .add_line(&f.admin, doc.document_id, NewLine::new(f.item.item_id, with_qty(0)))
    .unwrap_err();
  assert_eq!(err.code(), "VALIDATION");

  let err = f
    .svc
    .add_line(&f.admin, doc.document_id, NewLine::new(f.item.item_id, with_qty(-2)))
    .unwrap_err();
  assert_eq!(err.code(), "VALIDATION");

  let err = f
    .svc
    .add_line(&f.admin, doc.document_id, NewLine::new(Uuid::new_v4(), with_qty(1)))
    .unwrap_err();
  assert_eq!(err.code(), "ITEM_NOT_FOUND");

  let foreign = f
    .svc
    .register_item(&f.admin, NewItem {
      client_id: Uuid::new_v4(),
      sku:       "OTHER".into(),
      name:      "Other client's item".into(),
      unit:      "pcs".into(),
    })
    .unwrap();
  let err = f
    .svc
    .add_line(&f.admin, doc.document_id, NewLine::new(foreign.item_id, with_qty(1)))
    .unwrap_err();
  assert_eq!(err.code(), "VALIDATION");

  assert!(f.svc.document(doc.document_id).unwrap().unwrap().lines.is_empty());
}

#[test]
fn successful_operations_are_audited_once() {
  let mut f = fixture();
  let doc = f.draft(DocumentKind::Receipt, "RC-1");
  f.add(&doc, f.item.item_id, with_qty(2));
  f.svc.post_document(&f.admin, doc.document_id).unwrap();

  let actions: Vec<AuditAction> = f
    .svc
    .audit_trail(Some(doc.document_id))
    .unwrap()
    .into_iter()
    .map(|e| e.action)
    .collect();
  assert_eq!(actions, [
    AuditAction::Create,
    AuditAction::Update,
    AuditAction::Post
  ]);
  assert!(
    f.svc
      .audit_trail(Some(doc.document_id))
      .unwrap()
      .iter()
      .all(|e| e.actor_id == "alice")
  );
}

#[test]
fn duplicate_sku_for_same_client_is_rejected() {
  let mut f = fixture();
  let err = f
    .svc
    .register_item(&f.admin, NewItem {
      client_id: f.client,
      sku:       "SKU-1".into(),
      name:      "Again".into(),
      unit:      "pcs".into(),
    })
    .unwrap_err();
  assert_eq!(err.code(), "INTEGRITY_VIOLATION");
}
