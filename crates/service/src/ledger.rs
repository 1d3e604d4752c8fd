//! Local order ledger.
//!
//! All orders live as one JSON array in a single store slot, newest first.
//! Every mutation is a whole-slot read-modify-write; a per-ledger mutex keeps
//! those from interleaving within one process. Nothing coordinates separate
//! processes sharing the same store.
//!
//! Records are decoded one by one. A record that does not decode is skipped
//! by queries and written back exactly as it was found.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use models::{CartItem, Order, OrderStatus};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::identity::{IdentityResolver, UserIdentity};
use crate::storage::KvStore;

/// Wall clock at millisecond precision, the resolution orders are stamped with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// One element of the stored array: the JSON as found, plus the order when
/// it decodes.
struct Record {
    raw: Value,
    order: Option<Order>,
}

impl Record {
    fn decode(index: usize, raw: Value) -> Self {
        let order = match serde_json::from_value::<Order>(raw.clone()) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable order record");
                None
            }
        };
        Self { raw, order }
    }

    fn new(order: Order) -> Result<Self, ServiceError> {
        Ok(Self { raw: serde_json::to_value(&order)?, order: Some(order) })
    }
}

pub struct LocalOrderLedger {
    store: Arc<dyn KvStore>,
    orders_key: String,
    identity: IdentityResolver,
    clock: fn() -> DateTime<Utc>,
    write_lock: Mutex<()>,
}

impl LocalOrderLedger {
    pub fn new(store: Arc<dyn KvStore>, orders_key: impl Into<String>, user_key: impl Into<String>) -> Self {
        let identity = IdentityResolver::new(Arc::clone(&store), user_key);
        Self {
            store,
            orders_key: orders_key.into(),
            identity,
            clock: now_millis,
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the clock used for ids and timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Identity derived from the stored "current user" record.
    pub async fn current_identity(&self) -> UserIdentity {
        self.identity.resolve().await
    }

    /// Slot contents split into records; `None` when the slot was never
    /// written. Fails only when the slot is not a JSON array at all.
    async fn read_all(&self) -> Result<Option<Vec<Record>>, ServiceError> {
        let Some(raw) = self.store.get(&self.orders_key).await? else {
            return Ok(None);
        };
        let values: Vec<Value> = serde_json::from_str(&raw)?;
        Ok(Some(values.into_iter().enumerate().map(|(i, v)| Record::decode(i, v)).collect()))
    }

    /// Read path: a slot that is not an array is logged and reads as empty.
    async fn read_for_query(&self) -> Result<Vec<Order>, ServiceError> {
        match self.read_all().await {
            Ok(records) => Ok(records.unwrap_or_default().into_iter().filter_map(|r| r.order).collect()),
            Err(ServiceError::Serialization(e)) => {
                warn!(key = %self.orders_key, error = %e, "order ledger is corrupt; reading as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn write_all(&self, records: &[Record]) -> Result<(), ServiceError> {
        let raws: Vec<&Value> = records.iter().map(|r| &r.raw).collect();
        let raw = serde_json::to_string(&raws)?;
        self.store.set(&self.orders_key, raw).await
    }

    /// Record a new order for `owner` and return it.
    ///
    /// The order is prepended, so listings stay newest first. Non-finite
    /// amounts are rejected before the slot is touched.
    pub async fn save_order(
        &self,
        owner: &UserIdentity,
        items: Vec<CartItem>,
        total: f64,
    ) -> Result<Order, ServiceError> {
        Order::validate_amounts(&items, total)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?.unwrap_or_default();

        let now = (self.clock)();
        let order = Order {
            id: Order::id_from_millis(now.timestamp_millis()),
            user_id: owner.as_str().to_string(),
            items,
            total,
            status: OrderStatus::Processing,
            created_at: now,
            updated_at: now,
        };
        records.insert(0, Record::new(order.clone())?);
        self.write_all(&records).await?;

        info!(order_id = %order.id, user = %owner, total, items = order.item_count(), "order saved");
        Ok(order)
    }

    /// Orders owned by `owner`, newest first.
    pub async fn get_user_orders(&self, owner: &UserIdentity) -> Result<Vec<Order>, ServiceError> {
        let orders = self.read_for_query().await?;
        Ok(orders.into_iter().filter(|o| o.user_id == owner.as_str()).collect())
    }

    pub async fn get_order_by_id(
        &self,
        owner: &UserIdentity,
        order_id: &str,
    ) -> Result<Option<Order>, ServiceError> {
        let orders = self.get_user_orders(owner).await?;
        Ok(orders.into_iter().find(|o| o.id == order_id))
    }

    /// Move one of `owner`'s orders to `status`. Orders of other owners are
    /// not visible here; `None` means no such order for this owner and the
    /// store is left untouched.
    pub async fn update_order_status(
        &self,
        owner: &UserIdentity,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, ServiceError> {
        self.update_where(order_id, status, |o| o.user_id == owner.as_str()).await
    }

    /// Move any order to `status` regardless of owner, for back-office use.
    pub async fn update_order_status_any_owner(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, ServiceError> {
        self.update_where(order_id, status, |_| true).await
    }

    async fn update_where<F>(
        &self,
        order_id: &str,
        status: OrderStatus,
        visible: F,
    ) -> Result<Option<Order>, ServiceError>
    where
        F: Fn(&Order) -> bool,
    {
        let _guard = self.write_lock.lock().await;
        let Some(mut records) = self.read_all().await? else {
            debug!(order_id, "no ledger yet; nothing to update");
            return Ok(None);
        };
        let found = records.iter_mut().find_map(|r| {
            let order = r.order.as_mut()?;
            let hit = order.id == order_id && visible(order);
            hit.then_some((order, &mut r.raw))
        });
        let Some((order, raw)) = found else {
            debug!(order_id, "order not found; ledger unchanged");
            return Ok(None);
        };

        let previous = order.status;
        order.status = status;
        // coarse or skewed clocks must not move updatedAt backwards
        order.updated_at = (self.clock)().max(order.updated_at);
        // patch in place so fields this crate does not model survive
        if let Some(obj) = raw.as_object_mut() {
            obj.insert("status".into(), serde_json::to_value(order.status)?);
            obj.insert("updatedAt".into(), serde_json::to_value(order.updated_at)?);
        }
        let updated = order.clone();
        self.write_all(&records).await?;

        info!(order_id, from = %previous, to = %status, "order status updated");
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;
    use chrono::TimeZone;
    use models::CartProduct;

    fn ledger_on(store: Arc<dyn KvStore>) -> LocalOrderLedger {
        LocalOrderLedger::new(store, "user_orders", "user")
    }

    fn ledger() -> (Arc<MemoryKvStore>, LocalOrderLedger) {
        let store = Arc::new(MemoryKvStore::new());
        let ledger = ledger_on(store.clone());
        (store, ledger)
    }

    fn item(name: &str, price: f64, quantity: u32) -> CartItem {
        CartItem {
            product: CartProduct { id: 1, name: name.into(), price, image: None, category: None },
            quantity,
        }
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap_or_default()
    }

    fn earlier_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap_or_default()
    }

    fn is_order_id(id: &str) -> bool {
        id.len() == 10
            && id.starts_with("ORD-")
            && id[4..].chars().all(|c| c.is_ascii_digit())
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() -> anyhow::Result<()> {
        let (_, ledger) = ledger();
        assert!(ledger.get_user_orders(&UserIdentity::guest()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn save_list_update_scenario() -> anyhow::Result<()> {
        let (_, ledger) = ledger();
        let me = ledger.current_identity().await;
        assert_eq!(me, UserIdentity::guest());

        let order = ledger.save_order(&me, vec![item("Case", 25.0, 2)], 50.0).await?;
        assert!(is_order_id(&order.id), "bad id {}", order.id);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.created_at, order.updated_at);
        assert_eq!(order.user_id, UserIdentity::GUEST);

        let listed = ledger.get_user_orders(&me).await?;
        assert_eq!(listed, vec![order.clone()]);

        let shipped = ledger
            .update_order_status(&me, &order.id, OrderStatus::Shipped)
            .await?
            .expect("order exists");
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(shipped.id, order.id);

        assert!(ledger.get_order_by_id(&me, "nonexistent").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn newest_order_is_listed_first() -> anyhow::Result<()> {
        let (_, ledger) = ledger();
        let me = UserIdentity::new("u1");
        let first = ledger.save_order(&me, vec![item("A", 1.0, 1)], 1.0).await?;
        let second = ledger.save_order(&me, vec![item("B", 2.0, 1)], 2.0).await?;

        let listed = ledger.get_user_orders(&me).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], second);
        assert_eq!(listed[1], first);
        Ok(())
    }

    fn alice_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).single().unwrap_or_default()
    }

    #[tokio::test]
    async fn owners_never_see_each_other() -> anyhow::Result<()> {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let alice = UserIdentity::new("alice");
        let bob = UserIdentity::new("bob");
        let a = ledger_on(Arc::clone(&store))
            .with_clock(alice_clock)
            .save_order(&alice, vec![item("A", 3.0, 1)], 3.0)
            .await?;
        let b = ledger_on(Arc::clone(&store))
            .with_clock(fixed_clock)
            .save_order(&bob, vec![item("B", 4.0, 1)], 4.0)
            .await?;
        assert_ne!(a.id, b.id);

        let ledger = ledger_on(store);
        let alices = ledger.get_user_orders(&alice).await?;
        assert!(alices.iter().all(|o| o.user_id != bob.as_str() && o.id != b.id));
        assert_eq!(alices, vec![a.clone()]);
        assert_eq!(ledger.get_user_orders(&bob).await?, vec![b.clone()]);
        assert_eq!(ledger.get_order_by_id(&alice, &b.id).await?, None);
        assert_eq!(ledger.get_order_by_id(&bob, &a.id).await?, None);
        assert_eq!(ledger.get_order_by_id(&alice, &a.id).await?, Some(a));
        assert!(ledger.get_user_orders(&UserIdentity::guest()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn scoped_update_ignores_other_owners_orders() -> anyhow::Result<()> {
        let (store, ledger) = ledger();
        let alice = UserIdentity::new("alice");
        let order = ledger.save_order(&alice, vec![item("A", 3.0, 1)], 3.0).await?;
        let before = store.get("user_orders").await?;

        let res = ledger
            .update_order_status(&UserIdentity::new("mallory"), &order.id, OrderStatus::Cancelled)
            .await?;
        assert!(res.is_none());
        assert_eq!(store.get("user_orders").await?, before);

        let res = ledger.update_order_status_any_owner(&order.id, OrderStatus::Completed).await?;
        assert_eq!(res.map(|o| o.status), Some(OrderStatus::Completed));
        Ok(())
    }

    #[tokio::test]
    async fn update_changes_only_status_and_updated_at() -> anyhow::Result<()> {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let me = UserIdentity::new("u1");
        let saved = ledger_on(Arc::clone(&store))
            .with_clock(earlier_clock)
            .save_order(&me, vec![item("A", 5.0, 2)], 10.0)
            .await?;

        let ledger = ledger_on(store).with_clock(fixed_clock);
        let updated = ledger
            .update_order_status(&me, &saved.id, OrderStatus::Cancelled)
            .await?
            .expect("order exists");

        assert_eq!(updated.status, OrderStatus::Cancelled);
        assert_eq!(updated.updated_at, fixed_clock());
        assert!(updated.updated_at > saved.updated_at);
        let mut expected = saved.clone();
        expected.status = updated.status;
        expected.updated_at = updated.updated_at;
        assert_eq!(updated, expected);

        let reread = ledger.get_order_by_id(&me, &saved.id).await?;
        assert_eq!(reread, Some(updated));
        Ok(())
    }

    #[tokio::test]
    async fn updated_at_never_moves_backwards() -> anyhow::Result<()> {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let me = UserIdentity::new("u1");
        let saved = ledger_on(Arc::clone(&store))
            .with_clock(fixed_clock)
            .save_order(&me, vec![], 0.0)
            .await?;

        let updated = ledger_on(store)
            .with_clock(earlier_clock)
            .update_order_status(&me, &saved.id, OrderStatus::Shipped)
            .await?
            .expect("order exists");
        assert_eq!(updated.updated_at, saved.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_leaves_store_unchanged() -> anyhow::Result<()> {
        let (store, ledger) = ledger();
        let me = UserIdentity::guest();

        // no ledger slot at all
        assert!(ledger.update_order_status(&me, "ORD-000001", OrderStatus::Shipped).await?.is_none());
        assert_eq!(store.get("user_orders").await?, None);

        ledger.save_order(&me, vec![item("A", 1.0, 1)], 1.0).await?;
        let before = store.get("user_orders").await?;
        assert!(ledger.update_order_status(&me, "nonexistent", OrderStatus::Shipped).await?.is_none());
        assert_eq!(store.get("user_orders").await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn ids_follow_clock_millis() -> anyhow::Result<()> {
        let (_, ledger) = ledger();
        let ledger = ledger.with_clock(fixed_clock);
        let order = ledger.save_order(&UserIdentity::guest(), vec![], 0.0).await?;
        let expected = format!("ORD-{:06}", fixed_clock().timestamp_millis() % 1_000_000);
        assert_eq!(order.id, expected);
        Ok(())
    }

    #[tokio::test]
    async fn identity_slot_drives_current_owner() -> anyhow::Result<()> {
        let store = Arc::new(MemoryKvStore::with_slots([("user", r#"{"id": 99, "username": "zed"}"#)]));
        let ledger = ledger_on(store);
        let me = ledger.current_identity().await;
        assert_eq!(me.as_str(), "99");

        let order = ledger.save_order(&me, vec![item("A", 1.0, 1)], 1.0).await?;
        assert_eq!(order.user_id, "99");
        assert!(ledger.get_user_orders(&UserIdentity::guest()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reads_existing_web_client_ledger() -> anyhow::Result<()> {
        let raw = r#"[
            {"id":"ORD-100003","userId":42,"items":[],"total":7.25,"status":"processing",
             "createdAt":"2023-05-16T10:00:00.000Z","updatedAt":"2023-05-16T10:00:00.000Z","note":"gift"},
            {"id":"ORD-100002","userId":"ann","items":[],"total":12.5,"status":"shipped",
             "createdAt":"2023-05-15T10:00:00.000Z","updatedAt":"2023-05-16T09:30:00.000Z"},
            {"id":"ORD-100001","userId":"guest-user","items":[],"total":3.0,"status":"processing",
             "createdAt":"2023-05-14T10:00:00.000Z","updatedAt":"2023-05-14T10:00:00.000Z"}
        ]"#;
        let store = Arc::new(MemoryKvStore::with_slots([("user_orders", raw), ("user", r#"{"id": 42}"#)]));
        let ledger = ledger_on(store.clone()).with_clock(fixed_clock);

        let ann = ledger.get_user_orders(&UserIdentity::new("ann")).await?;
        assert_eq!(ann.len(), 1);
        assert_eq!(ann[0].status, OrderStatus::Shipped);
        assert_eq!(
            ledger.get_order_by_id(&UserIdentity::guest(), "ORD-100001").await?.map(|o| o.total),
            Some(3.0)
        );

        // a numeric userId matches the identity resolved from a numeric user id
        let me = ledger.current_identity().await;
        assert_eq!(me.as_str(), "42");
        let mine = ledger.get_user_orders(&me).await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "ORD-100003");

        let shipped = ledger.update_order_status(&me, "ORD-100003", OrderStatus::Shipped).await?;
        assert_eq!(shipped.map(|o| o.status), Some(OrderStatus::Shipped));
        let saved = ledger.save_order(&me, vec![item("A", 1.0, 1)], 1.0).await?;
        assert_eq!(ledger.get_user_orders(&me).await?[0], saved);

        // the patched record keeps its numeric owner and unmodelled fields
        let slot: Vec<serde_json::Value> = serde_json::from_str(&store.get("user_orders").await?.unwrap_or_default())?;
        assert_eq!(slot.len(), 4);
        assert_eq!(slot[1]["userId"], 42);
        assert_eq!(slot[1]["note"], "gift");
        assert_eq!(slot[1]["status"], "shipped");
        Ok(())
    }

    #[tokio::test]
    async fn bad_record_is_skipped_and_preserved() -> anyhow::Result<()> {
        let raw = r#"[
            {"id":"ORD-000002","userId":"u1","items":[],"total":null,"status":"processing",
             "createdAt":"2023-05-15T10:00:00.000Z","updatedAt":"2023-05-15T10:00:00.000Z"},
            {"id":"ORD-000001","userId":"u1","items":[],"total":2.0,"status":"processing",
             "createdAt":"2023-05-14T10:00:00.000Z","updatedAt":"2023-05-14T10:00:00.000Z"}
        ]"#;
        let store = Arc::new(MemoryKvStore::with_slots([("user_orders", raw)]));
        let ledger = ledger_on(store.clone());
        let me = UserIdentity::new("u1");

        let listed = ledger.get_user_orders(&me).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "ORD-000001");
        assert!(ledger.update_order_status(&me, "ORD-000002", OrderStatus::Shipped).await?.is_none());

        let saved = ledger.save_order(&me, vec![item("A", 1.0, 1)], 1.0).await?;
        let updated = ledger.update_order_status(&me, "ORD-000001", OrderStatus::Completed).await?;
        assert!(updated.is_some());
        assert_eq!(ledger.get_user_orders(&me).await?[0], saved);

        let slot: Vec<serde_json::Value> = serde_json::from_str(&store.get("user_orders").await?.unwrap_or_default())?;
        assert_eq!(slot.len(), 3);
        assert_eq!(slot[1]["id"], "ORD-000002");
        assert!(slot[1]["total"].is_null());
        assert_eq!(slot[2]["status"], "completed");
        Ok(())
    }

    #[tokio::test]
    async fn non_finite_total_is_refused_and_ledger_stays_readable() -> anyhow::Result<()> {
        let (store, ledger) = ledger();
        let me = UserIdentity::guest();
        let first = ledger.save_order(&me, vec![], 5.0).await?;
        let before = store.get("user_orders").await?;

        let err = ledger.save_order(&me, vec![], f64::NAN).await.expect_err("NaN total");
        assert!(matches!(err, ServiceError::Model(_)));
        assert!(ledger.save_order(&me, vec![item("A", f64::INFINITY, 1)], 1.0).await.is_err());
        assert_eq!(store.get("user_orders").await?, before);

        assert_eq!(ledger.get_user_orders(&me).await?, vec![first]);
        let second = ledger.save_order(&me, vec![], 6.0).await?;
        assert_eq!(ledger.get_user_orders(&me).await?[0], second);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_ledger_reads_empty_but_refuses_writes() -> anyhow::Result<()> {
        let store = Arc::new(MemoryKvStore::with_slots([("user_orders", "{broken")]));
        let ledger = ledger_on(store.clone());
        let me = UserIdentity::guest();

        assert!(ledger.get_user_orders(&me).await?.is_empty());
        let err = ledger.save_order(&me, vec![], 1.0).await.expect_err("must not clobber");
        assert!(matches!(err, ServiceError::Serialization(_)));
        assert_eq!(store.get("user_orders").await?.as_deref(), Some("{broken"));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_saves_do_not_lose_orders() -> anyhow::Result<()> {
        let (_, ledger) = ledger();
        let ledger = Arc::new(ledger);
        let me = UserIdentity::new("u1");

        let mut handles = Vec::new();
        for i in 0..8 {
            let ledger = Arc::clone(&ledger);
            let me = me.clone();
            handles.push(tokio::spawn(async move {
                ledger.save_order(&me, vec![item("A", 1.0, 1)], f64::from(i)).await
            }));
        }
        for h in handles {
            h.await??;
        }
        assert_eq!(ledger.get_user_orders(&me).await?.len(), 8);
        Ok(())
    }
}
