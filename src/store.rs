use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::models::delivery_problem::DeliveryProblem;
use crate::models::deliveryman::{Deliveryman, DeliverymanSummary};
use crate::models::file::{File, FileSummary};
use crate::models::order::{Order, OrderDetails};
use crate::models::recipient::{Recipient, RecipientSummary};

/// One entity kind: rows keyed by a serial id.
pub struct Table<T> {
    rows: DashMap<i64, T>,
    next_id: AtomicI64,
}

impl<T: Clone> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Allocates the next id and stores the row built from it.
    pub fn insert_with(&self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    /// Mutates the row in place and returns the updated copy.
    pub fn update(&self, id: i64, change: impl FnOnce(&mut T)) -> Option<T> {
        let mut entry = self.rows.get_mut(&id)?;
        change(entry.value_mut());
        Some(entry.value().clone())
    }

    pub fn remove(&self, id: i64) -> Option<T> {
        self.rows.remove(&id).map(|(_, row)| row)
    }

    /// Rows matching `keep`, ordered by id.
    pub fn filter(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<(i64, T)> = self
            .rows
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    pub fn all(&self) -> Vec<T> {
        self.filter(|_| true)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Clone> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process persistence for every entity the API manages.
#[derive(Default)]
pub struct Store {
    pub orders: Table<Order>,
    pub recipients: Table<Recipient>,
    pub deliverymen: Table<Deliveryman>,
    pub files: Table<File>,
    pub problems: Table<DeliveryProblem>,
    /// Lowercased email to deliveryman id; the uniqueness guard.
    deliveryman_emails: DashMap<String, i64>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active orders whose product contains `query`, ignoring case.
    pub fn active_orders(&self, query: &str) -> Vec<Order> {
        let needle = query.to_lowercase();
        self.orders
            .filter(|order| order.is_active() && order.product.to_lowercase().contains(&needle))
    }

    pub fn order_details(&self, order: &Order) -> OrderDetails {
        OrderDetails {
            id: order.id,
            product: order.product.clone(),
            start_date: order.start_date,
            canceled_at: order.canceled_at,
            end_date: order.end_date,
            recipient: self.recipient_summary(order.recipient_id),
            deliveryman: self.deliveryman_summary(order.deliveryman_id),
        }
    }

    pub fn recipient_summary(&self, id: i64) -> Option<RecipientSummary> {
        self.recipients.get(id).map(|recipient| RecipientSummary::from(&recipient))
    }

    pub fn deliveryman_summary(&self, id: i64) -> Option<DeliverymanSummary> {
        let deliveryman = self.deliverymen.get(id)?;
        let avatar = deliveryman
            .avatar_id
            .and_then(|avatar_id| self.files.get(avatar_id))
            .map(|file| FileSummary::from(&file));

        Some(DeliverymanSummary {
            name: deliveryman.name,
            email: deliveryman.email,
            avatar,
        })
    }

    /// Sets `canceled_at`, overwriting any earlier cancellation.
    pub fn cancel_order(&self, id: i64, at: DateTime<Utc>) -> Option<Order> {
        self.orders.update(id, |order| {
            order.canceled_at = Some(at);
            order.updated_at = at;
        })
    }

    pub fn problems_for(&self, delivery_id: i64) -> Vec<DeliveryProblem> {
        self.problems.filter(|problem| problem.delivery_id == delivery_id)
    }

    /// Inserts the deliveryman unless `email` is taken. The index entry stays
    /// locked until the row exists, so concurrent registrations of one email
    /// admit exactly one.
    pub fn register_deliveryman(
        &self,
        email: &str,
        build: impl FnOnce(i64) -> Deliveryman,
    ) -> Option<Deliveryman> {
        match self.deliveryman_emails.entry(email_key(email)) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let deliveryman = self.deliverymen.insert_with(build);
                slot.insert(deliveryman.id);
                Some(deliveryman)
            }
        }
    }

    /// Points `email` at deliveryman `id` and releases the address it held
    /// before. False when another deliveryman owns `email`.
    pub fn claim_deliveryman_email(&self, id: i64, email: &str) -> bool {
        let key = email_key(email);
        match self.deliveryman_emails.entry(key.clone()) {
            Entry::Occupied(owner) => {
                if *owner.get() != id {
                    return false;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        self.deliveryman_emails.retain(|other, owner| *owner != id || *other == key);
        true
    }

    pub fn remove_deliveryman(&self, id: i64) -> Option<Deliveryman> {
        let deliveryman = self.deliverymen.remove(id)?;
        self.deliveryman_emails
            .remove_if(&email_key(&deliveryman.email), |_, owner| *owner == id);
        Some(deliveryman)
    }

    pub fn deliveryman_by_email(&self, email: &str) -> Option<Deliveryman> {
        let id = *self.deliveryman_emails.get(&email_key(email))?;
        self.deliverymen.get(id)
    }

    pub fn has_active_orders(&self, deliveryman_id: i64) -> bool {
        !self
            .orders
            .filter(|order| order.deliveryman_id == deliveryman_id && order.is_active())
            .is_empty()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
