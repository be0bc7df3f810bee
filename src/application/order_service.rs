use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::identity::Visibility;
use crate::domain::order::{
    compute_total, CreateOrder, NewOrder, Order, OrderItem, OrderStatus, Receipt, ReceiptItem,
    VersionToken,
};
use crate::domain::ports::{CatalogRepository, Clock, IdentityProvider, OrderRepository};

/// Owns order creation and the payment/cancellation state machine. The payment transition
/// is the only compare-and-swap protected write in the system.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            catalog,
            identity,
            clock,
        }
    }

    pub fn create_order(&self, request: CreateOrder) -> Result<Order, DomainError> {
        if request.items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        if let Some(bad) = request.items.iter().find(|i| i.quantity <= 0) {
            return Err(DomainError::InvalidInput(format!(
                "quantity of '{}' must be positive",
                bad.product_name
            )));
        }

        let names: Vec<String> = request
            .items
            .iter()
            .map(|i| i.product_name.clone())
            .collect();
        let products = self.catalog.find_by_names(&names)?;

        let items = request
            .items
            .iter()
            .map(|requested| {
                let product = resolve_unique(&products, &requested.product_name)?;
                Ok(OrderItem {
                    product_id: product.id,
                    quantity: requested.quantity,
                    unit_price: product.price.clone(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        if self
            .orders
            .find_active_by_table(request.table_number)?
            .is_some()
        {
            log::warn!(
                "Rejecting order for table {}: an active order exists",
                request.table_number
            );
            return Err(DomainError::DuplicateActiveOrder(request.table_number));
        }

        let order = Order {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            table_number: request.table_number,
            total_price: compute_total(&items),
            items,
            status: OrderStatus::Created,
            confirmed_at: self.clock.now(),
        };
        let order = self.orders.insert(NewOrder {
            order,
            version: VersionToken::fresh(),
        })?;

        log::info!(
            "Created order {} for table {} (total {})",
            order.id,
            order.table_number,
            order.total_price
        );
        Ok(order)
    }

    /// Moves the order to `target` iff nobody else touched it since it was read.
    ///
    /// Already-paid orders return their receipt untouched. A lost race surfaces as
    /// `ConcurrentModification`; retrying is the caller's decision.
    pub fn try_lock_and_pay(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        language_code: &str,
    ) -> Result<Receipt, DomainError> {
        if target == OrderStatus::Created {
            return Err(DomainError::InvalidInput(
                "an order cannot be moved back to Created".to_string(),
            ));
        }

        let current = self
            .orders
            .load(order_id)?
            .ok_or(DomainError::OrderNotFound(order_id))?;
        let mut order = current.value;

        if order.status == OrderStatus::Paid {
            log::debug!("Order {order_id} already paid, returning existing receipt");
            return self.receipt(&order, language_code);
        }
        if order.status.is_cancelled() {
            return Err(DomainError::OrderCancelled(order_id));
        }

        match self
            .orders
            .compare_and_swap_status(order_id, &current.version, target)?
        {
            Some(_) => {
                log::info!("Order {order_id} moved {} -> {target}", order.status);
                order.status = target;
                self.receipt(&order, language_code)
            }
            None => {
                log::warn!("Order {order_id} changed while moving to {target}");
                Err(DomainError::ConcurrentModification(order_id))
            }
        }
    }

    pub fn cancel_order(&self, order_id: Uuid) -> Result<Order, DomainError> {
        self.cancel_order_as(order_id, OrderStatus::PaymentCancelled)
    }

    /// Cancellation is not version-checked but never overwrites a paid order; it does mint a
    /// new version, so a payer that read before the cancel loses its swap.
    pub fn cancel_order_as(
        &self,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, DomainError> {
        if !matches!(
            target,
            OrderStatus::PaymentCancelled | OrderStatus::Cancelled | OrderStatus::Failed
        ) {
            return Err(DomainError::InvalidInput(format!(
                "{target} is not a cancellation status"
            )));
        }

        let order = self.get_order(order_id)?;
        if order.status == OrderStatus::Paid {
            return Err(DomainError::AlreadyPaid(order_id));
        }

        if !self
            .orders
            .set_status_unless(order_id, target, OrderStatus::Paid)?
        {
            // Paid or deleted between the read and the write.
            return match self.orders.load(order_id)? {
                Some(_) => Err(DomainError::AlreadyPaid(order_id)),
                None => Err(DomainError::OrderNotFound(order_id)),
            };
        }

        log::info!("Order {order_id} moved {} -> {target}", order.status);
        Ok(Order {
            status: target,
            ..order
        })
    }

    pub fn edit_order(&self, order_id: Uuid, table_number: i32) -> Result<Order, DomainError> {
        self.orders
            .update_table_number(order_id, table_number)?
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    pub fn delete_order(&self, order_id: Uuid) -> Result<(), DomainError> {
        let order = self.get_order(order_id)?;
        if order.status == OrderStatus::Paid {
            return Err(DomainError::AlreadyPaid(order_id));
        }
        if !self.orders.delete(order_id)? {
            return Err(DomainError::OrderNotFound(order_id));
        }
        log::info!("Deleted order {order_id}");
        Ok(())
    }

    pub fn get_order(&self, order_id: Uuid) -> Result<Order, DomainError> {
        self.orders
            .load(order_id)?
            .map(|v| v.value)
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    pub fn get_user_orders(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        self.orders.list_by_user(user_id)
    }

    pub fn get_active_order(&self, user_id: Uuid) -> Result<Option<Order>, DomainError> {
        self.orders.find_active_by_user(user_id)
    }

    /// Administrators see every order, everyone else only their own.
    pub fn get_all_orders(&self, token: &str) -> Result<Vec<Order>, DomainError> {
        let identity = self.identity.resolve(token)?;
        match Visibility::for_identity(&identity) {
            Visibility::All => self.orders.list_all(),
            Visibility::OwnedBy(user_id) => self.orders.list_by_user(user_id),
        }
    }

    fn receipt(&self, order: &Order, language_code: &str) -> Result<Receipt, DomainError> {
        let ids: Vec<Uuid> = order.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = self
            .catalog
            .find_by_ids(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let items = order
            .items
            .iter()
            .map(|item| ReceiptItem {
                product_name: products
                    .get(&item.product_id)
                    .map(|p| p.display_name(language_code))
                    .unwrap_or(crate::domain::catalog::UNKNOWN_PRODUCT_NAME)
                    .to_string(),
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
                line_total: item.line_total(),
            })
            .collect();

        Ok(Receipt {
            order_id: order.id,
            table_number: order.table_number,
            confirmed_at: order.confirmed_at,
            total_price: order.total_price.clone(),
            items,
        })
    }
}

fn resolve_unique<'a>(products: &'a [Product], name: &str) -> Result<&'a Product, DomainError> {
    let mut matches = products.iter().filter(|p| p.has_name(name));
    match (matches.next(), matches.next()) {
        (Some(product), None) => Ok(product),
        (None, _) => Err(DomainError::ProductNotFound(name.to_string())),
        (Some(_), Some(_)) => {
            log::warn!("Product name '{name}' is ambiguous in the catalog");
            Err(DomainError::ProductNotFound(name.to_string()))
        }
    }
}
