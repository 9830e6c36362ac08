pub mod addresses;
pub mod customers;
pub mod orders;
pub mod payments;
pub mod stock;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::AuthService, events::EventSender, gateway::RazorpayGateway};

/// Aggregated services shared with HTTP handlers through application state.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub orders: Arc<orders::OrderService>,
    pub payments: Arc<payments::PaymentService>,
    pub addresses: Arc<addresses::AddressService>,
    pub customers: Arc<customers::CustomerService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        auth: Arc<AuthService>,
        gateway: Arc<RazorpayGateway>,
    ) -> Self {
        Self {
            auth: auth.clone(),
            orders: Arc::new(orders::OrderService::new(db.clone(), event_sender.clone())),
            payments: Arc::new(payments::PaymentService::new(
                db.clone(),
                gateway,
                event_sender,
            )),
            addresses: Arc::new(addresses::AddressService::new(db.clone())),
            customers: Arc::new(customers::CustomerService::new(db, auth)),
        }
    }
}
