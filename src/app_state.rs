use sqlx::{Pool, Sqlite};
use std::sync::Arc;

use crate::{checkout::CheckoutProvider, config::Config, purchase::PaymentCoordinator};

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Sqlite>,
    pub config: Arc<Config>,
    pub checkout: Arc<dyn CheckoutProvider>,
}

impl AppState {
    pub fn coordinator(&self) -> PaymentCoordinator {
        PaymentCoordinator::new(self.pool.clone(), self.checkout.clone())
    }
}
