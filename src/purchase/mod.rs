pub mod catalog;
pub mod coordinator;
pub mod customers;
pub mod duration;
pub mod receipt;
pub mod sweep;
pub mod vouchers;

pub use coordinator::{CheckoutOutcome, ManualSaleRequest, PaymentCoordinator, PurchaseRequest};
