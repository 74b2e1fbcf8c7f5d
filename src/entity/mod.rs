pub mod order_items;
pub mod order_payments;
pub mod orders;
pub mod payment_receipts;

pub use order_items::Entity as OrderItems;
pub use order_payments::Entity as OrderPayments;
pub use orders::Entity as Orders;
pub use payment_receipts::Entity as PaymentReceipts;
