pub mod address;
pub mod admin_user;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;

pub use address::Entity as Address;
pub use admin_user::Entity as AdminUser;
pub use customer::Entity as Customer;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use product_variant::Entity as ProductVariant;
