//! Database Models
//!
//! Plain row structs decoded via `sqlx::FromRow`. Associations are explicit
//! foreign-key ids; each operation loads exactly the rows it needs.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartLine;
pub use order::{Order, OrderItem, OrderStatus};
pub use product::{Product, ProductCreate};
pub use user::User;
