pub mod customer;
pub mod health;
pub mod order;
pub mod pattern;
pub mod product;
