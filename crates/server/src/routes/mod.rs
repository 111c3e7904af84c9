pub mod analyse;
pub mod health;
