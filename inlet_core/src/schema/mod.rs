pub mod defaults;
pub mod models;
pub mod registry;
pub mod sqlite;
pub mod store;
