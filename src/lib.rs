pub mod models;
pub mod slots;
pub mod calendar;
pub mod validity;
pub mod pricing;
pub mod manager_tariff_store;
pub mod manager_spot_prices;

pub use crate::pricing::{compute_prices, compute_prices_for_site, price_series, slot_name_at};
