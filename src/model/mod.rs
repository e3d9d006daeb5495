pub mod bar;
pub mod orderbook;
pub mod tick;
