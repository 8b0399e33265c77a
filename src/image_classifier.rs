pub mod impl_candle;
pub mod impl_fake;
pub mod inference;
pub mod interface;
pub mod models;
