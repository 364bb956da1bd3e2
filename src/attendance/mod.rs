pub mod aggregator;
pub mod display;
pub mod period;
