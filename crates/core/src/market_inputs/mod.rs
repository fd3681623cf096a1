//! Market inputs consumed by snapshot generation.

mod market_inputs_model;
mod market_inputs_traits;

pub use market_inputs_model::*;
pub use market_inputs_traits::{MarketInputProviderTrait, MarketInputRepositoryTrait};
