use serde::Deserialize;
use crate::models::SpotPrice;

/// Layout of a spot price file, either a bare list or a list under `prices`
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum SpotPriceDocument {
    List(Vec<SpotPrice>),
    Wrapped { prices: Vec<SpotPrice> },
}

impl SpotPriceDocument {
    pub fn into_prices(self) -> Vec<SpotPrice> {
        match self {
            SpotPriceDocument::List(prices) => prices,
            SpotPriceDocument::Wrapped { prices } => prices,
        }
    }
}
