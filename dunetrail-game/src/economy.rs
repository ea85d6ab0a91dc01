//! Resource weights, purchase pricing and weather-driven consumption.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::REPEAT_PURCHASE_FACTOR;
use crate::weather::Weather;

/// Consumable resources carried by the traveler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Water,
    Food,
}

impl Resource {
    /// Parse the code used by stage files (`water`, `food`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "water" => Some(Self::Water),
            "food" => Some(Self::Food),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Food => "food",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A food/water pair: amounts, unit weights, unit prices or unit costs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Supplies {
    #[serde(default)]
    pub food: i32,
    #[serde(default)]
    pub water: i32,
}

impl Supplies {
    #[must_use]
    pub const fn new(food: i32, water: i32) -> Self {
        Self { food, water }
    }

    #[must_use]
    pub const fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Food => self.food,
            Resource::Water => self.water,
        }
    }

    pub fn set(&mut self, resource: Resource, value: i32) {
        match resource {
            Resource::Food => self.food = value,
            Resource::Water => self.water = value,
        }
    }

    #[must_use]
    pub const fn scaled(self, factor: i32) -> Self {
        Self {
            food: self.food * factor,
            water: self.water * factor,
        }
    }

    /// Sum of `self[r] * per_unit[r]` over both resources, `None` on overflow.
    #[must_use]
    pub fn checked_dot(&self, per_unit: &Self) -> Option<i32> {
        self.food
            .checked_mul(per_unit.food)?
            .checked_add(self.water.checked_mul(per_unit.water)?)
    }
}

/// Base consumption per unit of intensity, one row per weather kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCosts {
    #[serde(default)]
    pub high_temp: Supplies,
    #[serde(default)]
    pub sunny: Supplies,
    #[serde(default)]
    pub sandstorm: Supplies,
}

impl WeatherCosts {
    #[must_use]
    pub const fn row(&self, weather: Weather) -> Supplies {
        match weather {
            Weather::HighTemp => self.high_temp,
            Weather::Sunny => self.sunny,
            Weather::Sandstorm => self.sandstorm,
        }
    }

    pub fn row_mut(&mut self, weather: Weather) -> &mut Supplies {
        match weather {
            Weather::HighTemp => &mut self.high_temp,
            Weather::Sunny => &mut self.sunny,
            Weather::Sandstorm => &mut self.sandstorm,
        }
    }
}

/// Outcome of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub amount: Supplies,
    pub cost: i32,
    pub weight: i32,
}

/// Fixed prices, weights and consumption table for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicModel {
    #[serde(default)]
    pub weight: Supplies,
    #[serde(default)]
    pub base_price: Supplies,
    #[serde(default)]
    pub base_cost: WeatherCosts,
}

impl EconomicModel {
    /// Supplies consumed by one day of `intensity` under `weather`.
    #[must_use]
    pub const fn consumption(&self, weather: Weather, intensity: i32) -> Supplies {
        self.base_cost.row(weather).scaled(intensity)
    }

    /// Combined carrying weight of `amount`, `None` if it does not fit an `i32`.
    #[must_use]
    pub fn weight_of(&self, amount: &Supplies) -> Option<i32> {
        amount.checked_dot(&self.weight)
    }

    /// Price of `amount`, doubled unless this is the first purchase of the run.
    #[must_use]
    pub fn purchase_cost(&self, amount: &Supplies, first_purchase: bool) -> Option<i32> {
        let cost = amount.checked_dot(&self.base_price)?;
        if first_purchase {
            Some(cost)
        } else {
            cost.checked_mul(REPEAT_PURCHASE_FACTOR)
        }
    }

    /// Cost and weight of `amount`; `None` when either overflows.
    #[must_use]
    pub fn quote(&self, amount: Supplies, first_purchase: bool) -> Option<Purchase> {
        Some(Purchase {
            amount,
            cost: self.purchase_cost(&amount, first_purchase)?,
            weight: self.weight_of(&amount)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> EconomicModel {
        EconomicModel {
            weight: Supplies::new(2, 3),
            base_price: Supplies::new(10, 5),
            base_cost: WeatherCosts {
                high_temp: Supplies::new(9, 9),
                sunny: Supplies::new(7, 5),
                sandstorm: Supplies::new(10, 10),
            },
        }
    }

    #[test]
    fn consumption_scales_weather_row() {
        let model = model();
        assert_eq!(model.consumption(Weather::Sunny, 2), Supplies::new(14, 10));
        assert_eq!(model.consumption(Weather::Sandstorm, 1), Supplies::new(10, 10));
        assert_eq!(model.consumption(Weather::HighTemp, 3), Supplies::new(27, 27));
    }

    #[test]
    fn repeat_purchases_cost_double() {
        let model = model();
        let amount = Supplies::new(3, 4);
        assert_eq!(model.purchase_cost(&amount, true), Some(50));
        assert_eq!(model.purchase_cost(&amount, false), Some(100));
        assert_eq!(model.weight_of(&amount), Some(18));

        let quote = model.quote(Supplies::new(1, 0), false).unwrap();
        assert_eq!(quote.cost, 20);
        assert_eq!(quote.weight, 2);
    }

    #[test]
    fn oversized_quotes_overflow_to_none() {
        let model = model();
        assert_eq!(model.quote(Supplies::new(300_000_000, 0), true), None);
        // Fits at base price, overflows once doubled.
        let amount = Supplies::new(200_000_000, 0);
        assert_eq!(model.purchase_cost(&amount, true), Some(2_000_000_000));
        assert_eq!(model.purchase_cost(&amount, false), None);
        assert_eq!(model.weight_of(&Supplies::new(0, i32::MAX)), None);
    }

    #[test]
    fn resource_codes_parse() {
        assert_eq!(Resource::from_code("food"), Some(Resource::Food));
        assert_eq!(Resource::from_code("water"), Some(Resource::Water));
        assert_eq!(Resource::from_code("gold"), None);

        let mut supplies = Supplies::default();
        supplies.set(Resource::Water, 4);
        assert_eq!(supplies.get(Resource::Water), 4);
        assert_eq!(supplies.get(Resource::Food), 0);
    }
}
