//! Monte Carlo estimate of the supplies needed between nodes.
//!
//! Each round draws a fresh forecast, then walks a provision-free traveler
//! from every node to every village, mine and end node. The supplies it
//! burns on the way are averaged per route. Travelers set out on the first
//! day the stage's accounting mode can price.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::constants::{ESTIMATE_DEFAULT_HORIZON_DAYS, ESTIMATE_DEFAULT_ITERATIONS};
use crate::stage::Stage;
use crate::traveler::{TravelError, Traveler, TravelerSetup};
use crate::weather::{WeatherError, WeatherOdds, WeatherTimeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateConfig {
    pub iterations: usize,
    /// Length of each random forecast.
    pub horizon_days: u32,
    pub odds: WeatherOdds,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            iterations: ESTIMATE_DEFAULT_ITERATIONS,
            horizon_days: ESTIMATE_DEFAULT_HORIZON_DAYS,
            odds: WeatherOdds::default(),
        }
    }
}

/// Averaged consumption for one origin/destination pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEstimate {
    pub origin: String,
    pub destination: String,
    /// Samples that reached the destination within the forecast.
    pub samples: usize,
    /// Samples abandoned because the forecast ran out.
    pub exhausted: usize,
    pub mean_food: f64,
    pub mean_water: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionReport {
    pub config: EstimateConfig,
    pub routes: Vec<RouteEstimate>,
}

#[derive(Debug, Default)]
struct Tally {
    samples: usize,
    exhausted: usize,
    food: i64,
    water: i64,
}

impl Tally {
    #[allow(clippy::cast_precision_loss)]
    fn mean(total: i64, samples: usize) -> f64 {
        if samples == 0 {
            0.0
        } else {
            total as f64 / samples as f64
        }
    }
}

/// Run the estimate against `stage`, ignoring its own forecast.
///
/// # Errors
///
/// Returns [`TravelError::Forecast`] when the odds are all zero. Routes that
/// run past the end of a sampled forecast are counted as exhausted, not
/// reported as errors; any other travel failure is returned.
pub fn estimate_consumption<R: Rng + ?Sized>(
    stage: &Stage,
    config: &EstimateConfig,
    rng: &mut R,
) -> Result<ConsumptionReport, TravelError> {
    let origins: Vec<String> = stage.graph().nodes().map(|node| node.id.clone()).collect();
    let destinations: Vec<String> = stage
        .graph()
        .nodes()
        .filter(|node| node.kind.is_destination())
        .map(|node| node.id.clone())
        .collect();
    let departure = stage.accounting().first_day();
    let mut tallies: BTreeMap<(String, String), Tally> = BTreeMap::new();

    for round in 0..config.iterations {
        let forecast = WeatherTimeline::random(&config.odds, config.horizon_days, rng)?;
        let sampled = Rc::new(stage.clone().with_weather(forecast));
        log::trace!("estimate round {round}");
        for origin in &origins {
            let setup = TravelerSetup {
                date: departure,
                position: Some(origin.clone()),
                ..TravelerSetup::default()
            };
            let start = Traveler::with_setup(Rc::clone(&sampled), &setup)?;
            for destination in &destinations {
                let tally = tallies
                    .entry((origin.clone(), destination.clone()))
                    .or_default();
                let mut traveler = start.clone();
                match traveler.move_to(destination) {
                    Ok(()) => {
                        tally.samples += 1;
                        tally.food -= i64::from(traveler.food());
                        tally.water -= i64::from(traveler.water());
                    }
                    Err(TravelError::Forecast(WeatherError::OutOfRange { .. })) => {
                        tally.exhausted += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
        }
    }

    let routes = tallies
        .into_iter()
        .map(|((origin, destination), tally)| RouteEstimate {
            origin,
            destination,
            samples: tally.samples,
            exhausted: tally.exhausted,
            mean_food: Tally::mean(tally.food, tally.samples),
            mean_water: Tally::mean(tally.water, tally.samples),
        })
        .collect();
    Ok(ConsumptionReport {
        config: *config,
        routes,
    })
}

impl ConsumptionReport {
    #[must_use]
    pub fn route(&self, origin: &str, destination: &str) -> Option<&RouteEstimate> {
        self.routes
            .iter()
            .find(|route| route.origin == origin && route.destination == destination)
    }
}

impl fmt::Display for ConsumptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Expected consumption over {} rounds of {} days",
            self.config.iterations, self.config.horizon_days
        )?;
        let mut origin = None;
        for route in &self.routes {
            if origin != Some(route.origin.as_str()) {
                writeln!(f, "{}", route.origin)?;
                origin = Some(route.origin.as_str());
            }
            write!(
                f,
                "\t{}: food {:.2} / water {:.2}",
                route.destination, route.mean_food, route.mean_water
            )?;
            if route.exhausted > 0 {
                write!(f, " ({} exhausted)", route.exhausted)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_stage;
    use crate::stage::AccountingMode;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const STAGE: &str = "\
- day count
8
- load
50
- base cost
sun:food:1
sun:water:2
high:food:1
high:water:2
sand:food:1
sand:water:2
- special node
s:s
e:e
v:v
- adjacent relation
s:v
v:e
- path weight
v,e:3
";

    #[test]
    fn calm_forecasts_give_exact_means() {
        let stage = parse_stage(STAGE).unwrap();
        let config = EstimateConfig {
            iterations: 5,
            horizon_days: 8,
            odds: WeatherOdds::new(1, 0, 0),
        };
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let report = estimate_consumption(&stage, &config, &mut rng).unwrap();

        let hop = report.route("s", "v").unwrap();
        assert_eq!(hop.samples, 5);
        assert_eq!(hop.exhausted, 0);
        assert!((hop.mean_food - 2.0).abs() < f64::EPSILON);
        assert!((hop.mean_water - 4.0).abs() < f64::EPSILON);

        let long = report.route("v", "e").unwrap();
        assert!((long.mean_food - 6.0).abs() < f64::EPSILON);
        assert!(report.route("s", "s").is_none());
        // Three origins times two destinations.
        assert_eq!(report.routes.len(), 6);
    }

    #[test]
    fn storms_exhaust_short_forecasts() {
        let stage = parse_stage(STAGE).unwrap();
        let config = EstimateConfig {
            iterations: 3,
            horizon_days: 2,
            odds: WeatherOdds::new(0, 0, 1),
        };
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let report = estimate_consumption(&stage, &config, &mut rng).unwrap();
        let route = report.route("s", "e").unwrap();
        assert_eq!(route.samples, 0);
        assert_eq!(route.exhausted, 3);
        assert!(route.mean_food.abs() < f64::EPSILON);
        assert!(report.to_string().contains("(3 exhausted)"));
    }

    #[test]
    fn inverse_accounting_departs_on_the_first_priced_day() {
        let stage = parse_stage(STAGE)
            .unwrap()
            .with_accounting(AccountingMode::Inverse);
        let config = EstimateConfig {
            iterations: 4,
            horizon_days: 8,
            odds: WeatherOdds::new(1, 0, 0),
        };
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let report = estimate_consumption(&stage, &config, &mut rng).unwrap();
        for route in &report.routes {
            assert_eq!(route.exhausted, 0, "{} -> {}", route.origin, route.destination);
            assert_eq!(route.samples, 4);
        }
        let long = report.route("v", "e").unwrap();
        assert!((long.mean_food - 6.0).abs() < f64::EPSILON);
        assert!((long.mean_water - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_odds_are_an_error() {
        let stage = parse_stage(STAGE).unwrap();
        let config = EstimateConfig {
            odds: WeatherOdds::new(0, 0, 0),
            ..EstimateConfig::default()
        };
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(estimate_consumption(&stage, &config, &mut rng).is_err());
    }
}
