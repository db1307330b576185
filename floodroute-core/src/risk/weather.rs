//! Rainfall as a flood risk multiplier

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Weather as reported by an upstream service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub precipitation_mm: Option<f64>,
    pub rain_mm: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherObservation {
    pub fn new(precipitation_mm: f64, rain_mm: f64) -> Self {
        Self {
            precipitation_mm: Some(precipitation_mm),
            rain_mm: Some(rain_mm),
            observed_at: None,
        }
    }

    #[must_use]
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }
}

/// Why the neutral weather assumption was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutralReason {
    /// No observation was supplied
    Missing,
    /// Values were negative, non-finite or absent
    Invalid,
    /// Older than the configured maximum age
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum WeatherSource {
    Observed,
    Neutral(NeutralReason),
}

/// Effect of the weather on a flood assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherImpact {
    pub rainfall_mm: f64,
    pub multiplier: f64,
    pub source: WeatherSource,
}

impl WeatherImpact {
    pub fn neutral(reason: NeutralReason) -> Self {
        Self {
            rainfall_mm: 0.0,
            multiplier: 1.0,
            source: WeatherSource::Neutral(reason),
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self.source, WeatherSource::Neutral(_))
    }
}

/// Rainfall bands and their risk multipliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherPolicy {
    /// Upper bounds (exclusive) of the light, moderate and heavy bands
    pub light_below_mm: f64,
    pub moderate_below_mm: f64,
    pub heavy_below_mm: f64,
    /// Multipliers for the dry/light, moderate, heavy and extreme bands
    pub multipliers: [f64; 4],
    /// Observations older than this are ignored
    pub max_age_minutes: Option<i64>,
}

impl Default for WeatherPolicy {
    fn default() -> Self {
        Self {
            light_below_mm: 2.5,
            moderate_below_mm: 10.0,
            heavy_below_mm: 20.0,
            multipliers: [1.0, 1.2, 1.5, 2.0],
            max_age_minutes: Some(180),
        }
    }
}

impl WeatherPolicy {
    /// Impact of an observation. Unusable observations give the neutral
    /// impact, never an error. Staleness is only judged when both `now` and
    /// the observation time are known.
    pub fn assess(
        &self,
        observation: Option<&WeatherObservation>,
        now: Option<DateTime<Utc>>,
    ) -> WeatherImpact {
        let Some(observation) = observation else {
            return WeatherImpact::neutral(NeutralReason::Missing);
        };

        let max_age = self.max_age_minutes.and_then(Duration::try_minutes);
        if let (Some(max_age), Some(observed_at), Some(now)) =
            (max_age, observation.observed_at, now)
            && now.signed_duration_since(observed_at) > max_age
        {
            debug!("Ignoring weather observed at {observed_at}, older than {max_age}");
            return WeatherImpact::neutral(NeutralReason::Stale);
        }

        let valid = |v: &f64| v.is_finite() && *v >= 0.0;
        let values = [observation.precipitation_mm, observation.rain_mm];
        if values.iter().flatten().any(|v| !valid(v)) {
            return WeatherImpact::neutral(NeutralReason::Invalid);
        }
        let Some(rainfall_mm) = values.into_iter().flatten().reduce(f64::max) else {
            return WeatherImpact::neutral(NeutralReason::Invalid);
        };

        WeatherImpact {
            rainfall_mm,
            multiplier: self.multiplier(rainfall_mm),
            source: WeatherSource::Observed,
        }
    }

    pub fn multiplier(&self, rainfall_mm: f64) -> f64 {
        let [dry, moderate, heavy, extreme] = self.multipliers;
        if rainfall_mm < self.light_below_mm {
            dry
        } else if rainfall_mm < self.moderate_below_mm {
            moderate
        } else if rainfall_mm < self.heavy_below_mm {
            heavy
        } else {
            extreme
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        let bands = [self.light_below_mm, self.moderate_below_mm, self.heavy_below_mm];
        if bands.iter().any(|b| !b.is_finite() || *b < 0.0)
            || !bands.windows(2).all(|w| w[0] <= w[1])
        {
            return Err(Error::InvalidConfig(
                "risk.weather rainfall bands must be non-negative and ascending".to_string(),
            ));
        }
        if self.multipliers.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(Error::InvalidConfig(
                "risk.weather multipliers must be non-negative".to_string(),
            ));
        }
        if self.max_age_minutes.is_some_and(|m| m <= 0) {
            return Err(Error::InvalidConfig(
                "risk.weather.max_age_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap()
    }

    fn now() -> Option<DateTime<Utc>> {
        Some(at())
    }

    #[test]
    fn rainfall_bands() {
        let policy = WeatherPolicy::default();
        let cases = [
            (0.0, 1.0),
            (2.4, 1.0),
            (2.5, 1.2),
            (9.9, 1.2),
            (10.0, 1.5),
            (19.9, 1.5),
            (20.0, 2.0),
            (80.0, 2.0),
        ];
        for (rain, expected) in cases {
            assert!(
                (policy.multiplier(rain) - expected).abs() < f64::EPSILON,
                "{rain} mm"
            );
        }
    }

    #[test]
    fn rainfall_is_the_larger_reading() {
        let policy = WeatherPolicy::default();
        let impact = policy.assess(Some(&WeatherObservation::new(3.0, 12.0)), now());
        assert_eq!(impact.source, WeatherSource::Observed);
        assert!((impact.rainfall_mm - 12.0).abs() < f64::EPSILON);
        assert!((impact.multiplier - 1.5).abs() < f64::EPSILON);

        let only_rain = WeatherObservation {
            rain_mm: Some(25.0),
            ..WeatherObservation::default()
        };
        assert!((policy.assess(Some(&only_rain), now()).multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unusable_weather_is_neutral() {
        let policy = WeatherPolicy::default();
        assert_eq!(
            policy.assess(None, now()).source,
            WeatherSource::Neutral(NeutralReason::Missing)
        );
        assert_eq!(
            policy
                .assess(Some(&WeatherObservation::new(f64::NAN, 1.0)), now())
                .source,
            WeatherSource::Neutral(NeutralReason::Invalid)
        );
        assert_eq!(
            policy
                .assess(Some(&WeatherObservation::new(-1.0, 1.0)), now())
                .source,
            WeatherSource::Neutral(NeutralReason::Invalid)
        );
        assert_eq!(
            policy
                .assess(Some(&WeatherObservation::default()), now())
                .source,
            WeatherSource::Neutral(NeutralReason::Invalid)
        );

        let stale = WeatherObservation::new(30.0, 30.0).observed_at(at() - Duration::hours(6));
        let impact = policy.assess(Some(&stale), now());
        assert_eq!(impact.source, WeatherSource::Neutral(NeutralReason::Stale));
        assert!((impact.multiplier - 1.0).abs() < f64::EPSILON);

        let fresh = WeatherObservation::new(30.0, 30.0).observed_at(at() - Duration::minutes(10));
        assert_eq!(policy.assess(Some(&fresh), now()).source, WeatherSource::Observed);
        // Without a reference time the observation is taken as current
        assert_eq!(policy.assess(Some(&stale), None).source, WeatherSource::Observed);
    }
}
