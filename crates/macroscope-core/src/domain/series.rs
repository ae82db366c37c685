use serde::Serialize;

use crate::domain::{DateRange, ObservationDate};
use crate::ValidationError;

/// One normalized `(date, value)` data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: ObservationDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: ObservationDate, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }
        Ok(Self { date, value })
    }
}

/// Named, ordered series of observations.
///
/// Invariants held from construction on: the name is non-empty, every value
/// is finite, and dates are strictly increasing (no duplicates). A series is
/// immutable once built; it feeds charting (x = date, y = value) and the
/// tabular view directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    name: String,
    observations: Vec<Observation>,
}

impl Series {
    pub fn new(
        name: impl Into<String>,
        observations: Vec<Observation>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptySeriesName);
        }

        let mut previous: Option<ObservationDate> = None;
        for observation in &observations {
            if !observation.value.is_finite() {
                return Err(ValidationError::NonFiniteValue { field: "value" });
            }
            if let Some(previous) = previous {
                if observation.date <= previous {
                    return Err(ValidationError::OutOfOrderObservation {
                        date: observation.date,
                    });
                }
            }
            previous = Some(observation.date);
        }

        Ok(Self { name, observations })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Calendar span actually covered by the data, `None` when empty.
    pub fn span(&self) -> Option<DateRange> {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => DateRange::new(first.date, last.date).ok(),
            _ => None,
        }
    }
}
