use rand::Rng;

use crate::errors::{Error, Result};

const TEMP_MIN: f64 = -50.0;
const TEMP_MAX: f64 = 100.0;
const HUMIDITY_MIN: f64 = 0.0;
const HUMIDITY_MAX: f64 = 100.0;

/// One sample from the environmental sensor. Humidity is absent on
/// temperature-only hardware variants.
#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: Option<f64>,
}

pub trait SensorSource: Send {
    fn read(&mut self) -> Result<Reading>;
}

/// Rejects readings outside the sensor's rated range. A disconnected
/// probe reads as NaN, which is rejected the same way.
pub fn validate(reading: &Reading) -> Result<()> {
    if !reading.temperature.is_finite() {
        return Err(Error::Validation("temperature is not a number".to_string()));
    }
    if reading.temperature < TEMP_MIN || reading.temperature > TEMP_MAX {
        return Err(Error::Validation(format!(
            "temperature {} out of range [{}, {}]",
            reading.temperature, TEMP_MIN, TEMP_MAX
        )));
    }

    if let Some(humidity) = reading.humidity {
        if !humidity.is_finite() {
            return Err(Error::Validation("humidity is not a number".to_string()));
        }
        if humidity < HUMIDITY_MIN || humidity > HUMIDITY_MAX {
            return Err(Error::Validation(format!(
                "humidity {} out of range [{}, {}]",
                humidity, HUMIDITY_MIN, HUMIDITY_MAX
            )));
        }
    }

    Ok(())
}

/// Stand-in for the I2C sensor driver: plausible indoor readings.
pub struct SimulatedSensor {
    has_humidity: bool,
}

impl SimulatedSensor {
    pub fn new(has_humidity: bool) -> Self {
        Self { has_humidity }
    }
}

impl SensorSource for SimulatedSensor {
    fn read(&mut self) -> Result<Reading> {
        let mut rng = rand::thread_rng();
        Ok(Reading {
            temperature: rng.gen_range(15.0..35.0),
            humidity: if self.has_humidity {
                Some(rng.gen_range(30.0..80.0))
            } else {
                None
            },
        })
    }
}
