use std::f64::consts::PI;

use chrono::FixedOffset;
use rand::Rng;

use super::{round1, round_half_up};
use crate::{
    clock::{CalendarPoint, ResolvedTime},
    model::{GeoPoint, WeatherCondition, WeatherReading},
};

const fn condition(text: &'static str, code: u16) -> WeatherCondition {
    WeatherCondition { text, code }
}

/// Ordered from fair to foul; index ranges below depend on this order.
pub const CONDITIONS: [WeatherCondition; 12] = [
    condition("Sunny", 1000),
    condition("Partly cloudy", 1003),
    condition("Cloudy", 1006),
    condition("Overcast", 1009),
    condition("Mist", 1030),
    condition("Light rain", 1183),
    condition("Moderate rain", 1189),
    condition("Heavy rain", 1195),
    condition("Thunderstorm", 1276),
    condition("Light snow", 1210),
    condition("Moderate snow", 1213),
    condition("Heavy snow", 1216),
];

const CLEAR: (usize, usize) = (0, 2);
const CLOUDY: (usize, usize) = (2, 3);
const RAIN: (usize, usize) = (5, 4);
const SNOW: (usize, usize) = (9, 3);

/// Conditions at or past this index count as precipitation.
const PRECIPITATION_START: usize = 5;

/// Warmer toward the equator; longitude adds a little visual variety.
pub fn latitude_effect(point: GeoPoint) -> f64 {
    let lat_effect = 30.0 * (1.0 - point.latitude.abs() / 90.0);
    let lon_effect = (point.longitude / 180.0 * PI).sin() * 5.0;
    lat_effect + lon_effect
}

/// Seasons are mirrored six months apart; the equator counts as southern.
pub fn seasonal_offset(latitude: f64, month0: u32) -> f64 {
    let month = f64::from(month0);
    if latitude > 0.0 {
        (month / 12.0 * 2.0 * PI).sin() * 15.0
    } else {
        ((month + 6.0) / 12.0 * 2.0 * PI).sin() * 15.0
    }
}

pub fn time_of_day_effect(hour: u32) -> f64 {
    ((f64::from(hour) - 6.0) / 24.0 * 2.0 * PI).sin() * 8.0
}

pub fn historical_variation(hours_ago: f64) -> f64 {
    (hours_ago / 24.0 * PI).sin() * 5.0
}

pub fn is_daytime(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

/// Picks a row of [`CONDITIONS`] from a main roll and a uniform sub-roll,
/// both in `[0, 1)`.
pub fn condition_index(temperature: f64, hour: u32, roll: f64, sub_roll: f64) -> usize {
    let (start, len) = if temperature < 2.0 && roll > 0.6 {
        SNOW
    } else if is_daytime(hour) && roll < 0.4 {
        CLEAR
    } else if roll < 0.7 {
        CLOUDY
    } else {
        RAIN
    };
    start + ((sub_roll * len as f64) as usize).min(len - 1)
}

pub fn simulate_weather<R: Rng + ?Sized>(
    rng: &mut R,
    point: GeoPoint,
    time: &ResolvedTime,
    offset: FixedOffset,
) -> WeatherReading {
    let calendar = CalendarPoint::of(time.at, offset);
    let seasonal = seasonal_offset(point.latitude, calendar.month0);

    let mut temperature =
        round1(latitude_effect(point) + seasonal + time_of_day_effect(calendar.hour));
    if let Some(hours_ago) = time.hours_ago.filter(|hours| *hours > 0.0) {
        temperature = round1(temperature + historical_variation(hours_ago));
    }

    let roll: f64 = rng.gen();
    let sub_roll: f64 = rng.gen();
    let index = condition_index(temperature, calendar.hour, roll, sub_roll);

    let humidity_bonus = if index >= PRECIPITATION_START { 30.0 } else { 0.0 };
    let humidity = round_half_up(40.0 + rng.gen::<f64>() * 30.0 + humidity_bonus).min(95.0);

    let wind = round1(5.0 + rng.gen::<f64>() * 15.0 + seasonal.abs() / 5.0);

    WeatherReading {
        temperature_celsius: temperature,
        humidity_percent: humidity as u8,
        wind_speed_kph: wind,
        condition: CONDITIONS[index],
    }
}
