//! Unit converter: factor tables per category plus temperature formulas.
//!
//! Factors are "units per base unit", so a value converts as
//! `value / from.factor * to.factor`. Temperature goes through Celsius.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConvertError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown unit {unit:?} for category {category}")]
    UnknownUnit { category: Category, unit: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Length,
    Weight,
    Temperature,
    Volume,
    Area,
    Speed,
}

/// A unit within a category. Temperature units have no factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Unit {
    pub key: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
}

const fn unit(key: &'static str, name: &'static str, factor: f64) -> Unit {
    Unit {
        key,
        name,
        factor: Some(factor),
    }
}

const LENGTH: &[Unit] = &[
    unit("meter", "Meter (m)", 1.0),
    unit("kilometer", "Kilometer (km)", 0.001),
    unit("centimeter", "Centimeter (cm)", 100.0),
    unit("millimeter", "Millimeter (mm)", 1000.0),
    unit("mile", "Mile (mi)", 0.000621371),
    unit("yard", "Yard (yd)", 1.09361),
    unit("foot", "Foot (ft)", 3.28084),
    unit("inch", "Inch (in)", 39.3701),
    unit("nautical_mile", "Nautical Mile", 0.000539957),
];

const WEIGHT: &[Unit] = &[
    unit("kilogram", "Kilogram (kg)", 1.0),
    unit("gram", "Gram (g)", 1000.0),
    unit("milligram", "Milligram (mg)", 1_000_000.0),
    unit("ton", "Metric Ton (t)", 0.001),
    unit("pound", "Pound (lb)", 2.20462),
    unit("ounce", "Ounce (oz)", 35.274),
    unit("stone", "Stone (st)", 0.157473),
];

const TEMPERATURE: &[Unit] = &[
    Unit {
        key: "celsius",
        name: "Celsius (°C)",
        factor: None,
    },
    Unit {
        key: "fahrenheit",
        name: "Fahrenheit (°F)",
        factor: None,
    },
    Unit {
        key: "kelvin",
        name: "Kelvin (K)",
        factor: None,
    },
];

const VOLUME: &[Unit] = &[
    unit("liter", "Liter (L)", 1.0),
    unit("milliliter", "Milliliter (mL)", 1000.0),
    unit("cubic_meter", "Cubic Meter (m³)", 0.001),
    unit("gallon", "Gallon (gal)", 0.264172),
    unit("quart", "Quart (qt)", 1.05669),
    unit("pint", "Pint (pt)", 2.11338),
    unit("cup", "Cup", 4.22675),
    unit("fluid_ounce", "Fluid Ounce (fl oz)", 33.814),
];

const AREA: &[Unit] = &[
    unit("square_meter", "Square Meter (m²)", 1.0),
    unit("square_kilometer", "Square Kilometer (km²)", 0.000001),
    unit("square_mile", "Square Mile (mi²)", 0.000000386102),
    unit("square_yard", "Square Yard (yd²)", 1.19599),
    unit("square_foot", "Square Foot (ft²)", 10.7639),
    unit("acre", "Acre", 0.000247105),
    unit("hectare", "Hectare (ha)", 0.0001),
];

const SPEED: &[Unit] = &[
    unit("mps", "Meter/Second (m/s)", 1.0),
    unit("kph", "Kilometer/Hour (km/h)", 3.6),
    unit("mph", "Mile/Hour (mph)", 2.23694),
    unit("knot", "Knot (kn)", 1.94384),
    unit("fps", "Foot/Second (ft/s)", 3.28084),
];

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Length,
        Category::Weight,
        Category::Temperature,
        Category::Volume,
        Category::Area,
        Category::Speed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Length => "Length",
            Category::Weight => "Weight",
            Category::Temperature => "Temperature",
            Category::Volume => "Volume",
            Category::Area => "Area",
            Category::Speed => "Speed",
        }
    }

    /// Units in display order. The first two are the default from/to pair.
    pub fn units(&self) -> &'static [Unit] {
        match self {
            Category::Length => LENGTH,
            Category::Weight => WEIGHT,
            Category::Temperature => TEMPERATURE,
            Category::Volume => VOLUME,
            Category::Area => AREA,
            Category::Speed => SPEED,
        }
    }

    pub fn unit(&self, key: &str) -> Result<&'static Unit, ConvertError> {
        self.units()
            .iter()
            .find(|u| u.key == key)
            .ok_or_else(|| ConvertError::UnknownUnit {
                category: *self,
                unit: key.to_string(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_ascii_lowercase())
    }
}

impl FromStr for Category {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConvertError::UnknownCategory(s.to_string()))
    }
}

fn to_celsius(value: f64, unit: &str) -> f64 {
    match unit {
        "fahrenheit" => (value - 32.0) * 5.0 / 9.0,
        "kelvin" => value - 273.15,
        _ => value,
    }
}

fn from_celsius(celsius: f64, unit: &str) -> f64 {
    match unit {
        "fahrenheit" => celsius * 9.0 / 5.0 + 32.0,
        "kelvin" => celsius + 273.15,
        _ => celsius,
    }
}

/// Convert `value` from one unit to another within a category.
pub fn convert(category: Category, value: f64, from: &str, to: &str) -> Result<f64, ConvertError> {
    let from = category.unit(from)?;
    let to = category.unit(to)?;

    match (from.factor, to.factor) {
        (Some(from_factor), Some(to_factor)) => Ok(value / from_factor * to_factor),
        _ => Ok(from_celsius(to_celsius(value, from.key), to.key)),
    }
}

/// Fixed-point rendering with trailing zeros (and a bare point) removed.
pub fn format_trimmed(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `value` expressed in another unit of the same category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickConversion {
    pub unit: &'static str,
    pub name: &'static str,
    pub value: f64,
    pub display: String,
}

/// Everything the converter screen shows for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub value: f64,
    /// Output field (6 decimals, trimmed).
    pub display: String,
    /// Summary line, e.g. "1 Meter (m) = 3.2808 Foot (ft)".
    pub summary: String,
    pub quick: Vec<QuickConversion>,
}

/// Convert into every other unit of the category.
pub fn quick_conversions(
    category: Category,
    value: f64,
    from: &str,
) -> Result<Vec<QuickConversion>, ConvertError> {
    category
        .units()
        .iter()
        .filter(|u| u.key != from)
        .map(|u| {
            let converted = convert(category, value, from, u.key)?;
            Ok(QuickConversion {
                unit: u.key,
                name: u.name,
                value: converted,
                display: format_trimmed(converted, 4),
            })
        })
        .collect()
}

/// Full conversion as displayed by the converter.
pub fn convert_display(
    category: Category,
    value: f64,
    from: &str,
    to: &str,
) -> Result<Conversion, ConvertError> {
    let result = convert(category, value, from, to)?;
    let from_unit = category.unit(from)?;
    let to_unit = category.unit(to)?;

    Ok(Conversion {
        value: result,
        display: format_trimmed(result, 6),
        summary: format!(
            "{} {} = {} {}",
            format_trimmed(value, 4),
            from_unit.name,
            format_trimmed(result, 4),
            to_unit.name
        ),
        quick: quick_conversions(category, value, from)?,
    })
}
