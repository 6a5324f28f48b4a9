//! Physical quantity presets.
//!
//! Each quantity maps short unit keys (`mV`, `kohm`, ...) to the column
//! name/unit pair used when reading files and labelling axes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::types::ColumnSpec;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quantity {
    Voltage,
    Current,
    Temperature,
    Frequency,
    MagneticField,
    Resistance,
    Resistivity,
}

impl Quantity {
    pub const ALL: [Quantity; 7] = [
        Quantity::Voltage,
        Quantity::Current,
        Quantity::Temperature,
        Quantity::Frequency,
        Quantity::MagneticField,
        Quantity::Resistance,
        Quantity::Resistivity,
    ];

    /// Axis name of the quantity.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Voltage => "Voltage",
            Quantity::Current => "Current",
            Quantity::Temperature => "Temperature",
            Quantity::Frequency => "Frequency",
            Quantity::MagneticField => "Magnetic field",
            Quantity::Resistance => "Resistance",
            Quantity::Resistivity => "Resistivity",
        }
    }

    /// `(key, displayed unit)` pairs.
    pub fn units(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Quantity::Voltage => &[("V", "V"), ("mV", "mV"), ("uV", "µV"), ("nV", "nV")],
            Quantity::Current => &[("A", "A"), ("mA", "mA"), ("uA", "µA"), ("nA", "nA")],
            Quantity::Temperature => &[("K", "K"), ("mK", "mK")],
            Quantity::Frequency => &[
                ("Hz", "Hz"),
                ("kHz", "kHz"),
                ("MHz", "MHz"),
                ("GHz", "GHz"),
                ("THz", "THz"),
            ],
            Quantity::MagneticField => &[("T", "T"), ("mT", "mT")],
            Quantity::Resistance => &[("mohm", "mΩ"), ("ohm", "Ω"), ("kohm", "kΩ"), ("Mohm", "MΩ")],
            Quantity::Resistivity => &[
                ("mohmm", "mΩ·m"),
                ("ohmm", "Ω·m"),
                ("kohmm", "kΩ·m"),
                ("Mohmm", "MΩ·m"),
            ],
        }
    }

    /// Column spec for the unit `key`.
    pub fn spec(self, key: &str) -> Result<ColumnSpec> {
        self.units()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, unit)| ColumnSpec::new(self.name(), *unit))
            .ok_or_else(|| {
                let known: Vec<&str> = self.units().iter().map(|(k, _)| *k).collect();
                Error::invalid(format!(
                    "unknown {} unit `{key}` (expected one of {})",
                    self.name().to_lowercase(),
                    known.join(", ")
                ))
            })
    }

    /// Resolve `quantity:key`, e.g. `voltage:mV` or `magnetic-field:T`.
    pub fn preset(text: &str) -> Result<ColumnSpec> {
        let (quantity, key) = text
            .split_once(':')
            .ok_or_else(|| Error::invalid(format!("preset `{text}` must look like quantity:unit")))?;
        quantity.parse::<Quantity>()?.spec(key.trim())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        Quantity::ALL
            .into_iter()
            .find(|q| q.name().to_lowercase().replace(' ', "-") == wanted)
            .ok_or_else(|| Error::invalid(format!("unknown quantity `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve_units() {
        assert_eq!(Quantity::Voltage.spec("uV").unwrap(), ColumnSpec::new("Voltage", "µV"));
        assert_eq!(
            Quantity::preset("magnetic-field:mT").unwrap(),
            ColumnSpec::new("Magnetic field", "mT")
        );
        assert_eq!(Quantity::preset("Resistance:kohm").unwrap().unit, "kΩ");
        assert_eq!(Quantity::preset("temperature:mK").unwrap().unit, "mK");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Quantity::Current.spec("kA").unwrap_err();
        assert!(err.to_string().contains("mA"));
        assert!(Quantity::preset("pressure:Pa").is_err());
        assert!(Quantity::preset("voltage").is_err());
    }

    #[test]
    fn every_quantity_parses_from_its_name() {
        for q in Quantity::ALL {
            assert_eq!(q.name().parse::<Quantity>().unwrap(), q);
        }
    }
}
