//! Defines the six weather stations of the Chocó Andino study area and their
//! metadata (directory label and map location).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use enso_andino::LatLon;
///
/// let quito = LatLon(-0.1807, -78.4678);
/// assert_eq!(quito.0, -0.1807); // Latitude
/// assert_eq!(quito.1, -78.4678); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

/// One of the six monitored stations, numbered 1 through 6.
///
/// The number doubles as the key of the station's data directory
/// (`data/Estacion N/`) and as the join key when tables of several stations are
/// combined.
///
/// # Examples
///
/// ```
/// use enso_andino::Station;
///
/// let station = Station::new(3).unwrap();
/// assert_eq!(station.label(), "Estacion 3");
/// assert!(Station::new(7).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Station(u8);

impl Station {
    /// Number of stations in the study area.
    pub const COUNT: u8 = 6;

    /// Returns the station with the given number, or `None` outside `1..=6`.
    pub fn new(number: u8) -> Option<Station> {
        (1..=Self::COUNT).contains(&number).then_some(Station(number))
    }

    /// All stations, in ascending order.
    pub fn all() -> Vec<Station> {
        (1..=Self::COUNT).map(Station).collect()
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Label used both for the data directory and for the `Estación` column.
    pub fn label(self) -> String {
        format!("Estacion {}", self.0)
    }

    /// Location of the station gauge.
    pub fn location(self) -> LatLon {
        // (longitude, latitude) as surveyed
        let (lon, lat) = match self.0 {
            1 => (-78.4869, 1.1538),
            2 => (-78.8486, 1.1657),
            3 => (-78.9639, 0.7483),
            4 => (-79.8566, 0.5698),
            5 => (-79.1721, 0.3316),
            _ => (-79.2675, 0.1138),
        };
        LatLon(lat, lon)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Estacion {}", self.0)
    }
}

impl FromStr for Station {
    type Err = String;

    /// Accepts `"3"`, `"Estacion 3"` and `"Estación 3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s
            .trim()
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| format!("Invalid station '{}'", s))?;
        Station::new(number).ok_or_else(|| format!("Station number out of range: {}", number))
    }
}

impl TryFrom<u8> for Station {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Station::new(value).ok_or_else(|| format!("Station number out of range: {}", value))
    }
}

impl From<Station> for u8 {
    fn from(station: Station) -> u8 {
        station.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_stations_are_numbered_one_to_six() {
        let numbers: Vec<u8> = Station::all().into_iter().map(Station::number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_station_labels() {
        assert_eq!("Estacion 2".parse::<Station>(), Ok(Station(2)));
        assert_eq!("Estación 5".parse::<Station>(), Ok(Station(5)));
        assert_eq!("6".parse::<Station>(), Ok(Station(6)));
        assert!("Estacion 9".parse::<Station>().is_err());
        assert!("somewhere".parse::<Station>().is_err());
    }

    #[test]
    fn test_locations_lie_in_study_area() {
        for station in Station::all() {
            let LatLon(lat, lon) = station.location();
            assert!((0.0..1.5).contains(&lat), "latitude {} for {}", lat, station);
            assert!((-80.0..-78.0).contains(&lon), "longitude {} for {}", lon, station);
        }
    }
}
