use foundation::math::LatLng;
use serde::{Deserialize, Serialize};

/// One entry of the bundled country dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryRecord {
    pub name: String,
    pub population: u64,
    /// `[latitude, longitude]` in degrees. Some territories have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlng: Option<[f64; 2]>,
}

impl CountryRecord {
    /// Usable coordinates, if present and finite.
    pub fn lat_lng(&self) -> Option<LatLng> {
        let [lat, lng] = self.latlng?;
        LatLng::try_new(lat, lng)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    Parse(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Parse(msg) => write!(f, "invalid country dataset: {msg}"),
        }
    }
}

impl std::error::Error for DatasetError {}

pub fn parse_countries(json: &str) -> Result<Vec<CountryRecord>, DatasetError> {
    let countries: Vec<CountryRecord> =
        serde_json::from_str(json).map_err(|e| DatasetError::Parse(e.to_string()))?;

    let without_coords = countries.iter().filter(|c| c.lat_lng().is_none()).count();
    tracing::debug!(
        count = countries.len(),
        without_coords,
        "parsed country dataset"
    );
    Ok(countries)
}

/// Format an integer with a thousands separator, e.g. `1,000,000,000`.
pub fn format_population(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + (len / 3) * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}
