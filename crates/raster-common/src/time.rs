//! Acquisition dates derived from product file names.
//!
//! Product files carry their acquisition date as a `doyYYYYDDD` token
//! (year + day of year) between underscores, e.g.
//! `MOD13A1.061__500m_16_days_NDVI_doy2020001_aid0001.tif` or
//! `MCD64A1.061_Burn_Date_doy2020245_aid0001.tif`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::FilenameParseError;

const TOKEN_PREFIX: &str = "doy";

/// Acquisition date of one product file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AcquisitionDate(NaiveDate);

impl AcquisitionDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year and 1-based day of year.
    pub fn from_year_doy(year: i32, doy: u32) -> Option<Self> {
        NaiveDate::from_yo_opt(year, doy).map(Self)
    }

    /// Parse the `doyYYYYDDD` token out of a file name or path.
    pub fn from_filename(path: impl AsRef<Path>) -> Result<Self, FilenameParseError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let token = stem
            .split('_')
            .find(|part| part.starts_with(TOKEN_PREFIX))
            .ok_or_else(|| FilenameParseError::MissingToken(name.clone()))?;

        let invalid = || FilenameParseError::InvalidDate {
            name: name.clone(),
            token: token.to_string(),
        };

        let digits = &token[TOKEN_PREFIX.len()..];
        if digits.len() != 7 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = digits[..4].parse().map_err(|_| invalid())?;
        let doy: u32 = digits[4..].parse().map_err(|_| invalid())?;

        Self::from_year_doy(year, doy).ok_or_else(invalid)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn day_of_year(&self) -> u32 {
        self.0.ordinal()
    }

    /// `MM/DD/YYYY`, the date format of the tabular output.
    pub fn us_format(&self) -> String {
        self.0.format("%m/%d/%Y").to_string()
    }

    /// Overlay text for rendered frames.
    pub fn frame_label(&self) -> String {
        format!("Year: {}, Day: {:03}", self.year(), self.day_of_year())
    }
}

impl fmt::Display for AcquisitionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.us_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vegetation_index_name() {
        let date =
            AcquisitionDate::from_filename("MOD13A1.061__500m_16_days_NDVI_doy2020033_aid0001.tif")
                .unwrap();
        assert_eq!(date.year(), 2020);
        assert_eq!(date.day_of_year(), 33);
        assert_eq!(date.us_format(), "02/02/2020");
    }

    #[test]
    fn test_parse_burn_area_name_with_directory() {
        let date = AcquisitionDate::from_filename("raw/BA/MCD64A1.061_Burn_Date_doy2021245_aid0001.tif")
            .unwrap();
        assert_eq!(date.us_format(), "09/02/2021");
    }

    #[test]
    fn test_token_at_end_of_stem() {
        let date = AcquisitionDate::from_filename("VNP14A1_FireMask_doy2019001.tif").unwrap();
        assert_eq!(date.us_format(), "01/01/2019");
        assert_eq!(date.frame_label(), "Year: 2019, Day: 001");
    }

    #[test]
    fn test_leap_day_of_year() {
        assert!(AcquisitionDate::from_filename("X_doy2020366_aid0001.tif").is_ok());
        assert!(matches!(
            AcquisitionDate::from_filename("X_doy2021366_aid0001.tif"),
            Err(FilenameParseError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_missing_token() {
        let err = AcquisitionDate::from_filename("MOD13A1_NDVI_2020001.tif").unwrap_err();
        assert_eq!(
            err,
            FilenameParseError::MissingToken("MOD13A1_NDVI_2020001.tif".to_string())
        );
    }

    #[test]
    fn test_malformed_token() {
        for name in ["X_doy202001_aid1.tif", "X_doy20200O1_aid1.tif", "X_doy2020000_aid1.tif"] {
            assert!(
                matches!(
                    AcquisitionDate::from_filename(name),
                    Err(FilenameParseError::InvalidDate { .. })
                ),
                "{name} should be rejected"
            );
        }
    }
}
