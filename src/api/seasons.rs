//! Calendar year to season id mapping
//!
//! Season-scoped endpoints address seasons by an internal id rather than by
//! year. The API exposes no lookup for it, so the table is fixed here.

use crate::error::{RatingError, Result};

/// Known seasons as `(year, season id)`, ordered by year
pub const SEASONS: [(i32, u32); 11] = [
    (2009, 9),
    (2010, 16),
    (2011, 37),
    (2012, 44),
    (2013, 45),
    (2014, 48),
    (2015, 49),
    (2016, 50),
    (2017, 51),
    (2018, 52),
    (2019, 53),
];

/// Returns the season id for a calendar year
pub fn season_id(year: i32) -> Result<u32> {
    SEASONS
        .iter()
        .find(|(y, _)| *y == year)
        .map(|(_, id)| *id)
        .ok_or(RatingError::UnknownSeason {
            year,
            first: SEASONS[0].0,
            last: SEASONS[SEASONS.len() - 1].0,
        })
}
