//! Parsing of the ISO 8601 durations reported by the video API (`PT4M13S`).

use crate::{CatalogError, Result};

/// Parses an ISO 8601 duration into whole seconds.
///
/// Supports weeks, days, hours, minutes and seconds. Fractional seconds are
/// truncated. Years and months have no fixed length and are rejected.
///
/// ```
/// use ytccatalog::parse_iso8601_duration;
///
/// assert_eq!(parse_iso8601_duration("PT4M13S").unwrap(), 253);
/// assert_eq!(parse_iso8601_duration("P1DT1H").unwrap(), 90_000);
/// ```
pub fn parse_iso8601_duration(input: &str) -> Result<u64> {
    let invalid = || CatalogError::InvalidDuration(input.to_string());

    let rest = input.trim().strip_prefix('P').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    let mut in_time = false;
    let mut number = String::new();
    let mut last_rank: Option<u8> = None;
    let mut time_components = 0;

    for c in rest.chars() {
        match c {
            'T' if !in_time && number.is_empty() => in_time = true,
            '0'..='9' | '.' | ',' => number.push(if c == ',' { '.' } else { c }),
            unit => {
                if number.is_empty() {
                    return Err(invalid());
                }
                let value: f64 = number.parse().map_err(|_| invalid())?;
                // Les unités doivent apparaître une seule fois, dans l'ordre W D T H M S
                let (rank, factor): (u8, u64) = match (in_time, unit) {
                    (false, 'W') => (0, 7 * 86_400),
                    (false, 'D') => (1, 86_400),
                    (true, 'H') => (2, 3_600),
                    (true, 'M') => (3, 60),
                    (true, 'S') => (4, 1),
                    _ => return Err(invalid()),
                };
                if last_rank.is_some_and(|last| rank <= last) {
                    return Err(invalid());
                }
                last_rank = Some(rank);
                if in_time {
                    time_components += 1;
                }
                total = total
                    .checked_add((value * factor as f64) as u64)
                    .ok_or_else(invalid)?;
                number.clear();
            }
        }
    }

    if !number.is_empty() || last_rank.is_none() || (in_time && time_components == 0) {
        return Err(invalid());
    }
    Ok(total)
}
