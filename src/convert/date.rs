//! Oracle DATE and TIMESTAMP codecs.
//!
//! A DATE is seven bytes: century and year-of-century (each offset by 100),
//! month, day, then hour, minute and second (each offset by 1). TIMESTAMP
//! appends the nanoseconds as a big-endian u32, and the server may omit
//! them when they are zero.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Drop sub-second digits beyond `scale` (0 keeps whole seconds only).
pub fn truncate_fraction(dt: NaiveDateTime, scale: u8) -> NaiveDateTime {
    let step = 10u32.pow(9 - u32::from(scale.min(9)));
    let nanos = dt.nanosecond() % 1_000_000_000;
    dt.with_nanosecond(nanos - nanos % step).unwrap_or(dt)
}

/// Encode a DATE. Fractional seconds are dropped.
pub fn encode_oracle_date(dt: NaiveDateTime) -> Result<[u8; 7]> {
    let year = dt.year();
    if !(-4712..=9999).contains(&year) || year == 0 {
        return Err(Error::invalid_temporal(format!(
            "year {} is outside the Oracle DATE range",
            year
        )));
    }
    // Negative years store the century and year with the sign folded in.
    let century = year.div_euclid(100) + 100;
    let year_in_century = year.rem_euclid(100) + 100;
    Ok([
        century as u8,
        year_in_century as u8,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8 + 1,
        dt.minute() as u8 + 1,
        dt.second().min(59) as u8 + 1,
    ])
}

/// Encode a TIMESTAMP keeping `scale` fractional digits.
pub fn encode_oracle_timestamp(dt: NaiveDateTime, scale: u8) -> Result<[u8; 11]> {
    let dt = truncate_fraction(dt, scale);
    let date = encode_oracle_date(dt)?;
    let nanos = (dt.nanosecond() % 1_000_000_000).to_be_bytes();
    let mut out = [0u8; 11];
    out[..7].copy_from_slice(&date);
    out[7..].copy_from_slice(&nanos);
    Ok(out)
}

/// Decode a seven byte DATE.
pub fn decode_oracle_date(data: &[u8]) -> Result<NaiveDateTime> {
    let fields: &[u8; 7] = data.try_into().map_err(|_| {
        Error::protocol(format!("DATE value has {} bytes, expected 7", data.len()))
    })?;
    date_from_fields(fields, 0)
}

/// Decode a TIMESTAMP, with or without its fractional second.
pub fn decode_oracle_timestamp(data: &[u8]) -> Result<NaiveDateTime> {
    let (date, fraction) = data.split_at(data.len().min(7));
    let fields: &[u8; 7] = date.try_into().map_err(|_| {
        Error::protocol(format!("TIMESTAMP value has {} bytes", data.len()))
    })?;
    let nanos = match fraction {
        [] => 0,
        [a, b, c, d] => u32::from_be_bytes([*a, *b, *c, *d]),
        _ => {
            return Err(Error::protocol(format!(
                "TIMESTAMP value has {} bytes",
                data.len()
            )))
        }
    };
    date_from_fields(fields, nanos)
}

fn date_from_fields(fields: &[u8; 7], nanos: u32) -> Result<NaiveDateTime> {
    let [century, year, month, day, hour, minute, second] = *fields;
    let full_year = (i32::from(century) - 100) * 100 + i32::from(year) - 100;

    let date = NaiveDate::from_ymd_opt(full_year, u32::from(month), u32::from(day))
        .ok_or_else(|| {
            Error::protocol(format!("invalid DATE {full_year}-{month}-{day}"))
        })?;
    let time = NaiveTime::from_hms_nano_opt(
        u32::from(hour.wrapping_sub(1)),
        u32::from(minute.wrapping_sub(1)),
        u32::from(second.wrapping_sub(1)),
        nanos,
    )
    .filter(|_| nanos < 1_000_000_000)
    .ok_or_else(|| {
        Error::protocol(format!(
            "invalid time bytes {hour}:{minute}:{second} with {nanos} ns"
        ))
    })?;
    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ymd: (i32, u32, u32), hms: (u32, u32, u32), nanos: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2)
            .unwrap()
            .and_hms_nano_opt(hms.0, hms.1, hms.2, nanos)
            .unwrap()
    }

    const OCT_21_2024: [u8; 7] = [120, 124, 10, 21, 13, 37, 6];

    #[test]
    fn test_decode_date() {
        assert_eq!(
            decode_oracle_date(&OCT_21_2024).unwrap(),
            at((2024, 10, 21), (12, 36, 5), 0)
        );
        assert_eq!(
            decode_oracle_date(&[119, 199, 6, 15, 13, 31, 46]).unwrap(),
            at((1999, 6, 15), (12, 30, 45), 0)
        );
        assert_eq!(
            decode_oracle_timestamp(&OCT_21_2024).unwrap(),
            at((2024, 10, 21), (12, 36, 5), 0)
        );
    }

    #[test]
    fn test_decode_rejects_bad_bytes() {
        for bad in [
            &[120u8, 124, 10][..],
            &[120, 124, 13, 15, 1, 1, 1],
            &[120, 124, 2, 30, 1, 1, 1],
            &[120, 124, 1, 1, 0, 1, 1],
        ] {
            assert!(decode_oracle_date(bad).is_err(), "accepted {bad:?}");
        }
        let mut too_many_nanos = OCT_21_2024.to_vec();
        too_many_nanos.extend_from_slice(&1_000_000_000u32.to_be_bytes());
        assert!(decode_oracle_timestamp(&too_many_nanos).is_err());
        assert!(decode_oracle_timestamp(&OCT_21_2024[..5]).is_err());
        assert!(decode_oracle_timestamp(&[OCT_21_2024.as_slice(), &[0, 0]].concat()).is_err());
    }

    #[test]
    fn test_encode_date() {
        let value = at((2024, 12, 31), (23, 59, 59), 0);
        let bytes = encode_oracle_date(value).unwrap();
        assert_eq!(bytes, [120, 124, 12, 31, 24, 60, 60]);
        assert_eq!(decode_oracle_date(&bytes).unwrap(), value);

        let fractional = encode_oracle_date(at((2020, 1, 2), (3, 4, 5), 999_000_000)).unwrap();
        assert_eq!(
            decode_oracle_date(&fractional).unwrap(),
            at((2020, 1, 2), (3, 4, 5), 0)
        );
        assert!(encode_oracle_date(at((10000, 1, 1), (0, 0, 0), 0)).is_err());
    }

    #[test]
    fn test_timestamp_scale() {
        let value = at((2021, 7, 8), (9, 10, 11), 123_456_789);
        for (scale, nanos) in [(9, 123_456_789), (6, 123_456_000), (3, 123_000_000), (0, 0)] {
            let bytes = encode_oracle_timestamp(value, scale).unwrap();
            assert_eq!(
                decode_oracle_timestamp(&bytes).unwrap(),
                at((2021, 7, 8), (9, 10, 11), nanos),
                "scale {scale}"
            );
        }
    }
}
