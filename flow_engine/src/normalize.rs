use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::record::TradeRecord;

/// Trade and expiry dates in the feed are US style.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Parse a premium such as `$85.7K`, `$3M` or `1,250` into dollars.
///
/// `$` and grouping commas are stripped. A `K` scales by one thousand, otherwise
/// an `M` scales by one million; a value is expected to carry at most one of
/// the two. Anything unparseable yields 0.
pub fn parse_premium(raw: &str) -> f64 {
    let clean: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();

    let multiplier = if clean.contains('K') {
        1_000.0
    } else if clean.contains('M') {
        1_000_000.0
    } else {
        1.0
    };

    let digits: String = clean.chars().filter(|c| *c != 'K' && *c != 'M').collect();
    match digits.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value * multiplier,
        _ => 0.0,
    }
}

/// Premium from a JSON scalar: numbers pass through, strings go through [`parse_premium`].
pub fn parse_premium_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_premium(s),
        _ => 0.0,
    }
}

/// Parse a plain numeric field, ignoring grouping commas.
pub fn parse_number(raw: &str) -> Option<f64> {
    let clean: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if clean.is_empty() {
        return None;
    }
    clean.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Combine a `MM/DD/YYYY` date and a `HH:MM[:SS] AM|PM` time.
///
/// Hour 12 is folded to 0 before the PM offset is applied, so `12:xx AM` is
/// midnight and `12:xx PM` is noon. The fold also applies without a marker,
/// so a bare `12:30` is 00:30; other unmarked hours are taken as given.
/// Out-of-range hours yield `None`.
pub fn parse_trade_datetime(date: &str, time: &str) -> Option<NaiveDateTime> {
    let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;

    let mut parts = time.split_whitespace();
    let clock = parts.next()?;
    let marker = parts.next();

    let mut fields = clock.split(':');
    let mut hours: u32 = fields.next()?.parse().ok()?;
    let minutes: u32 = fields.next()?.parse().ok()?;
    let seconds: u32 = match fields.next() {
        Some(s) if !s.is_empty() => s.parse().ok()?,
        _ => 0,
    };

    if hours == 12 {
        hours = 0;
    }
    if marker.is_some_and(|m| m.eq_ignore_ascii_case("PM")) {
        hours = hours.checked_add(12)?;
    }

    day.and_hms_opt(hours, minutes, seconds)
}

/// Epoch milliseconds (UTC) for a trade date and time, or 0 when either is malformed.
pub fn parse_date_time(date: &str, time: &str) -> i64 {
    parse_trade_datetime(date, time)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Split one CSV line on commas outside double quotes.
///
/// A quote only toggles the quoted state and is dropped; doubled quotes are
/// not unescaped.
pub fn split_quoted_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    values.push(current);
    values
}

/// Parse a trade export: a header row followed by one trade per line.
///
/// Blank lines are skipped. Input with fewer than two non-blank lines yields
/// no records. Columns missing from a short row are treated as absent.
pub fn parse_csv(text: &str) -> Vec<TradeRecord> {
    let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());

    let headers: Vec<String> = match lines.next() {
        Some(header) => header.split(',').map(|h| h.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    let records: Vec<TradeRecord> = lines
        .map(|line| {
            let values = split_quoted_line(line);
            let fields: Map<String, Value> = headers
                .iter()
                .zip(values)
                .map(|(header, value)| (header.clone(), Value::String(value.trim().to_string())))
                .collect();
            TradeRecord::from_fields(&fields)
        })
        .collect();

    let undated = records.iter().filter(|r| r.timestamp == 0).count();
    debug!(rows = records.len(), undated, "parsed trade csv");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_premium() {
        struct TestCase {
            input: &'static str,
            expected: f64,
        }

        let tests = vec![
            TestCase {
                // TC0: thousands suffix
                input: "$85.7K",
                expected: 85_700.0,
            },
            TestCase {
                // TC1: millions suffix
                input: "$3M",
                expected: 3_000_000.0,
            },
            TestCase {
                // TC2: grouping commas
                input: "$1,250,000",
                expected: 1_250_000.0,
            },
            TestCase {
                // TC3: plain number
                input: "420.5",
                expected: 420.5,
            },
            TestCase {
                // TC4: empty
                input: "",
                expected: 0.0,
            },
            TestCase {
                // TC5: garbage
                input: "n/a",
                expected: 0.0,
            },
            TestCase {
                // TC6: suffix without digits
                input: "$K",
                expected: 0.0,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = parse_premium(test.input);
            assert!(
                (actual - test.expected).abs() < 1e-6,
                "TC{} failed: {} != {}",
                index,
                actual,
                test.expected
            );
        }
    }

    #[test]
    fn test_parse_premium_value() {
        assert_eq!(parse_premium_value(&Value::from(85_700)), 85_700.0);
        assert_eq!(parse_premium_value(&Value::from("$2M")), 2_000_000.0);
        assert_eq!(parse_premium_value(&Value::Null), 0.0);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 1,000 "), Some(1000.0));
        assert_eq!(parse_number("659.74"), Some(659.74));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_twelve_hour_clock() {
        struct TestCase {
            time: &'static str,
            expected_hour: u32,
        }

        let tests = vec![
            TestCase {
                // TC0: midnight
                time: "12:00:00 AM",
                expected_hour: 0,
            },
            TestCase {
                // TC1: noon
                time: "12:00:00 PM",
                expected_hour: 12,
            },
            TestCase {
                // TC2: afternoon
                time: "01:00:00 PM",
                expected_hour: 13,
            },
            TestCase {
                // TC3: morning unchanged
                time: "09:30:00 AM",
                expected_hour: 9,
            },
            TestCase {
                // TC4: seconds omitted
                time: "04:14 PM",
                expected_hour: 16,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let dt = parse_trade_datetime("11/18/2025", test.time)
                .unwrap_or_else(|| panic!("TC{} failed to parse", index));
            assert_eq!(dt.hour(), test.expected_hour, "TC{} failed", index);
        }
    }

    #[test]
    fn test_parse_date_time_millis() {
        // 2025-11-18T16:14:57Z
        assert_eq!(parse_date_time("11/18/2025", "04:14:57 PM"), 1_763_482_497_000);
        assert_eq!(
            parse_date_time("11/18/2025", "12:00:01 AM") + 1000,
            parse_date_time("11/18/2025", "12:00:02 AM")
        );
    }

    #[test]
    fn test_parse_date_time_malformed_is_zero() {
        assert_eq!(parse_date_time("", "04:14:57 PM"), 0);
        assert_eq!(parse_date_time("11/18/2025", ""), 0);
        assert_eq!(parse_date_time("2025-11-18", "04:14:57 PM"), 0);
        assert_eq!(parse_date_time("11/18/2025", "0414 PM"), 0);
        assert_eq!(parse_date_time("13/45/2025", "04:14:57 PM"), 0);
        assert_eq!(parse_date_time("11/18/2025", "13:00:00 PM"), 0);
        assert_eq!(parse_date_time("11/18/2025", "4294967295:00:00 PM"), 0);

        let header = "date,time,strike,put_call,premium\n";
        let records = parse_csv(&format!("{header}11/18/2025,4294967295:00:00 PM,650,call,$1K\n"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, 0);
    }

    #[test]
    fn test_unmarked_twelve_folds_to_midnight() {
        let dt = parse_trade_datetime("11/18/2025", "12:30").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (0, 30));
        assert_eq!(parse_trade_datetime("11/18/2025", "15:45").map(|dt| dt.hour()), Some(15));
    }

    #[test]
    fn test_split_quoted_line() {
        assert_eq!(
            split_quoted_line(r#"SPY,"$1,250",sweep"#),
            vec!["SPY", "$1,250", "sweep"]
        );
        assert_eq!(split_quoted_line("a,,b,"), vec!["a", "", "b", ""]);
        // quotes toggle, they are not escapes
        assert_eq!(split_quoted_line(r#""a""b",c"#), vec!["ab", "c"]);
    }

    #[test]
    fn test_parse_csv() {
        let text = "date,time,symbol,expiry,strike,put_call,side,spot,size,price,premium\r\n\
            11/18/2025,04:14:57 PM,SPY,12/05/2025,640,put,ask,659.74,150,$5.71,$85.7K\r\n\
            \r\n\
            11/18/2025,04:13:12 PM,SPY,11/18/2025,665,put,bid,659.65,1000,$5.30,\"$3,000K\"\r\n\
            11/18/2025,04:11:22 PM,SPY\n";

        let records = parse_csv(text);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].premium, 85_700.0);
        assert_eq!(records[0].expiry, "12/05/2025");
        assert_eq!(records[1].premium, 3_000_000.0);
        assert_eq!(records[1].size, 1000.0);
        // short row keeps what it has, the rest is absent
        assert_eq!(records[2].symbol, "SPY");
        assert_eq!(records[2].strike, None);
        assert!(!records[2].is_eligible());
        assert!(records[2].timestamp > 0);
    }

    #[test]
    fn test_parse_csv_requires_header_and_row() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("date,time,symbol\n\n   \n").is_empty());
    }
}
