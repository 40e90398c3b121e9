use serde_json::Value;
use time::{macros::format_description, OffsetDateTime};

use crate::{models::quotes::Quote, store::error::FormatError};

pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn serialize(quotes: &[Quote]) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec_pretty(quotes)?)
}

/// Parses an exported (or hand-written) file into untyped records for the sanitizer.
pub fn deserialize(bytes: &[u8]) -> Result<Vec<Value>, FormatError> {
    match serde_json::from_slice(bytes)? {
        Value::Array(items) => Ok(items),
        _ => Err(FormatError::NotAnArray),
    }
}

/// `quotes_YYYY-MM-DD_HHMMSS.json`
pub fn export_filename(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]_[hour][minute][second]");

    // the format only has numeric components, so this can't actually fail.
    let stamp = at
        .format(&format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());

    format!("quotes_{stamp}.json")
}

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::store::sanitize::sanitize;

    #[test]
    fn round_trips_sanitized_quotes() {
        let quotes = vec![
            Quote::new("Stay hungry.", "Motivation"),
            Quote::new("Don’t let yesterday take up too much of today.", "Inspiration"),
        ];

        let bytes = serialize(&quotes).unwrap();
        let back = sanitize(&deserialize(&bytes).unwrap());

        assert_eq!(back, quotes);
    }

    #[test]
    fn export_is_pretty_printed() {
        let bytes = serialize(&[Quote::new("a", "b")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "[\n  {\n    \"text\": \"a\",\n    \"category\": \"b\"\n  }\n]"
        );
    }

    #[test]
    fn rejects_non_array_top_level() {
        assert!(matches!(
            deserialize(br#"{"text": "a", "category": "b"}"#),
            Err(FormatError::NotAnArray)
        ));
        assert!(matches!(deserialize(b"42"), Err(FormatError::NotAnArray)));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            deserialize(b"[{\"text\": "),
            Err(FormatError::Json(_))
        ));
    }

    #[test]
    fn empty_array_is_fine() {
        assert!(deserialize(b"[]").unwrap().is_empty());
    }

    #[test]
    fn filename_is_zero_padded() {
        let at = datetime!(2024-03-07 04:05:06 UTC);

        assert_eq!(export_filename(at), "quotes_2024-03-07_040506.json");
    }

    #[test]
    fn filename_uses_24_hour_clock() {
        let at = datetime!(2026-10-17 23:59:01 +09:00);

        assert_eq!(export_filename(at), "quotes_2026-10-17_235901.json");
    }
}
