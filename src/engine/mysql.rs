use crate::codec::ValueCodec;
use crate::connection::Connection;
use crate::error::SqlMapperError;

use super::Engine;

const SET_UTC: &str = "set time_zone = '+00:00'";

/// `MySQL` 5 engine. Variant `"mysql"`; every connection is switched to UTC so the
/// timestamps rendered by the codec mean the same thing on both sides.
#[derive(Debug, Clone, Default)]
pub struct MySql5Engine {
    codec: ValueCodec,
}

impl MySql5Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for MySql5Engine {
    fn prepare_connection(&self, conn: &mut dyn Connection) -> Result<(), SqlMapperError> {
        conn.execute_batch(SET_UTC)
    }

    fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    fn escape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 8);
        for ch in value.chars() {
            match ch {
                '\0' => out.push_str("\\0"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\u{8}' => out.push_str("\\b"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '\u{1A}' => out.push_str("\\Z"),
                '\\' => out.push_str("\\\\"),
                other => out.push(other),
            }
        }
        out
    }

    fn unescape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut chars = value.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('0') => out.push('\0'),
                Some('b') => out.push('\u{8}'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('Z') => out.push('\u{1A}'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }

    fn variant(&self) -> &str {
        "mysql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Call, MockConnection};

    #[test]
    fn prepares_connection_for_utc() {
        let eng = MySql5Engine::new();
        let mut conn = MockConnection::new(1);
        eng.prepare_connection(&mut conn).unwrap();

        assert_eq!(eng.variant(), "mysql");
        assert_eq!(conn.log().calls(), vec![Call::Batch(SET_UTC.to_string())]);
    }

    #[test]
    fn prepare_failure_is_returned_unchanged() {
        let eng = MySql5Engine::new();
        let mut conn = MockConnection::new(1);
        conn.fail_on_batch("tz rejected");

        let err = eng.prepare_connection(&mut conn).unwrap_err();
        assert!(matches!(err, SqlMapperError::ExecutionError(ref m) if m == "tz rejected"));
    }

    #[test]
    fn escapes_special_characters() {
        let eng = MySql5Engine::new();
        assert_eq!(eng.escape("abcd"), "abcd");
        assert_eq!(
            eng.escape("'\\ab''cd'\u{1A}\t\r\n\u{8}\"\0"),
            "\\'\\\\ab\\'\\'cd\\'\\Z\\t\\r\\n\\b\\\"\\0"
        );
    }

    #[test]
    fn escape_round_trips() {
        let eng = MySql5Engine::new();
        for raw in [
            "plain",
            "\\'",
            "\\\\n",
            "a\\\0b",
            "'\\ab''cd'\u{1A}\t\r\n\u{8}\"\0",
            "trailing\\",
            "ünïcödé \\ 'x'",
        ] {
            assert_eq!(eng.unescape(&eng.escape(raw)), raw, "round trip of {raw:?}");
        }
    }
}
