use crate::codec::ValueCodec;
use crate::connection::Connection;
use crate::error::SqlMapperError;

use super::Engine;

/// Engine without a dialect of its own: no connection setup, an empty variant and
/// standard SQL quote doubling.
#[derive(Debug, Clone, Default)]
pub struct DefaultEngine {
    codec: ValueCodec,
}

impl DefaultEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for DefaultEngine {
    fn prepare_connection(&self, _conn: &mut dyn Connection) -> Result<(), SqlMapperError> {
        Ok(())
    }

    fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    fn escape(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn unescape(&self, value: &str) -> String {
        value.replace("''", "'")
    }

    fn variant(&self) -> &str {
        ""
    }
}
