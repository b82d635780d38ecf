//! Rescue policy shared by every scaffold operation.
//!
//! A failed operation is always reported: as a `tracing` error event, and as
//! a line on the debug sink when one is configured. Configuration errors are
//! then returned unconditionally. Anything else is returned only when the
//! client was built with `raise_exceptions`; otherwise the call yields
//! `Ok(None)`.

use tracing::error;

use crate::config::{ClientConfig, DebugSink};
use crate::error::Result;
use crate::operation::OperationKind;

#[derive(Debug, Clone)]
pub struct ErrorPolicy {
    raise_exceptions: bool,
    debug_sink: Option<DebugSink>,
}

impl ErrorPolicy {
    pub fn new(raise_exceptions: bool, debug_sink: Option<DebugSink>) -> Self {
        Self {
            raise_exceptions,
            debug_sink,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.raise_exceptions, config.debug_sink.clone())
    }

    pub fn raise_exceptions(&self) -> bool {
        self.raise_exceptions
    }

    /// Run `f` under the policy. `Ok(Some(_))` on success, `Ok(None)` for a
    /// swallowed failure.
    pub fn guard<T>(
        &self,
        kind: OperationKind,
        table: &str,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<Option<T>> {
        match f() {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                error!(operation = kind.name(), table, error = %err, "scaffold operation failed");
                if let Some(sink) = &self.debug_sink {
                    sink.write_line(&err.to_string());
                }
                if err.is_configuration() || self.raise_exceptions {
                    Err(err)
                } else {
                    Ok(None)
                }
            }
        }
    }
}
