//! Output formats for the daemon's journal lines.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How snorlaxd renders each log event on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event, for journald field extraction.
    #[default]
    Json,
    /// Single-line text for reading `journalctl -u` output directly.
    Compact,
}

/// Error for a `--log-format` or `SNORLAX_LOG_FORMAT` value that names no format.
pub type LogFormatParseError = strum::ParseError;
