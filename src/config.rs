use serde::Deserialize;

/// Tunables for a [`BreakpointTable`](crate::BreakpointTable).
///
/// Every field has a default, so a partial JSON object is accepted:
///
/// ```
/// let opts = script_breakpoints::TableOptions::from_json_str(r#"{"naninf_supported": true}"#).unwrap();
/// assert!(opts.naninf_supported);
/// assert_eq!(opts.default_line, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// The host can trap floating point exceptions, so `if naninf` is honored.
    pub naninf_supported: bool,

    /// Unconditional `if error` also toggles the interrupt flag.
    pub error_stops_on_interrupt: bool,

    /// Line used when `stop` names a routine but no lines.
    pub default_line: u32,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            naninf_supported: false,
            error_stops_on_interrupt: true,
            default_line: 1,
        }
    }
}

impl TableOptions {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
