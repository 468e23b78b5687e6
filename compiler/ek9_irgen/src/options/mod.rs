//! Generation options.
//!
//! Defaults come from the build profile; environment variables override
//! them:
//!
//! | Variable | Effect |
//! |---|---|
//! | `EK9_IR_VERIFY=0\|1` | run `ek9_ir::verify` on every generated unit |
//! | `EK9_IR_TRACE_SCOPES=0\|1` | log every scope push/pop at `trace` |

pub const VERIFY_VAR: &str = "EK9_IR_VERIFY";
pub const TRACE_SCOPES_VAR: &str = "EK9_IR_TRACE_SCOPES";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenOptions {
    /// Verify scope nesting and ownership balance after each unit.
    pub verify: bool,
    /// Log scope enter/exit at `trace` level.
    pub trace_scopes: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        GenOptions {
            verify: cfg!(debug_assertions),
            trace_scopes: false,
        }
    }
}

/// Partial settings layered over a [`GenOptions`] by [`GenOptions::merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub verify: Option<bool>,
    pub trace_scopes: Option<bool>,
}

impl OptionOverrides {
    /// Read overrides through `lookup` (normally `std::env::var`).
    ///
    /// Unparseable values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        OptionOverrides {
            verify: lookup(VERIFY_VAR).as_deref().and_then(parse_flag),
            trace_scopes: lookup(TRACE_SCOPES_VAR).as_deref().and_then(parse_flag),
        }
    }
}

impl GenOptions {
    /// Defaults overlaid with `EK9_IR_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().merge(OptionOverrides::from_lookup(|key| std::env::var(key).ok()))
    }

    #[must_use]
    pub fn merge(self, overrides: OptionOverrides) -> Self {
        GenOptions {
            verify: overrides.verify.unwrap_or(self.verify),
            trace_scopes: overrides.trace_scopes.unwrap_or(self.trace_scopes),
        }
    }

    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn with_trace_scopes(mut self, trace_scopes: bool) -> Self {
        self.trace_scopes = trace_scopes;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
