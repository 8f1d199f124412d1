//! Value-change-dump decoding for the waveform viewer.
//!
//! Only scalar changes of a fixed set of signals are kept; everything else in
//! the trace is skipped. Decoding is two independent passes over the text:
//! the first binds identifier codes to signal names from the header scopes,
//! the second replays the value changes against those bindings.

use serde_derive::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};
use vcd_ng::{Command, IdCode, Parser, ScopeItem, Value};

use crate::error::JudgeCoreError;

/// `(variable name in the trace, name reported to the viewer)`
pub const DEFAULT_SIGNALS: [(&str, &str); 6] = [
    ("clk", "clk"),
    ("rstn", "rstn"),
    ("refrence_in", "refrence_in"),
    ("your_out", "your_out"),
    ("refrence_out", "refrence_out"),
    ("mismath_out", "mismatch"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalValue {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "x")]
    X,
    #[serde(rename = "z")]
    Z,
}

impl From<Value> for SignalValue {
    fn from(value: Value) -> Self {
        match value {
            Value::V0 => SignalValue::Zero,
            Value::V1 => SignalValue::One,
            Value::X => SignalValue::X,
            Value::Z => SignalValue::Z,
        }
    }
}

pub type Sample = (u64, SignalValue);

/// Signal name to its time-ascending samples.
pub type SignalTimeline = BTreeMap<String, Vec<Sample>>;

type Bindings = HashMap<IdCode, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WaveformReport {
    Timeline { signals: SignalTimeline },
    Absent,
    ParseError { message: String },
}

#[derive(Debug, Clone)]
pub struct VcdDecoder {
    signals: Vec<(String, String)>,
}

impl Default for VcdDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNALS)
    }
}

impl VcdDecoder {
    pub fn new<I, V, D>(signals: I) -> Self
    where
        I: IntoIterator<Item = (V, D)>,
        V: Into<String>,
        D: Into<String>,
    {
        Self {
            signals: signals
                .into_iter()
                .map(|(var, display)| (var.into(), display.into()))
                .collect(),
        }
    }

    /// Never fails: a missing file and an unreadable trace are both
    /// reported in the returned value.
    pub fn decode_file(&self, path: &Path) -> WaveformReport {
        if !path.exists() {
            log::debug!("Waveform {:?} does not exist", path);
            return WaveformReport::Absent;
        }
        let decoded = fs::read(path)
            .map_err(JudgeCoreError::from)
            .and_then(|bytes| self.decode_bytes(&bytes));
        match decoded {
            Ok(signals) => WaveformReport::Timeline { signals },
            Err(e) => {
                log::warn!("Failed to decode waveform {:?}: {}", path, e);
                WaveformReport::ParseError {
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn decode_str(&self, text: &str) -> Result<SignalTimeline, JudgeCoreError> {
        self.decode_bytes(text.as_bytes())
    }

    fn decode_bytes(&self, trace: &[u8]) -> Result<SignalTimeline, JudgeCoreError> {
        let bindings = self.bind_codes(trace)?;

        let mut timeline = SignalTimeline::new();
        for name in bindings.values().flatten() {
            timeline.insert(name.clone(), vec![]);
        }
        replay_changes(trace, &bindings, &mut timeline)?;
        Ok(timeline)
    }

    fn display_name(&self, var: &str) -> Option<&str> {
        self.signals
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, display)| display.as_str())
    }

    /// First pass, over the header only.
    fn bind_codes(&self, trace: &[u8]) -> Result<Bindings, JudgeCoreError> {
        let mut parser = Parser::new(trace);
        let header = parser.parse_header()?;

        let mut bindings = Bindings::new();
        // Variables outside any scope are not bound.
        for item in &header.items {
            if let ScopeItem::Scope(scope) = item {
                self.bind_scope(&scope.children[..], &mut bindings);
            }
        }
        Ok(bindings)
    }

    fn bind_scope(&self, items: &[ScopeItem], bindings: &mut Bindings) {
        for item in items {
            if let ScopeItem::Scope(scope) = item {
                self.bind_scope(&scope.children[..], bindings);
                continue;
            }
            let ScopeItem::Var(var) = item else {
                continue;
            };
            let Some(display) = self.display_name(var.reference.as_str()) else {
                continue;
            };
            // The outermost declaration of a name wins.
            if bindings.values().flatten().any(|bound| bound == display) {
                continue;
            }
            log::trace!("Bound {} ({}) to code {}", display, var.reference, var.code);
            bindings
                .entry(var.code)
                .or_default()
                .push(display.to_string());
        }
    }
}

/// Second pass, with a parser of its own over the whole trace.
fn replay_changes(
    trace: &[u8],
    bindings: &Bindings,
    timeline: &mut SignalTimeline,
) -> Result<(), JudgeCoreError> {
    let mut current_time = 0u64;

    for command in Parser::new(trace) {
        match command? {
            Command::Timestamp(time) => {
                if time < current_time {
                    return Err(anyhow::anyhow!(
                        "timestamp #{} goes back from #{}",
                        time,
                        current_time
                    )
                    .into());
                }
                current_time = time;
            }
            Command::ChangeScalar(code, value) => {
                let Some(names) = bindings.get(&code) else {
                    continue;
                };
                let value = SignalValue::from(value);
                for name in names {
                    if let Some(samples) = timeline.get_mut(name) {
                        samples.push((current_time, value));
                    }
                }
            }
            // Header definitions, vector and real changes, comments.
            _ => {}
        }
    }
    Ok(())
}
