use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Three independent string-keyed maps owned by every [`Node`](crate::Node).
/// Keys are not pre-declared; extractors publish timings, errors, and
/// domain facts into whichever map fits the value's type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetaMap {
    pub strings: BTreeMap<String, String>,
    pub numbers: BTreeMap<String, i64>,
    pub booleans: BTreeMap<String, bool>,
}

impl MetaMap {
    pub fn new() -> Self {
        let mut meta = Self::default();
        meta.strings.insert("error_message".to_owned(), String::new());
        meta
    }

    /// Append a recoverable extractor/analyzer failure in
    /// `"<name>: <message>;"` form.
    pub fn append_error(&mut self, name: &str, message: &str) {
        let entry = self.strings.entry("error_message".to_owned()).or_default();
        entry.push_str(name);
        entry.push_str(": ");
        entry.push_str(message);
        entry.push(';');
    }

    pub fn record_duration(&mut self, name: &str, micros: i64) {
        self.numbers.insert(format!("microsecond_{name}"), micros);
    }
}
