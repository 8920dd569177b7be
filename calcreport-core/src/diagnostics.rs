// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::io::Write;

use log::Level;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Collects what happened during one conversion.
///
/// Every entry is forwarded to the `log` facade as it is recorded, and the
/// whole run can be written out once at the end with [`Diagnostics::flush`].
#[derive(Default, Debug)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.record(Level::Debug, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Level::Warn, message.into());
    }

    fn record(&mut self, level: Level, message: String) {
        log::log!(level, "{message}");
        self.entries.push(Diagnostic { level, message });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|entry| entry.level == Level::Warn)
    }

    pub fn flush(&mut self, out: &mut impl Write) -> std::io::Result<()> {
        for entry in self.entries.drain(..) {
            writeln!(out, "[{}] {}", entry.level, entry.message)?;
        }
        out.flush()
    }
}
