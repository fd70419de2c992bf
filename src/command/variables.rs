// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runtime variables exposed by the device firmware.
//!
//! The firmware's `/changeVar` handler takes every query parameter as a
//! `name=value` assignment and answers with one report line per variable:
//!
//! ```text
//! Update status:
//!  - blink_ms updated successfully
//!  - colour FAILED (not found or type mismatch)
//! ```

use serde::Serialize;

use crate::error::ValueError;

/// A single `name=value` assignment.
///
/// Construction is unchecked; the name is validated when the command's
/// request target is built, so a bad name surfaces as a validation failure
/// from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceVariable {
    name: String,
    value: String,
}

impl DeviceVariable {
    /// Creates a variable assignment.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value to assign.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Checks that the name is a non-empty identifier.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidVariableName` otherwise.
    pub fn validate(&self) -> Result<(), ValueError> {
        let valid = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(ValueError::InvalidVariableName(self.name.clone()))
        }
    }
}

/// Outcome of one variable assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableOutcome {
    /// Variable name as echoed by the device.
    pub name: String,
    /// Whether the device accepted the assignment.
    pub updated: bool,
}

/// Parsed `/changeVar` response body.
///
/// # Examples
///
/// ```
/// use esplink::command::VariableReport;
///
/// let report = VariableReport::parse(
///     "Update status:\n - speed updated successfully\n - colour FAILED (not found or type mismatch)\n",
/// );
/// assert_eq!(report.updated().collect::<Vec<_>>(), ["speed"]);
/// assert_eq!(report.failed().collect::<Vec<_>>(), ["colour"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableReport {
    outcomes: Vec<VariableOutcome>,
}

impl VariableReport {
    /// Parses a response body. Lines that are not per-variable reports are
    /// skipped.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let outcomes = body
            .lines()
            .filter_map(|line| line.trim().strip_prefix("- "))
            .filter_map(|entry| {
                if let Some(name) = entry.strip_suffix(" updated successfully") {
                    Some(VariableOutcome {
                        name: name.trim().to_string(),
                        updated: true,
                    })
                } else {
                    entry.split_once(" FAILED").map(|(name, _)| VariableOutcome {
                        name: name.trim().to_string(),
                        updated: false,
                    })
                }
            })
            .collect();

        Self { outcomes }
    }

    /// Returns all outcomes in report order.
    #[must_use]
    pub fn outcomes(&self) -> &[VariableOutcome] {
        &self.outcomes
    }

    /// Returns the names of variables the device accepted.
    pub fn updated(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.updated)
            .map(|o| o.name.as_str())
    }

    /// Returns the names of variables the device rejected.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.updated)
            .map(|o| o.name.as_str())
    }

    /// Returns `true` if every reported variable was updated.
    #[must_use]
    pub fn all_updated(&self) -> bool {
        self.outcomes.iter().all(|o| o.updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_names() {
        assert!(DeviceVariable::new("blink_ms", "1").validate().is_ok());
        assert!(DeviceVariable::new("LED2", "1").validate().is_ok());
        assert!(DeviceVariable::new("", "1").validate().is_err());
        assert!(DeviceVariable::new("a b", "1").validate().is_err());
        assert!(DeviceVariable::new("x=y", "1").validate().is_err());
    }

    #[test]
    fn parse_empty_report() {
        let report = VariableReport::parse("Update status:\n");
        assert!(report.outcomes().is_empty());
        assert!(report.all_updated());
    }

    #[test]
    fn parse_mixed_report() {
        let report = VariableReport::parse(
            "Update status:\n - a updated successfully\n - b FAILED (not found or type mismatch)\n - c updated successfully\n",
        );
        assert_eq!(report.outcomes().len(), 3);
        assert!(!report.all_updated());
        assert_eq!(report.updated().collect::<Vec<_>>(), ["a", "c"]);
        assert_eq!(report.failed().collect::<Vec<_>>(), ["b"]);
    }
}
