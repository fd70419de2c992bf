// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request identifier type.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Opaque token minted when a command is dispatched.
///
/// Identifiers are only ever compared for equality: a response whose
/// identifier is no longer the latest one issued is stale. They carry no
/// ordering and are never reused.
///
/// # Examples
///
/// ```
/// use esplink::types::RequestId;
///
/// let a = RequestId::new();
/// let b = RequestId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Mints a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "RequestId({short}...)")
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn never_reused() {
        let ids: HashSet<RequestId> = (0..1000).map(|_| RequestId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn debug_format_is_short() {
        let debug = format!("{:?}", RequestId::new());
        assert!(debug.starts_with("RequestId("));
        assert!(debug.ends_with("...)"));
    }

    #[test]
    fn serializes_as_plain_uuid() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
