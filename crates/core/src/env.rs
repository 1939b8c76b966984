// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable env merging.
//!
//! Parent→child env plumbing is expressed as an immutable builder: each
//! `with` produces a new [`Env`], never mutating the receiver, so any
//! intermediate layer can be snapshotted and reused.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An environment layer: string keys to string values, ordered.
///
/// Merging is right-biased — the overlay wins on key collision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(BTreeMap<String, String>);

impl Env {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    /// Produce a new env with `overlay` merged on top of `self`.
    ///
    /// Overlay values override on key collision; neither input is mutated.
    #[must_use]
    pub fn with(&self, overlay: &Env) -> Env {
        let mut merged = self.0.clone();
        for (k, v) in &overlay.0 {
            merged.insert(k.clone(), v.clone());
        }
        Env(merged)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for Env {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Env {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
