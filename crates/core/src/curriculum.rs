//! Curriculum Catalog
//!
//! This module holds the static course structure: an ordered list of modules,
//! each with an ordered list of submodules. The catalog is configuration data,
//! loaded once at startup and shared read-only by every student session. It also
//! provides the navigation primitives used by the conversation state machine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A top-level curriculum unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    /// Stable identifier (e.g. `"modulo1"`).
    pub id: String,
    /// Human readable title shown to students.
    pub title: String,
    /// Ordered submodule titles; the smallest addressable content units.
    pub submodules: Vec<String>,
    /// Learning objectives, passed to the content prompt when present.
    #[serde(default)]
    pub objectives: Vec<String>,
}

/// Errors raised while validating curriculum data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("curriculum must contain at least one module")]
    Empty,
    #[error("module '{0}' has no submodules")]
    NoSubmodules(String),
    #[error("duplicate module id '{0}'")]
    DuplicateModule(String),
    #[error("mentoring module '{0}' is not part of the curriculum")]
    UnknownMentoringModule(String),
}

/// On-disk representation of a curriculum document.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    mentoring_module: String,
    modules: Vec<Module>,
}

/// A student's position in the curriculum.
///
/// `module` indexes the catalog's module order. `submodule` ranges over
/// `0..=len`, where `len` means the module is exhausted and the next
/// presentation must advance to the following module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub module: usize,
    pub submodule: usize,
}

/// The validated, ordered course structure.
#[derive(Debug, Clone)]
pub struct Catalog {
    modules: Vec<Module>,
    mentoring_index: usize,
}

impl Catalog {
    /// Builds a catalog from an ordered module list.
    ///
    /// `mentoring_module` names the module from which mentoring redemption
    /// becomes available.
    pub fn new(modules: Vec<Module>, mentoring_module: &str) -> Result<Self, CatalogError> {
        if modules.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for module in &modules {
            if module.submodules.is_empty() {
                return Err(CatalogError::NoSubmodules(module.id.clone()));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(CatalogError::DuplicateModule(module.id.clone()));
            }
        }
        let mentoring_index = modules
            .iter()
            .position(|m| m.id == mentoring_module)
            .ok_or_else(|| CatalogError::UnknownMentoringModule(mentoring_module.to_string()))?;

        Ok(Self {
            modules,
            mentoring_index,
        })
    }

    /// Parses a JSON curriculum document.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).context("Curriculum document is not valid JSON")?;
        Ok(Self::new(file.modules, &file.mentoring_module)?)
    }

    /// Loads and validates a JSON curriculum document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read curriculum file {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    /// Index of the module following `index`, if any.
    pub fn next_module(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.modules.len()).then_some(next)
    }

    /// The submodule title under the cursor, or `None` when the module is exhausted.
    pub fn submodule(&self, cursor: Cursor) -> Option<&str> {
        self.module(cursor.module)
            .and_then(|m| m.submodules.get(cursor.submodule))
            .map(String::as_str)
    }

    /// Moves the cursor one submodule forward, saturating at the exhausted position.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        let len = self
            .module(cursor.module)
            .map(|m| m.submodules.len())
            .unwrap_or(0);
        Cursor {
            module: cursor.module,
            submodule: (cursor.submodule + 1).min(len),
        }
    }

    /// Whether the cursor has reached the mentoring module in curriculum order.
    pub fn reached_mentoring(&self, cursor: Cursor) -> bool {
        cursor.module >= self.mentoring_index
    }
}
