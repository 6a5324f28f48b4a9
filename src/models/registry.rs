//! Name → function lookup for fit requests.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::models::model::{CATALOG, FitFunction};

/// Registry of fit functions keyed by name.
#[derive(Debug, Clone)]
pub struct FitRegistry {
    functions: HashMap<&'static str, FitFunction>,
}

impl FitRegistry {
    /// Build a registry from an explicit list of functions.
    pub fn from_functions(functions: &[FitFunction]) -> Self {
        Self {
            functions: functions.iter().map(|f| (f.name, *f)).collect(),
        }
    }

    /// The built-in catalog, built on first use.
    pub fn builtin() -> &'static FitRegistry {
        static REGISTRY: OnceLock<FitRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| FitRegistry::from_functions(CATALOG))
    }

    pub fn resolve(&self, name: &str) -> Result<&FitFunction> {
        self.functions
            .get(name)
            .ok_or_else(|| Error::UnknownFit(name.to_string()))
    }

    /// Registered functions sorted by name.
    pub fn functions(&self) -> Vec<&FitFunction> {
        let mut out: Vec<&FitFunction> = self.functions.values().collect();
        out.sort_by_key(|f| f.name);
        out
    }
}
