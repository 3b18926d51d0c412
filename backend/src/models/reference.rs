//! External reference lists
//!
//! Read-only snapshots refreshed outside this crate:
//! - registered supplier registry (`padrón de proveedores`)
//! - ghost-company registry (tax authority article 69-B list)
//! - taxpayers the tax authority could not locate
//! - sanctioned suppliers
//! - sanctioned individuals
//!
//! Entries carry a name and/or a tax ID. Names are always passed through the
//! name normalizer when a list is indexed; normalization is idempotent so
//! lists that were normalized upstream are unaffected.

use crate::core::names::normalize_optional;
use crate::core::tax_id::normalize_tax_id;
use crate::models::keys::SupplierKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A name / tax ID pair from a reference list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl ReferenceEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            tax_id: None,
        }
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    pub fn tax_id_only(tax_id: impl Into<String>) -> Self {
        Self {
            name: None,
            tax_id: Some(tax_id.into()),
        }
    }
}

/// Taxpayer situation in the ghost-company registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostStatus {
    /// Definitively declared as simulating operations
    #[serde(alias = "Definitivo")]
    Definitive,

    /// Presumed to simulate operations, procedure still open
    #[serde(alias = "Presunto")]
    Presumed,

    /// Taxpayer disproved the presumption
    #[serde(alias = "Desvirtuado")]
    Distorted,

    /// Taxpayer won a court ruling
    #[serde(alias = "Sentencia Favorable", alias = "Sentencia favorable")]
    FavorableRuling,

    #[serde(other)]
    Other,
}

impl GhostStatus {
    /// Only definitive and presumed entries count as ghost companies
    pub fn counts_as_ghost(&self) -> bool {
        matches!(self, GhostStatus::Definitive | GhostStatus::Presumed)
    }
}

/// One entry of the ghost-company registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostCompanyEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    pub status: GhostStatus,
}

impl GhostCompanyEntry {
    pub fn new(name: impl Into<String>, tax_id: impl Into<String>, status: GhostStatus) -> Self {
        Self {
            name: Some(name.into()),
            tax_id: Some(tax_id.into()),
            status,
        }
    }
}

/// All reference tables, as handed over by the loaders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceTables {
    pub registered_suppliers: Vec<ReferenceEntry>,
    pub ghost_companies: Vec<GhostCompanyEntry>,
    pub not_located: Vec<ReferenceEntry>,
    pub sanctioned_suppliers: Vec<ReferenceEntry>,
    pub sanctioned_individuals: Vec<ReferenceEntry>,
}

/// Membership index over one reference list
///
/// # Example
/// ```
/// use procurement_risk_core::models::{ReferenceEntry, ReferenceList, SupplierKey};
///
/// let list = ReferenceList::from_entries(&[
///     ReferenceEntry::named("Acme, S.A. de C.V.").with_tax_id("ACM180101AB1"),
/// ]);
///
/// assert!(list.contains_name(&SupplierKey::new("ACME")));
/// assert!(list.contains_tax_id(Some("ACM180101AB1")));
/// assert!(!list.contains_tax_id(None));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReferenceList {
    names: HashSet<String>,
    tax_ids: HashSet<String>,
}

impl ReferenceList {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a ReferenceEntry>,
    {
        let mut list = Self::default();
        for entry in entries {
            list.add(entry.name.as_deref(), entry.tax_id.as_deref());
        }
        list
    }

    /// Index the ghost registry, keeping only definitive and presumed entries
    pub fn from_ghost_registry<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a GhostCompanyEntry>,
    {
        let mut list = Self::default();
        for entry in entries.into_iter().filter(|e| e.status.counts_as_ghost()) {
            list.add(entry.name.as_deref(), entry.tax_id.as_deref());
        }
        list
    }

    fn add(&mut self, name: Option<&str>, tax_id: Option<&str>) {
        if let Some(name) = normalize_optional(name) {
            self.names.insert(name);
        }
        if let Some(tax_id) = tax_id.and_then(normalize_tax_id) {
            self.tax_ids.insert(tax_id);
        }
    }

    pub fn contains_name(&self, key: &SupplierKey) -> bool {
        self.names.contains(key.as_str())
    }

    /// A missing tax ID is never a member
    pub fn contains_tax_id(&self, tax_id: Option<&str>) -> bool {
        tax_id.map_or(false, |id| self.tax_ids.contains(id))
    }

    pub fn num_names(&self) -> usize {
        self.names.len()
    }

    pub fn num_tax_ids(&self) -> usize {
        self.tax_ids.len()
    }
}

/// Indexed reference lists used by the cross-reference calculators
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    pub registered_suppliers: ReferenceList,
    pub ghost_companies: ReferenceList,
    pub not_located: ReferenceList,
    pub sanctioned_suppliers: ReferenceList,
    pub sanctioned_individuals: ReferenceList,
}

impl ReferenceIndex {
    pub fn build(tables: &ReferenceTables) -> Self {
        Self {
            registered_suppliers: ReferenceList::from_entries(&tables.registered_suppliers),
            ghost_companies: ReferenceList::from_ghost_registry(&tables.ghost_companies),
            not_located: ReferenceList::from_entries(&tables.not_located),
            sanctioned_suppliers: ReferenceList::from_entries(&tables.sanctioned_suppliers),
            sanctioned_individuals: ReferenceList::from_entries(&tables.sanctioned_individuals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ghost_registry_filters_statuses() {
        let entries = vec![
            GhostCompanyEntry::new("UNO SA DE CV", "UNO180101AA1", GhostStatus::Definitive),
            GhostCompanyEntry::new("DOS SA DE CV", "DOS180101AA1", GhostStatus::Presumed),
            GhostCompanyEntry::new("TRES SA DE CV", "TRE180101AA1", GhostStatus::Distorted),
            GhostCompanyEntry::new("CUATRO SA DE CV", "CUA180101AA1", GhostStatus::FavorableRuling),
        ];
        let list = ReferenceList::from_ghost_registry(&entries);

        assert!(list.contains_name(&SupplierKey::new("UNO")));
        assert!(list.contains_name(&SupplierKey::new("DOS")));
        assert!(!list.contains_name(&SupplierKey::new("TRES")));
        assert!(!list.contains_tax_id(Some("CUA180101AA1")));
        assert_eq!(list.num_names(), 2);
    }

    #[test]
    fn test_ghost_status_spanish_labels() {
        let status: GhostStatus = serde_json::from_str("\"Definitivo\"").unwrap();
        assert_eq!(status, GhostStatus::Definitive);
        let status: GhostStatus = serde_json::from_str("\"Sentencia Favorable\"").unwrap();
        assert_eq!(status, GhostStatus::FavorableRuling);
        let status: GhostStatus = serde_json::from_str("\"Otro\"").unwrap();
        assert_eq!(status, GhostStatus::Other);
    }
}
