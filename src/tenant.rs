//! Tenant identity: a (county, structure) pair.
//!
//! Passed explicitly to every call that needs it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A county: registration code and display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct County {
    pub code: &'static str,
    pub name: &'static str,
}

/// Counties of Romania, plus the capital.
pub const COUNTIES: &[County] = &[
    County { code: "AB", name: "Alba" },
    County { code: "AR", name: "Arad" },
    County { code: "AG", name: "Argeș" },
    County { code: "BC", name: "Bacău" },
    County { code: "BH", name: "Bihor" },
    County { code: "BN", name: "Bistrița-Năsăud" },
    County { code: "BT", name: "Botoșani" },
    County { code: "BR", name: "Brăila" },
    County { code: "BV", name: "Brașov" },
    County { code: "B", name: "București" },
    County { code: "BZ", name: "Buzău" },
    County { code: "CL", name: "Călărași" },
    County { code: "CS", name: "Caraș-Severin" },
    County { code: "CJ", name: "Cluj" },
    County { code: "CT", name: "Constanța" },
    County { code: "CV", name: "Covasna" },
    County { code: "DB", name: "Dâmbovița" },
    County { code: "DJ", name: "Dolj" },
    County { code: "GL", name: "Galați" },
    County { code: "GR", name: "Giurgiu" },
    County { code: "GJ", name: "Gorj" },
    County { code: "HR", name: "Harghita" },
    County { code: "HD", name: "Hunedoara" },
    County { code: "IL", name: "Ialomița" },
    County { code: "IS", name: "Iași" },
    County { code: "IF", name: "Ilfov" },
    County { code: "MM", name: "Maramureș" },
    County { code: "MH", name: "Mehedinți" },
    County { code: "MS", name: "Mureș" },
    County { code: "NT", name: "Neamț" },
    County { code: "OT", name: "Olt" },
    County { code: "PH", name: "Prahova" },
    County { code: "SM", name: "Satu Mare" },
    County { code: "SJ", name: "Sălaj" },
    County { code: "SB", name: "Sibiu" },
    County { code: "SV", name: "Suceava" },
    County { code: "TR", name: "Teleorman" },
    County { code: "TM", name: "Timiș" },
    County { code: "TL", name: "Tulcea" },
    County { code: "VS", name: "Vaslui" },
    County { code: "VL", name: "Vâlcea" },
    County { code: "VN", name: "Vrancea" },
];

/// Structures present in every county.
pub const BASE_STRUCTURES: &[&str] = &["ISU", "IPJ", "IJJ"];

/// Structures present only in the capital.
pub const CAPITAL_STRUCTURES: &[&str] = &["IGSU", "IGJR", "IGPR", "MAI"];

/// Code of the capital.
pub const CAPITAL_CODE: &str = "B";

/// Look up a county by code (case-insensitive).
pub fn county(code: &str) -> Option<&'static County> {
    let code = code.trim();
    COUNTIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Structures available in a county.
pub fn structures_for(county_code: &str) -> Vec<&'static str> {
    let mut structures = BASE_STRUCTURES.to_vec();
    if county_code.trim().eq_ignore_ascii_case(CAPITAL_CODE) {
        structures.extend_from_slice(CAPITAL_STRUCTURES);
    }
    structures
}

/// A (county, structure) pair identifying whose data and branding apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    /// County code, e.g. "AB"
    pub county: String,

    /// Structure code, e.g. "ISU"
    pub structure: String,
}

impl Tenant {
    /// Create a tenant.
    pub fn new(county: impl Into<String>, structure: impl Into<String>) -> Self {
        Self {
            county: county.into(),
            structure: structure.into(),
        }
    }

    /// County display name; unknown codes display as themselves.
    pub fn county_name(&self) -> &str {
        county(&self.county).map(|c| c.name).unwrap_or(self.county.trim())
    }

    /// `"<structure> <county name>"`, or `None` when either part is blank.
    pub fn structure_display(&self) -> Option<String> {
        let structure = self.structure.trim();
        let county = self.county_name();
        if structure.is_empty() || county.is_empty() {
            None
        } else {
            Some(format!("{} {}", structure, county))
        }
    }

    /// Check if the structure exists in the county.
    pub fn is_known(&self) -> bool {
        county(&self.county).is_some()
            && structures_for(&self.county)
                .iter()
                .any(|s| s.eq_ignore_ascii_case(self.structure.trim()))
    }
}

impl Default for Tenant {
    fn default() -> Self {
        Self::new("DB", "ISU")
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.county, self.structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_county_table() {
        assert_eq!(COUNTIES.len(), 42);
        assert_eq!(county("ab").map(|c| c.name), Some("Alba"));
        assert_eq!(county("B").map(|c| c.name), Some("București"));
        assert!(county("XX").is_none());
    }

    #[test]
    fn test_structure_display() {
        assert_eq!(
            Tenant::new("AB", "ISU").structure_display().as_deref(),
            Some("ISU Alba")
        );
        assert_eq!(
            Tenant::new("ZZ", "IPJ").structure_display().as_deref(),
            Some("IPJ ZZ")
        );
        assert_eq!(Tenant::new("AB", " ").structure_display(), None);
        assert_eq!(Tenant::new("", "ISU").structure_display(), None);
    }

    #[test]
    fn test_structures_for_capital() {
        assert_eq!(structures_for("AB"), vec!["ISU", "IPJ", "IJJ"]);
        let capital = structures_for("B");
        assert_eq!(capital.len(), 7);
        assert!(capital.contains(&"IGSU"));
        assert!(Tenant::new("B", "MAI").is_known());
        assert!(!Tenant::new("AB", "MAI").is_known());
    }

    #[test]
    fn test_default_tenant() {
        let tenant = Tenant::default();
        assert_eq!(tenant.to_string(), "DB/ISU");
        assert_eq!(tenant.structure_display().as_deref(), Some("ISU Dâmbovița"));
    }
}
