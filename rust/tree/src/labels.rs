// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display labels for IFC entity types.

use std::cmp::Ordering;

/// IFC entity type names with a friendly display label.
const FRIENDLY_NAMES: &[(&str, &str)] = &[
    ("IFCPROJECT", "Project"),
    ("IFCSITE", "Site"),
    ("IFCBUILDING", "Building"),
    ("IFCBUILDINGSTOREY", "Storey"),
    ("IFCSPACE", "Space"),
    ("IFCWALL", "Wall"),
    ("IFCWINDOW", "Window"),
    ("IFCDOOR", "Door"),
    ("IFCCOLUMN", "Column"),
    ("IFCSLAB", "Slab"),
    ("IFCBEAM", "Beam"),
    ("IFCFURNITUREELEMENT", "Furniture"),
    ("IFCSTAIR", "Stair"),
    ("IFCRAILING", "Railing"),
    ("IFCROOF", "Roof"),
    ("IFCMEMBER", "Member"),
    ("IFCPLATE", "Plate"),
];

/// Entity type of the project root.
pub const PROJECT_TYPE: &str = "IFCPROJECT";

/// Friendly label for the project root.
pub const PROJECT_LABEL: &str = "Project";

/// Friendly label for an IFC type name (`IFCBUILDINGSTOREY` -> `Storey`).
///
/// Unknown types come back upper-cased; an empty name is `Unknown`.
pub fn friendly_name(ifc_type: &str) -> String {
    if ifc_type.is_empty() {
        return "Unknown".to_string();
    }
    known_friendly_name(ifc_type)
        .map(str::to_string)
        .unwrap_or_else(|| ifc_type.to_uppercase())
}

/// Friendly label only for types in the label table.
pub fn known_friendly_name(ifc_type: &str) -> Option<&'static str> {
    FRIENDLY_NAMES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(ifc_type))
        .map(|(_, label)| *label)
}

/// Plural form of a friendly label, used for type-group headers.
///
/// Consonant + `y` becomes `ies`; everything else takes `s` (`Storey` ->
/// `Storeys`, `Assembly` -> `Assemblies`).
pub fn plural(label: &str) -> String {
    if let Some(stem) = label.strip_suffix('y') {
        let after_vowel = stem
            .chars()
            .last()
            .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'));
        if !after_vowel {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", label)
}

/// Sort rank of a friendly label among root nodes. Unranked labels sort last.
pub fn spatial_priority(label: Option<&str>) -> u8 {
    match label {
        Some("Project") => 1,
        Some("Site") => 2,
        Some("Building") => 3,
        Some("Storey") => 4,
        Some("Space") => 5,
        _ => 100,
    }
}

/// Display-name ordering: case-insensitive first, raw bytes to break ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Ordering for root spatial nodes: semantic priority, then type label, then name.
pub fn compare_roots(
    a_label: Option<&str>,
    a_name: &str,
    b_label: Option<&str>,
    b_name: &str,
) -> Ordering {
    spatial_priority(a_label)
        .cmp(&spatial_priority(b_label))
        .then_with(|| a_label.cmp(&b_label))
        .then_with(|| compare_names(a_name, b_name))
}
