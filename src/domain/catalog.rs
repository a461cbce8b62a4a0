//! The static symbol catalog.
//!
//! A fixed, process-wide mapping from model class indices to symbol keys and
//! from symbol keys to display data (category, icon, description). Loaded
//! once, never mutated, and shared by the automatic detection path and the
//! manual-selection path so the two cannot diverge.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Glyph shown for a symbol key with no catalog entry.
pub const PLACEHOLDER_ICON: &str = "?";

/// Description shown for a symbol key with no catalog entry.
pub const UNKNOWN_DESCRIPTION: &str = "Unknown symbol";

/// One of the five treatment families a care symbol belongs to.
///
/// The declaration order is the fixed display order used when sorting
/// enriched results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Washing,
    Bleaching,
    Drying,
    Ironing,
    DryCleaning,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 5] = [
        Category::Washing,
        Category::Bleaching,
        Category::Drying,
        Category::Ironing,
        Category::DryCleaning,
    ];

    /// Stable identifier for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Washing => "washing",
            Category::Bleaching => "bleaching",
            Category::Drying => "drying",
            Category::Ironing => "ironing",
            Category::DryCleaning => "dry_cleaning",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display data for one care symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Stable identifier for the symbol.
    pub key: &'static str,
    /// Treatment family the symbol belongs to.
    pub category: Category,
    /// Display glyph.
    pub icon: &'static str,
    /// Human-readable instruction.
    pub description: &'static str,
}

const fn symbol(
    key: &'static str,
    category: Category,
    icon: &'static str,
    description: &'static str,
) -> SymbolInfo {
    SymbolInfo {
        key,
        category,
        icon,
        description,
    }
}

/// Every symbol the catalog knows, grouped by category.
const SYMBOLS: &[SymbolInfo] = &[
    // Washing
    symbol("wash_30", Category::Washing, "30°", "Machine wash at 30°C"),
    symbol("wash_40", Category::Washing, "40°", "Machine wash at 40°C"),
    symbol("wash_60", Category::Washing, "60°", "Machine wash at 60°C"),
    symbol("wash_95", Category::Washing, "95°", "Machine wash at 95°C"),
    symbol("wash_mild_30", Category::Washing, "30°", "Gentle wash at 30°C"),
    symbol("wash_mild_40", Category::Washing, "40°", "Gentle wash at 40°C"),
    symbol("hand_wash", Category::Washing, "🤲", "Hand wash only"),
    symbol("no_wash", Category::Washing, "🚫", "Do not wash"),
    symbol("do_not_wash", Category::Washing, "🚫", "Do not wash"),
    // Bleaching
    symbol("bleach_ok", Category::Bleaching, "△", "Bleaching allowed"),
    symbol("bleach_allowed", Category::Bleaching, "△", "Bleaching allowed"),
    symbol(
        "non_chlorine_bleach",
        Category::Bleaching,
        "△̸",
        "Non-chlorine bleach only",
    ),
    symbol(
        "bleach_special",
        Category::Bleaching,
        "△̸",
        "Special bleach only",
    ),
    symbol("no_bleach", Category::Bleaching, "🚫△", "Do not bleach"),
    symbol("do_not_bleach", Category::Bleaching, "🚫△", "Do not bleach"),
    // Drying
    symbol(
        "tumble_dry_normal",
        Category::Drying,
        "◯",
        "Tumble dry, normal heat",
    ),
    symbol("tumble_dry_low", Category::Drying, "◯•", "Tumble dry, low heat"),
    symbol(
        "tumble_dry_high",
        Category::Drying,
        "◯••",
        "Tumble dry, high heat",
    ),
    symbol("no_tumble_dry", Category::Drying, "🚫◯", "Do not tumble dry"),
    symbol("line_dry", Category::Drying, "│", "Line dry"),
    symbol("flat_dry", Category::Drying, "═", "Dry flat"),
    // Ironing
    symbol("iron_low", Category::Ironing, "•", "Iron at low temperature"),
    symbol("iron_110", Category::Ironing, "•", "Iron, max 110°C"),
    symbol("iron_medium", Category::Ironing, "••", "Iron at medium temperature"),
    symbol("iron_150", Category::Ironing, "••", "Iron, max 150°C"),
    symbol("iron_high", Category::Ironing, "•••", "Iron at high temperature"),
    symbol("iron_200", Category::Ironing, "•••", "Iron, max 200°C"),
    symbol("no_iron", Category::Ironing, "🚫", "Do not iron"),
    symbol("no_steam", Category::Ironing, "⚡", "Do not steam"),
    // Dry cleaning
    symbol("dry_clean", Category::DryCleaning, "○", "Dry clean"),
    symbol(
        "dry_clean_P",
        Category::DryCleaning,
        "Ⓟ",
        "Dry clean with P solvents",
    ),
    symbol(
        "dry_clean_P_normal",
        Category::DryCleaning,
        "Ⓟ",
        "Dry clean with P solvents",
    ),
    symbol(
        "dry_clean_P_mild",
        Category::DryCleaning,
        "Ⓟ",
        "Gentle dry clean with P solvents",
    ),
    symbol(
        "dry_clean_petroleum",
        Category::DryCleaning,
        "P",
        "Dry clean with petroleum solvent only",
    ),
    symbol(
        "gentle_dry_clean",
        Category::DryCleaning,
        "F",
        "Gentle dry clean",
    ),
    symbol("no_dry_clean", Category::DryCleaning, "🚫○", "Do not dry clean"),
];

/// Model class index → symbol key, in the order the model was trained.
///
/// Several classes intentionally map to the same key; the training data
/// contains visual variants of one logical symbol.
const CLASS_MAP: [&str; 31] = [
    "do_not_wash",        // 0
    "do_not_bleach",      // 1
    "iron_low",           // 2
    "dry_clean_P",        // 3
    "no_tumble_dry",      // 4
    "no_wash",            // 5
    "no_bleach",          // 6
    "iron_110",           // 7
    "wash_40",            // 8
    "iron_150",           // 9
    "dry_clean_P_normal", // 10
    "wash_40",            // 11
    "no_bleach",          // 12
    "no_tumble_dry",      // 13
    "iron_150",           // 14
    "dry_clean_P",        // 15
    "wash_30",            // 16
    "iron_110",           // 17
    "no_dry_clean",       // 18
    "dry_clean_P_mild",   // 19
    "hand_wash",          // 20
    "bleach_ok",          // 21
    "tumble_dry_low",     // 22
    "wash_mild_30",       // 23
    "wash_mild_40",       // 24
    "no_iron",            // 25
    "wash_mild_40",       // 26
    "bleach_special",     // 27
    "tumble_dry_normal",  // 28
    "iron_200",           // 29
    "no_wash",            // 30
];

static GLOBAL: Lazy<SymbolCatalog> = Lazy::new(SymbolCatalog::builtin);

/// The fixed mapping between model classes, symbol keys, and display data.
#[derive(Debug)]
pub struct SymbolCatalog {
    by_key: HashMap<&'static str, &'static SymbolInfo>,
    class_map: &'static [&'static str],
}

impl SymbolCatalog {
    /// Builds the build-time catalog.
    fn builtin() -> Self {
        let mut by_key = HashMap::with_capacity(SYMBOLS.len());
        for info in SYMBOLS {
            by_key.insert(info.key, info);
        }
        Self {
            by_key,
            class_map: &CLASS_MAP,
        }
    }

    /// Returns the process-wide catalog instance.
    pub fn global() -> &'static SymbolCatalog {
        &GLOBAL
    }

    /// Number of model classes the catalog maps.
    pub fn num_classes(&self) -> usize {
        self.class_map.len()
    }

    /// Looks up display data for a symbol key.
    pub fn lookup(&self, key: &str) -> Option<&'static SymbolInfo> {
        self.by_key.get(key).copied()
    }

    /// Resolves a model class index to its symbol.
    ///
    /// Returns `None` for indices outside the class map or whose key has no
    /// catalog entry; such detections are dropped, not errored.
    pub fn resolve_class(&self, index: usize) -> Option<&'static SymbolInfo> {
        let key = self.class_map.get(index)?;
        self.lookup(key)
    }

    /// Category of a symbol key, if known.
    pub fn category_of(&self, key: &str) -> Option<Category> {
        self.lookup(key).map(|info| info.category)
    }

    /// All symbols in one category, in catalog order.
    pub fn symbols_in(&self, category: Category) -> impl Iterator<Item = &'static SymbolInfo> {
        SYMBOLS.iter().filter(move |info| info.category == category)
    }

    /// Catalog view for the manual-selection flow: every category in display
    /// order, each with its selectable symbols.
    pub fn by_category(&self) -> Vec<(Category, Vec<&'static SymbolInfo>)> {
        Category::ALL
            .iter()
            .map(|&category| (category, self.symbols_in(category).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn class_16_resolves_to_wash_30() {
        let catalog = SymbolCatalog::global();
        let info = catalog.resolve_class(16).unwrap();
        assert_eq!(info.key, "wash_30");
        assert_eq!(info.category, Category::Washing);
    }

    #[test]
    fn every_class_index_resolves() {
        let catalog = SymbolCatalog::global();
        for index in 0..catalog.num_classes() {
            assert!(
                catalog.resolve_class(index).is_some(),
                "class {index} has no catalog entry"
            );
        }
        assert!(catalog.resolve_class(catalog.num_classes()).is_none());
    }

    #[test]
    fn every_category_has_selectable_symbols() {
        let catalog = SymbolCatalog::global();
        for (category, symbols) in catalog.by_category() {
            assert!(!symbols.is_empty(), "{category} has no symbols");
            for info in symbols {
                assert_eq!(info.category, category);
            }
        }
    }

    #[test]
    fn keys_are_unique() {
        let mut seen = HashSet::new();
        for info in SYMBOLS {
            assert!(seen.insert(info.key), "duplicate key {}", info.key);
        }
    }

    #[test]
    fn category_order_is_fixed() {
        assert!(Category::Washing < Category::Bleaching);
        assert!(Category::Bleaching < Category::Drying);
        assert!(Category::Drying < Category::Ironing);
        assert!(Category::Ironing < Category::DryCleaning);
        assert_eq!(Category::DryCleaning.as_str(), "dry_cleaning");
    }
}
