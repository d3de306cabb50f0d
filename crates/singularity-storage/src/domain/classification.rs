//! # Classification Registry
//!
//! Static taxonomy mapping an item's numeric class to a display label and
//! to at most one named group. Used only by the query filters.
//!
//! The registry is an explicitly constructed value owned by whoever hosts
//! the session and handed to the storage service, never a global.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Numeric item class (negative by convention of the host item model).
pub type ClassId = i32;

/// Well-known class ids.
pub mod classes {
    use super::ClassId;

    pub const GREENS: ClassId = -81;
    pub const GEM: ClassId = -2;
    pub const MINERALS: ClassId = -12;
    pub const METAL_RESOURCES: ClassId = -15;
    pub const BUILDING_RESOURCES: ClassId = -16;

    pub const VEGETABLE: ClassId = -75;
    pub const FRUITS: ClassId = -79;
    pub const FLOWERS: ClassId = -80;
    pub const SEEDS: ClassId = -74;
    pub const ARTISAN_GOODS: ClassId = -26;
    pub const SYRUP: ClassId = -27;
    pub const FERTILIZER: ClassId = -19;

    pub const EGG: ClassId = -5;
    pub const MILK: ClassId = -6;
    pub const MEAT: ClassId = -14;

    pub const COOKING: ClassId = -7;
    pub const INGREDIENTS: ClassId = -25;
    pub const INEDIBLE: ClassId = -300;

    pub const FISH: ClassId = -4;
    pub const BAIT: ClassId = -21;
    pub const TACKLE: ClassId = -22;
    pub const SELL_AT_FISH_SHOP: ClassId = -23;

    pub const CRAFTING: ClassId = -8;
    pub const BIG_CRAFTABLE: ClassId = -9;
    pub const FURNITURE: ClassId = -24;

    pub const TOOL: ClassId = -99;
    pub const WEAPON: ClassId = -98;
    pub const BOOTS: ClassId = -97;
    pub const HAT: ClassId = -95;
    pub const RING: ClassId = -96;
    pub const CLOTHING: ClassId = -100;
    pub const TRINKET: ClassId = -101;

    pub const BOOKS: ClassId = -102;
    pub const SKILL_BOOKS: ClassId = -103;
    pub const MONSTER_LOOT: ClassId = -28;
    pub const JUNK: ClassId = -20;
    pub const LITTER: ClassId = -999;
}

/// Named filter groups, in sidebar display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemGroup {
    BasicResources,
    FarmProduce,
    AnimalProducts,
    FoodAndCooking,
    Fishing,
    Crafting,
    Equipment,
    BooksAndSpecial,
}

impl ItemGroup {
    /// All groups in display order.
    pub const ALL: [ItemGroup; 8] = [
        ItemGroup::BasicResources,
        ItemGroup::FarmProduce,
        ItemGroup::AnimalProducts,
        ItemGroup::FoodAndCooking,
        ItemGroup::Fishing,
        ItemGroup::Crafting,
        ItemGroup::Equipment,
        ItemGroup::BooksAndSpecial,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ItemGroup::BasicResources => "Basic Resources",
            ItemGroup::FarmProduce => "Farm Produce",
            ItemGroup::AnimalProducts => "Animal Products",
            ItemGroup::FoodAndCooking => "Food & Cooking",
            ItemGroup::Fishing => "Fishing",
            ItemGroup::Crafting => "Crafting & Furniture",
            ItemGroup::Equipment => "Gear & Tools",
            ItemGroup::BooksAndSpecial => "Books & Special",
        }
    }
}

impl fmt::Display for ItemGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Group selector used by queries. `All` disables group filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupFilter {
    #[default]
    All,
    Group(ItemGroup),
}

impl GroupFilter {
    pub const ALL_NAME: &'static str = "All";

    pub fn name(self) -> &'static str {
        match self {
            GroupFilter::All => Self::ALL_NAME,
            GroupFilter::Group(group) => group.name(),
        }
    }
}

impl From<ItemGroup> for GroupFilter {
    fn from(group: ItemGroup) -> Self {
        GroupFilter::Group(group)
    }
}

/// One class of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationEntry {
    pub id: ClassId,
    pub label: &'static str,
    pub group: Option<ItemGroup>,
}

impl ClassificationEntry {
    pub const fn new(id: ClassId, label: &'static str, group: Option<ItemGroup>) -> Self {
        Self { id, label, group }
    }
}

/// Label returned for ids the registry does not know.
pub const UNKNOWN_LABEL: &str = "Unknown";

const STANDARD_CLASSES: &[(ClassId, &str, ItemGroup)] = {
    use classes::*;
    use ItemGroup::*;
    &[
        (GREENS, "Forage", BasicResources),
        (GEM, "Gem", BasicResources),
        (MINERALS, "Mineral", BasicResources),
        (METAL_RESOURCES, "Metal Resource", BasicResources),
        (BUILDING_RESOURCES, "Building Resource", BasicResources),
        (VEGETABLE, "Vegetable", FarmProduce),
        (FRUITS, "Fruit", FarmProduce),
        (FLOWERS, "Flower", FarmProduce),
        (SEEDS, "Seed", FarmProduce),
        (ARTISAN_GOODS, "Artisan Goods", FarmProduce),
        (SYRUP, "Syrup", FarmProduce),
        (FERTILIZER, "Fertilizer", FarmProduce),
        (EGG, "Egg", AnimalProducts),
        (MILK, "Milk", AnimalProducts),
        (MEAT, "Meat", AnimalProducts),
        (COOKING, "Cooking", FoodAndCooking),
        (INGREDIENTS, "Ingredient", FoodAndCooking),
        (INEDIBLE, "Inedible", FoodAndCooking),
        (FISH, "Fish", Fishing),
        (BAIT, "Bait", Fishing),
        (TACKLE, "Tackle", Fishing),
        (SELL_AT_FISH_SHOP, "Fish Shop Goods", Fishing),
        (CRAFTING, "Crafting", Crafting),
        (BIG_CRAFTABLE, "Big Craftable", Crafting),
        (FURNITURE, "Furniture", Crafting),
        (TOOL, "Tool", Equipment),
        (WEAPON, "Weapon", Equipment),
        (BOOTS, "Boots", Equipment),
        (HAT, "Hat", Equipment),
        (RING, "Ring", Equipment),
        (CLOTHING, "Clothing", Equipment),
        (TRINKET, "Trinket", Equipment),
        (BOOKS, "Book", BooksAndSpecial),
        (SKILL_BOOKS, "Skill Book", BooksAndSpecial),
        (MONSTER_LOOT, "Monster Loot", BooksAndSpecial),
        (JUNK, "Junk", BooksAndSpecial),
        (LITTER, "Litter", BooksAndSpecial),
    ]
};

/// Immutable class taxonomy.
#[derive(Debug, Clone)]
pub struct ClassificationRegistry {
    entries: HashMap<ClassId, ClassificationEntry>,
    /// Member classes per group, in registration order.
    members: HashMap<ItemGroup, Vec<ClassId>>,
}

impl ClassificationRegistry {
    /// The full taxonomy of the host item model.
    pub fn standard() -> Self {
        Self::from_entries(
            STANDARD_CLASSES
                .iter()
                .map(|&(id, label, group)| ClassificationEntry::new(id, label, Some(group))),
        )
    }

    /// Build a registry from arbitrary entries. A later duplicate id wins.
    pub fn from_entries(entries: impl IntoIterator<Item = ClassificationEntry>) -> Self {
        let mut by_id = HashMap::new();
        let mut members: HashMap<ItemGroup, Vec<ClassId>> = HashMap::new();

        for entry in entries {
            if let Some(previous) = by_id.insert(entry.id, entry.clone()) {
                if let Some(group) = previous.group {
                    if let Some(list) = members.get_mut(&group) {
                        list.retain(|id| *id != previous.id);
                    }
                }
            }
            if let Some(group) = entry.group {
                members.entry(group).or_default().push(entry.id);
            }
        }

        Self {
            entries: by_id,
            members,
        }
    }

    pub fn entry(&self, class: ClassId) -> Option<&ClassificationEntry> {
        self.entries.get(&class)
    }

    /// Display label, `"Unknown"` for unregistered ids.
    pub fn label(&self, class: ClassId) -> &'static str {
        self.entries
            .get(&class)
            .map(|entry| entry.label)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn group_of(&self, class: ClassId) -> Option<ItemGroup> {
        self.entries.get(&class).and_then(|entry| entry.group)
    }

    pub fn is_in_group(&self, class: ClassId, filter: GroupFilter) -> bool {
        match filter {
            GroupFilter::All => true,
            GroupFilter::Group(group) => self.group_of(class) == Some(group),
        }
    }

    /// Member classes of a group in display order.
    pub fn classes_in(&self, group: ItemGroup) -> &[ClassId] {
        self.members.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sidebar tabs: `All` followed by every group in display order.
    pub fn tabs(&self) -> Vec<GroupFilter> {
        std::iter::once(GroupFilter::All)
            .chain(ItemGroup::ALL.iter().copied().map(GroupFilter::Group))
            .collect()
    }

    /// Resolve a tab name back to its filter.
    pub fn group_by_name(&self, name: &str) -> Option<GroupFilter> {
        self.tabs()
            .into_iter()
            .find(|filter| filter.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ClassificationRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
