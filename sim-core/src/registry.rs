//! C2: static content registry (§4.2). Tables are built once at process start and
//! read concurrently without locking — every lookup is by plain reference into
//! `'static`-lived owned tables held behind an `Arc` the caller clones cheaply.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolTier(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolType {
    None,
    Pickaxe,
    Axe,
    Shovel,
    Sword,
}

#[derive(Debug, Clone)]
pub struct ItemDrop {
    pub item_id: String,
    pub chance: f64,
}

#[derive(Debug, Clone)]
pub struct BlockProps {
    pub id: String,
    pub hardness: f64,
    pub preferred_tool: ToolType,
    pub required_tier: ToolTier,
    pub drops: Vec<ItemDrop>,
    pub walkable: bool,
    pub solid: bool,
    pub light_emission: u8,
}

#[derive(Debug, Clone)]
pub struct ItemProps {
    pub id: String,
    pub max_stack: u32,
    pub tool_type: ToolType,
    pub mining_speed: f64,
    pub tool_tier: ToolTier,
    pub damage: u32,
    pub edible_hunger_restore: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct MobStats {
    pub id: String,
    pub health: i32,
    pub damage: i32,
    pub speed: u32,
    pub hostile: bool,
    pub drops: Vec<ItemDrop>,
}

#[derive(Debug, Clone)]
pub enum StationPredicate {
    None,
    NeedsCraftingTable,
    NeedsFurnace,
}

#[derive(Debug, Clone)]
pub struct RecipeIngredient {
    pub item_id: String,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub output_item: String,
    pub output_count: u32,
    pub station: StationPredicate,
}

/// An inventory slot count lookup used by `CanCraft`; callers supply their own
/// inventory representation keyed by item id.
pub trait InventoryQuery {
    fn count_of(&self, item_id: &str) -> u32;
}

#[derive(Debug, Default)]
pub struct ContentRegistry {
    blocks: HashMap<String, BlockProps>,
    items: HashMap<String, ItemProps>,
    mobs: HashMap<String, MobStats>,
    recipes: Vec<Recipe>,
}

impl ContentRegistry {
    pub fn builder() -> ContentRegistryBuilder {
        ContentRegistryBuilder::default()
    }

    pub fn block(&self, id: &str) -> Option<&BlockProps> {
        self.blocks.get(id)
    }

    pub fn item(&self, id: &str) -> Option<&ItemProps> {
        self.items.get(id)
    }

    pub fn mob(&self, id: &str) -> Option<&MobStats> {
        self.mobs.get(id)
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// `CanCraft(recipe, inventory, nearCraftingTable, nearFurnace)` (§4.2): true iff
    /// every ingredient is present in sufficient quantity and the recipe's required
    /// station predicate holds.
    pub fn can_craft(
        &self,
        recipe: &Recipe,
        inventory: &dyn InventoryQuery,
        near_crafting_table: bool,
        near_furnace: bool,
    ) -> bool {
        let station_ok = match recipe.station {
            StationPredicate::None => true,
            StationPredicate::NeedsCraftingTable => near_crafting_table,
            StationPredicate::NeedsFurnace => near_furnace,
        };
        if !station_ok {
            return false;
        }
        recipe
            .ingredients
            .iter()
            .all(|ing| inventory.count_of(&ing.item_id) >= ing.count)
    }
}

#[derive(Default)]
pub struct ContentRegistryBuilder {
    reg: ContentRegistry,
}

impl ContentRegistryBuilder {
    pub fn block(mut self, props: BlockProps) -> Self {
        self.reg.blocks.insert(props.id.clone(), props);
        self
    }

    pub fn item(mut self, props: ItemProps) -> Self {
        self.reg.items.insert(props.id.clone(), props);
        self
    }

    pub fn mob(mut self, stats: MobStats) -> Self {
        self.reg.mobs.insert(stats.id.clone(), stats);
        self
    }

    pub fn recipe(mut self, recipe: Recipe) -> Self {
        self.reg.recipes.push(recipe);
        self
    }

    pub fn build(self) -> ContentRegistry {
        self.reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeInventory(HashMap<String, u32>);
    impl InventoryQuery for FakeInventory {
        fn count_of(&self, item_id: &str) -> u32 {
            *self.0.get(item_id).unwrap_or(&0)
        }
    }

    #[test]
    fn can_craft_checks_ingredients_and_station() {
        let recipe = Recipe {
            id: "pickaxe".into(),
            ingredients: vec![
                RecipeIngredient { item_id: "stick".into(), count: 2 },
                RecipeIngredient { item_id: "stone".into(), count: 3 },
            ],
            output_item: "stone_pickaxe".into(),
            output_count: 1,
            station: StationPredicate::NeedsCraftingTable,
        };
        let mut inv = HashMap::new();
        inv.insert("stick".to_string(), 2);
        inv.insert("stone".to_string(), 3);
        let inv = FakeInventory(inv);

        let reg = ContentRegistry::default();
        assert!(!reg.can_craft(&recipe, &inv, false, false));
        assert!(reg.can_craft(&recipe, &inv, true, false));
    }

    #[test]
    fn can_craft_fails_on_insufficient_ingredients() {
        let recipe = Recipe {
            id: "pickaxe".into(),
            ingredients: vec![RecipeIngredient { item_id: "stone".into(), count: 5 }],
            output_item: "x".into(),
            output_count: 1,
            station: StationPredicate::None,
        };
        let inv = FakeInventory(HashMap::from([("stone".to_string(), 4)]));
        let reg = ContentRegistry::default();
        assert!(!reg.can_craft(&recipe, &inv, false, false));
    }
}
