// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::constants::{
    RECIPE_REFINE_STEEL, RESOURCE_FUEL, RESOURCE_IRON_ORE, RESOURCE_STEEL,
};
use crate::common::error::GraphError;
use crate::domain::types::PriceMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fixed input -> output conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub inputs: BTreeMap<String, u64>,
    pub outputs: BTreeMap<String, u64>,
    pub fixed_overhead: f64,
    #[serde(default)]
    pub process_time_seconds: u32,
    #[serde(default)]
    pub energy_cost_kw: u32,
}

impl Recipe {
    /// 250 Iron Ore + 20 Fuel -> 100 Steel at 480 kW.
    pub fn refine_steel(fixed_overhead: f64) -> Self {
        Self {
            name: RECIPE_REFINE_STEEL.to_string(),
            inputs: BTreeMap::from([
                (RESOURCE_IRON_ORE.to_string(), 250),
                (RESOURCE_FUEL.to_string(), 20),
            ]),
            outputs: BTreeMap::from([(RESOURCE_STEEL.to_string(), 100)]),
            fixed_overhead,
            process_time_seconds: 10,
            energy_cost_kw: 480,
        }
    }
}

/// Recipe registry. Holds no price state: profitability is a function of the
/// recipe and the price map passed in.
#[derive(Debug, Clone, Default)]
pub struct SupplyChainGraph {
    recipes: HashMap<String, Recipe>,
    // output resource -> names of recipes producing it
    producers: HashMap<String, BTreeSet<String>>,
}

impl SupplyChainGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(refine_overhead: f64) -> Self {
        let mut graph = Self::new();
        graph.register_recipe(Recipe::refine_steel(refine_overhead));
        graph
    }

    /// Insert or overwrite a recipe by name.
    pub fn register_recipe(&mut self, recipe: Recipe) {
        if let Some(previous) = self.recipes.remove(&recipe.name) {
            for output in previous.outputs.keys() {
                if let Some(names) = self.producers.get_mut(output) {
                    names.remove(&previous.name);
                    if names.is_empty() {
                        self.producers.remove(output);
                    }
                }
            }
        }
        for output in recipe.outputs.keys() {
            self.producers
                .entry(output.clone())
                .or_default()
                .insert(recipe.name.clone());
        }
        self.recipes.insert(recipe.name.clone(), recipe);
    }

    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    /// Sorted names of the recipes that output `resource`.
    pub fn find_production_path(&self, resource: &str) -> Option<Vec<String>> {
        self.producers
            .get(resource)
            .map(|names| names.iter().cloned().collect())
    }

    /// `Σ out×price − (Σ in×price + overhead)`. A missing price is an error, never zero.
    pub fn calculate_profitability(
        &self,
        recipe_name: &str,
        prices: &PriceMap,
    ) -> Result<f64, GraphError> {
        let recipe = self
            .recipes
            .get(recipe_name)
            .ok_or_else(|| GraphError::UnknownRecipe(recipe_name.to_string()))?;

        let value_of = |items: &BTreeMap<String, u64>| -> Result<f64, GraphError> {
            items.iter().try_fold(0.0, |acc, (resource, qty)| {
                let price = prices.get(resource).ok_or_else(|| GraphError::MissingPrice {
                    recipe: recipe_name.to_string(),
                    resource: resource.clone(),
                })?;
                Ok(acc + *qty as f64 * price)
            })
        };

        let revenue = value_of(&recipe.outputs)?;
        let cost = value_of(&recipe.inputs)? + recipe.fixed_overhead;
        Ok(revenue - cost)
    }
}
