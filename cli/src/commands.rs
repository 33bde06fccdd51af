//! Subcommands and their handlers.
//!
//! Every handler returns the JSON to print and whether the pantry changed, so
//! `main` only writes the pantry file back when something was modified.

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use nutrify_core::amount::parse_amount;
use nutrify_core::models::MealType;
use nutrify_core::collections::{CollectionUpdate, NewCollection};
use nutrify_core::pantry::NewRecipe;
use nutrify_core::planning::{parse_plan_date, week_bounds, MealPlanUpdate, PlannedMeal};
use nutrify_core::recipe::{RecipeFilter, RecipeSort, RecipeUpdate, SortOrder};
use nutrify_core::{
    convert_unit, convertible_units, format_quantity_with_conversions, primary_unit, unit_group,
    IngredientRef, Pantry,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Outcome {
    pub output: Value,
    pub changed: bool,
}

impl Outcome {
    fn view(output: impl Serialize) -> Result<Self> {
        Ok(Self {
            output: serde_json::to_value(output)?,
            changed: false,
        })
    }

    fn changed(output: impl Serialize) -> Result<Self> {
        Ok(Self {
            output: serde_json::to_value(output)?,
            changed: true,
        })
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_plan_date(s).map_err(|e| e.to_string())
}

fn parse_meal_type_arg(s: &str) -> Result<MealType, String> {
    MealType::parse(s).ok_or_else(|| {
        format!("Unknown meal type: {s}. Use breakfast, lunch, dinner or snack.")
    })
}

fn parse_sort_arg(s: &str) -> Result<RecipeSort, String> {
    RecipeSort::parse(s).ok_or_else(|| format!("Unknown sort field: {s}. Use created_at or title."))
}

fn parse_order_arg(s: &str) -> Result<SortOrder, String> {
    SortOrder::parse(s).ok_or_else(|| format!("Unknown sort order: {s}. Use asc or desc."))
}

fn parse_quantity_arg(s: &str) -> Result<f64, String> {
    parse_amount(s).ok_or_else(|| format!("Not a quantity: {s}"))
}

fn ingredient_ref(arg: &str) -> IngredientRef {
    match arg.parse::<u64>() {
        Ok(id) => IngredientRef::Id(id),
        Err(_) => IngredientRef::Name(arg.to_string()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn convert(quantity: &str, from: &str, to: &str) -> Result<Outcome> {
    let amount = parse_amount(quantity);
    Outcome::view(json!({
        "quantity": amount,
        "from": from,
        "to": to,
        "result": convert_unit(amount, Some(from), Some(to)),
    }))
}

pub fn format(quantity: &str, unit: &str, include_conversions: bool) -> Result<Outcome> {
    Outcome::view(format_quantity_with_conversions(
        parse_amount(quantity),
        Some(unit),
        include_conversions,
    ))
}

pub fn units(unit: &str) -> Result<Outcome> {
    let group = unit_group(Some(unit));
    Outcome::view(json!({
        "unit": unit,
        "group": group,
        "primary": group.map(|_| primary_unit(unit)),
        "convertible": convertible_units(Some(unit)),
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeFile {
    One(NewRecipe),
    Many(Vec<NewRecipe>),
}

#[derive(Args, Default)]
pub struct ListArgs {
    /// Text to find in the title or description
    #[arg(long)]
    search: Option<String>,
    /// Ingredients the recipe must use (comma separated)
    #[arg(long, value_delimiter = ',')]
    ingredients: Vec<String>,
    /// Ingredients the recipe must not use (comma separated)
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    cuisine: Option<String>,
    #[arg(long)]
    meal_type: Option<String>,
    #[arg(long)]
    vegan: Option<bool>,
    #[arg(long)]
    vegetarian: Option<bool>,
    /// created_at or title (default: created_at)
    #[arg(long, value_parser = parse_sort_arg)]
    sort_by: Option<RecipeSort>,
    /// asc or desc (default: desc)
    #[arg(long, value_parser = parse_order_arg)]
    order: Option<SortOrder>,
}

impl From<ListArgs> for RecipeFilter {
    fn from(args: ListArgs) -> Self {
        RecipeFilter {
            search: args.search,
            ingredients: args.ingredients,
            exclude_ingredients: args.exclude,
            category: args.category,
            cuisine: args.cuisine,
            meal_type: args.meal_type,
            is_vegan: args.vegan,
            is_vegetarian: args.vegetarian,
            sort_by: args.sort_by.unwrap_or_default(),
            sort_order: args.order.unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
pub enum RecipeCommand {
    /// Import recipes from a JSON file (one recipe or a list)
    Import { file: PathBuf },
    /// Show a recipe with unit alternatives for each ingredient
    Show { id: u64 },
    /// List recipes, optionally filtered and sorted
    List(ListArgs),
    /// Values the recipe list can be filtered by
    Filters,
    /// Update a recipe from a JSON file of the fields to change
    Update { id: u64, file: PathBuf },
    /// Delete a recipe with its favorite, ratings and collection entries
    Delete { id: u64 },
    /// Manage favorite recipes
    #[command(subcommand)]
    Favorite(FavoriteCommand),
    /// Rate a recipe from 1 to 5
    Rate {
        id: u64,
        score: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Remove a recipe's rating
    Unrate { id: u64 },
    /// Show a recipe's ratings with their average
    Ratings { id: u64 },
    /// Collections a recipe belongs to
    Collections { id: u64 },
}

impl RecipeCommand {
    pub fn run(self, pantry: &mut Pantry) -> Result<Outcome> {
        match self {
            RecipeCommand::Import { file } => {
                let recipes = match read_json::<RecipeFile>(&file)? {
                    RecipeFile::One(recipe) => vec![recipe],
                    RecipeFile::Many(recipes) => recipes,
                };
                let ids = recipes
                    .into_iter()
                    .map(|recipe| pantry.add_recipe(recipe))
                    .collect::<Result<Vec<u64>, _>>()?;
                Outcome::changed(json!({ "imported": ids.len(), "recipe_ids": ids }))
            }
            RecipeCommand::Show { id } => {
                let detail = pantry
                    .recipe_detail(id)
                    .ok_or_else(|| anyhow!("Recipe not found: {id}"))?;
                Outcome::view(detail)
            }
            RecipeCommand::List(args) => Outcome::view(pantry.recipe_list(&args.into())),
            RecipeCommand::Filters => Outcome::view(pantry.recipe_filters()),
            RecipeCommand::Update { id, file } => {
                let update: RecipeUpdate = read_json(&file)?;
                pantry.update_recipe(id, update)?;
                Outcome::changed(pantry.recipe_detail(id))
            }
            RecipeCommand::Delete { id } => Outcome::changed(pantry.delete_recipe(id)?),
            RecipeCommand::Favorite(command) => command.run(pantry),
            RecipeCommand::Rate { id, score, comment } => {
                Outcome::changed(pantry.rate_recipe(id, score, comment)?)
            }
            RecipeCommand::Unrate { id } => {
                pantry.remove_rating(id)?;
                Outcome::changed(json!({ "removed": id }))
            }
            RecipeCommand::Ratings { id } => Outcome::view(pantry.recipe_ratings(id)?),
            RecipeCommand::Collections { id } => Outcome::view(pantry.recipe_collections(id)?),
        }
    }
}

#[derive(Subcommand)]
pub enum FavoriteCommand {
    /// Mark a recipe as a favorite
    Add { id: u64 },
    /// Unmark a favorite recipe
    Remove { id: u64 },
    /// List favorite recipes, most recent first
    List,
}

impl FavoriteCommand {
    pub fn run(self, pantry: &mut Pantry) -> Result<Outcome> {
        match self {
            FavoriteCommand::Add { id } => {
                pantry.add_favorite(id)?;
                Outcome::changed(json!({ "favorited": id }))
            }
            FavoriteCommand::Remove { id } => {
                pantry.remove_favorite(id)?;
                Outcome::changed(json!({ "removed": id }))
            }
            FavoriteCommand::List => Outcome::view(pantry.favorite_recipes()),
        }
    }
}

#[derive(Subcommand)]
pub enum CollectionCommand {
    /// List collections, newest first
    List,
    /// Show a collection with its recipes
    Show { id: u64 },
    /// Create a collection
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// Rename or describe a collection
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: Option<bool>,
    },
    /// Delete a collection (its recipes are kept)
    Delete { id: u64 },
    /// Add one or more recipes to a collection
    Add {
        collection_id: u64,
        #[arg(required = true)]
        recipe_ids: Vec<u64>,
    },
    /// Remove a recipe from a collection
    Remove { collection_id: u64, recipe_id: u64 },
}

impl CollectionCommand {
    pub fn run(self, pantry: &mut Pantry) -> Result<Outcome> {
        match self {
            CollectionCommand::List => Outcome::view(pantry.collections_overview()),
            CollectionCommand::Show { id } => {
                let detail = pantry
                    .collection_detail(id)
                    .ok_or_else(|| anyhow!("Collection not found: {id}"))?;
                Outcome::view(detail)
            }
            CollectionCommand::Create {
                name,
                description,
                public,
            } => {
                let id = pantry.create_collection(NewCollection {
                    name,
                    description,
                    is_public: public,
                })?;
                Outcome::changed(json!({ "collection_id": id }))
            }
            CollectionCommand::Update {
                id,
                name,
                description,
                public,
            } => {
                pantry.update_collection(
                    id,
                    CollectionUpdate {
                        name,
                        description,
                        is_public: public,
                    },
                )?;
                Outcome::changed(pantry.collection_detail(id))
            }
            CollectionCommand::Delete { id } => {
                pantry.delete_collection(id)?;
                Outcome::changed(json!({ "removed": id }))
            }
            CollectionCommand::Add {
                collection_id,
                recipe_ids,
            } => match recipe_ids.as_slice() {
                [recipe_id] => {
                    pantry.add_to_collection(collection_id, *recipe_id)?;
                    Outcome::changed(json!({ "added": 1, "skipped": 0, "errors": [] }))
                }
                _ => Outcome::changed(pantry.bulk_add_to_collection(collection_id, &recipe_ids)?),
            },
            CollectionCommand::Remove {
                collection_id,
                recipe_id,
            } => {
                pantry.remove_from_collection(collection_id, recipe_id)?;
                Outcome::changed(json!({ "removed": recipe_id }))
            }
        }
    }
}

#[derive(Subcommand)]
pub enum FridgeCommand {
    /// List fridge stock
    List,
    /// Set the stock of an ingredient, replacing any previous amount
    Add {
        name: String,
        #[arg(value_parser = parse_quantity_arg)]
        quantity: f64,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Remove a fridge item
    Remove { id: u64 },
}

impl FridgeCommand {
    pub fn run(self, pantry: &mut Pantry, include_conversions: bool) -> Result<Outcome> {
        match self {
            FridgeCommand::List => Outcome::view(pantry.fridge_view(include_conversions)),
            FridgeCommand::Add {
                name,
                quantity,
                unit,
            } => Outcome::changed(pantry.upsert_fridge_item(
                &name,
                Some(quantity),
                unit.as_deref(),
            )?),
            FridgeCommand::Remove { id } => {
                pantry.remove_fridge_item(id)?;
                Outcome::changed(json!({ "removed": id }))
            }
        }
    }
}

#[derive(Subcommand)]
pub enum ShoppingCommand {
    /// Show the shopping list, unpurchased first
    List,
    /// Add an ingredient (by id or name) to the list
    Add {
        ingredient: String,
        #[arg(long)]
        amount: Option<String>,
    },
    /// Add every ingredient of a recipe
    FromRecipe { recipe_id: u64 },
    /// Add the ingredients of planned meals (default: this week)
    FromMealPlan {
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,
    },
    /// Flip the purchased flag of an item
    Toggle { id: u64 },
    /// Change the amount or purchased flag of an item
    Update {
        id: u64,
        #[arg(long, value_parser = parse_quantity_arg)]
        amount: Option<f64>,
        #[arg(long)]
        purchased: Option<bool>,
    },
    /// Remove one or more items
    Remove {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Move purchased items into the fridge
    Transfer,
    /// Compare unpurchased items with fridge stock
    Compare,
    /// Empty the list
    Clear {
        /// Only remove purchased items
        #[arg(long)]
        purchased_only: bool,
    },
}

impl ShoppingCommand {
    pub fn run(self, pantry: &mut Pantry) -> Result<Outcome> {
        match self {
            ShoppingCommand::List => Outcome::view(pantry.shopping_view()),
            ShoppingCommand::Add { ingredient, amount } => {
                Outcome::changed(pantry.add_shopping_item(&ingredient_ref(&ingredient), amount)?)
            }
            ShoppingCommand::FromRecipe { recipe_id } => {
                Outcome::changed(pantry.add_recipe_to_shopping_list(recipe_id)?)
            }
            ShoppingCommand::FromMealPlan { start, end } => {
                let (start, default_end) = week_bounds(start, today())?;
                let end = end.unwrap_or(default_end);
                Outcome::changed(pantry.add_meal_plan_to_shopping_list(start, end))
            }
            ShoppingCommand::Toggle { id } => {
                let is_purchased = pantry.toggle_purchased(id)?;
                Outcome::changed(json!({ "id": id, "is_purchased": is_purchased }))
            }
            ShoppingCommand::Update {
                id,
                amount,
                purchased,
            } => {
                pantry.update_shopping_item(id, amount, purchased)?;
                Outcome::changed(pantry.shopping_item(id))
            }
            ShoppingCommand::Remove { ids } => {
                let deleted_count = match ids.as_slice() {
                    [id] => {
                        pantry.remove_shopping_item(*id)?;
                        1
                    }
                    ids => pantry.bulk_remove_shopping_items(ids),
                };
                Outcome::changed(json!({ "deleted_count": deleted_count }))
            }
            ShoppingCommand::Transfer => Outcome::changed(pantry.transfer_purchased_to_fridge()),
            ShoppingCommand::Compare => Outcome::view(pantry.compare_with_fridge()),
            ShoppingCommand::Clear { purchased_only } => {
                let deleted_count = pantry.clear_shopping_list(purchased_only);
                Outcome::changed(json!({ "deleted_count": deleted_count }))
            }
        }
    }
}

#[derive(Subcommand)]
pub enum PlanCommand {
    /// Show a week of planned meals (default: this week)
    Week {
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
    },
    /// Plan a meal, replacing whatever is in that slot
    Add {
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
        #[arg(value_parser = parse_meal_type_arg)]
        meal_type: MealType,
        #[arg(long)]
        recipe: Option<u64>,
    },
    /// Move a planned meal or change its recipe
    Update {
        id: u64,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_meal_type_arg)]
        meal_type: Option<MealType>,
        #[arg(long, conflicts_with = "clear_recipe")]
        recipe: Option<u64>,
        #[arg(long)]
        clear_recipe: bool,
    },
    /// Remove a planned meal
    Remove { id: u64 },
    /// Remove every meal in a week (default: this week)
    Clear {
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
    },
    /// Ingredients the week's meals need, checked against the fridge
    Missing {
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
    },
    /// Planning statistics
    Stats,
    /// Plan many meals from a JSON file
    Import { file: PathBuf },
}

impl PlanCommand {
    pub fn run(self, pantry: &mut Pantry) -> Result<Outcome> {
        match self {
            PlanCommand::Week { start } => {
                let (start, _) = week_bounds(start, today())?;
                Outcome::view(pantry.weekly_plan(start)?)
            }
            PlanCommand::Add {
                date,
                meal_type,
                recipe,
            } => Outcome::changed(pantry.plan_meal(date, meal_type, recipe)?),
            PlanCommand::Update {
                id,
                date,
                meal_type,
                recipe,
                clear_recipe,
            } => {
                let recipe_id = if clear_recipe { Some(None) } else { recipe.map(Some) };
                pantry.update_meal_plan(
                    id,
                    MealPlanUpdate {
                        recipe_id,
                        plan_date: date,
                        meal_type,
                    },
                )?;
                Outcome::changed(pantry.meal_plan(id))
            }
            PlanCommand::Remove { id } => {
                pantry.remove_meal_plan(id)?;
                Outcome::changed(json!({ "removed": id }))
            }
            PlanCommand::Clear { start } => {
                let (start, _) = week_bounds(start, today())?;
                Outcome::changed(pantry.clear_week(start)?)
            }
            PlanCommand::Missing { start } => {
                let (start, _) = week_bounds(start, today())?;
                Outcome::view(pantry.missing_ingredients(start)?)
            }
            PlanCommand::Stats => Outcome::view(pantry.planning_stats(today())?),
            PlanCommand::Import { file } => {
                let meals: Vec<PlannedMeal> = read_json(&file)?;
                Outcome::changed(pantry.bulk_import_meals(&meals))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_convert_accepts_fractions() {
        let outcome = convert("1 1/2", "cup", "tablespoon").unwrap();
        assert_eq!(outcome.output["result"], json!(24.0));
        assert!(!outcome.changed);
    }

    #[test]
    fn test_units_for_unknown_label() {
        let outcome = units("pinch").unwrap();
        assert!(outcome.output["group"].is_null());
        assert!(outcome.output["primary"].is_null());
        assert_eq!(outcome.output["convertible"], json!([]));
    }

    #[test]
    fn test_ingredient_ref() {
        assert_eq!(ingredient_ref("12"), IngredientRef::Id(12));
        assert_eq!(ingredient_ref("olive oil"), IngredientRef::Name("olive oil".to_string()));
    }

    #[test]
    fn test_recipe_import_then_shopping() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("recipes.json");
        fs::write(
            &file,
            r#"[{"title": "Toast", "ingredients": [{"name": "bread", "quantity": 2, "unit": "piece"}]}]"#,
        )
        .unwrap();

        let mut pantry = Pantry::new();
        let imported = RecipeCommand::Import { file }.run(&mut pantry).unwrap();
        assert!(imported.changed);
        let recipe_id = imported.output["recipe_ids"][0].as_u64().unwrap();

        let added = ShoppingCommand::FromRecipe { recipe_id }
            .run(&mut pantry)
            .unwrap();
        assert_eq!(added.output["added"], json!(1));

        let listed = ShoppingCommand::List.run(&mut pantry).unwrap();
        assert!(!listed.changed);
        assert_eq!(listed.output["total_items"], json!(1));
    }

    #[test]
    fn test_remove_unknown_shopping_item_fails() {
        let mut pantry = Pantry::new();
        assert!(ShoppingCommand::Remove { ids: vec![7] }
            .run(&mut pantry)
            .is_err());
    }

    #[test]
    fn test_meal_type_arg() {
        assert_eq!(parse_meal_type_arg("Lunch"), Ok(MealType::Lunch));
        assert!(parse_meal_type_arg("brunch").is_err());
    }

    #[test]
    fn test_recipe_list_prints_summaries() {
        let mut pantry = Pantry::new();
        for title in ["Pho", "Bibimbap"] {
            pantry
                .add_recipe(serde_json::from_value(json!({ "title": title })).unwrap())
                .unwrap();
        }

        let listed = RecipeCommand::List(ListArgs {
            sort_by: Some(RecipeSort::Title),
            order: Some(SortOrder::Asc),
            ..Default::default()
        })
        .run(&mut pantry)
        .unwrap();
        assert!(!listed.changed);
        assert_eq!(listed.output[0]["title"], json!("Bibimbap"));
        assert_eq!(listed.output[1]["num_ingredients"], json!(0));
        assert!(listed.output[0]["average_rating"].is_null());
        assert_eq!(listed.output[0]["is_favorite"], json!(false));

        let searched = RecipeCommand::List(ListArgs {
            search: Some("pho".to_string()),
            ..Default::default()
        })
        .run(&mut pantry)
        .unwrap();
        assert_eq!(searched.output.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_favorites_ratings_and_collections() {
        let mut pantry = Pantry::new();
        let id = pantry
            .add_recipe(serde_json::from_value(json!({ "title": "Ramen" })).unwrap())
            .unwrap();

        let rated = RecipeCommand::Rate {
            id,
            score: 5,
            comment: None,
        }
        .run(&mut pantry)
        .unwrap();
        assert!(rated.changed);
        assert_eq!(rated.output["action"], json!("created"));
        assert!(RecipeCommand::Rate {
            id,
            score: 9,
            comment: None,
        }
        .run(&mut pantry)
        .is_err());

        FavoriteCommand::Add { id }.run(&mut pantry).unwrap();
        let favorites = FavoriteCommand::List.run(&mut pantry).unwrap();
        assert_eq!(favorites.output[0]["id"], json!(id));

        let created = CollectionCommand::Create {
            name: "Noodles".to_string(),
            description: None,
            public: false,
        }
        .run(&mut pantry)
        .unwrap();
        let collection_id = created.output["collection_id"].as_u64().unwrap();
        let bulk = CollectionCommand::Add {
            collection_id,
            recipe_ids: vec![id, 404],
        }
        .run(&mut pantry)
        .unwrap();
        assert_eq!(bulk.output["added"], json!(1));
        assert_eq!(bulk.output["errors"], json!(["Recipe 404 not found"]));

        let memberships = RecipeCommand::Collections { id }.run(&mut pantry).unwrap();
        assert_eq!(memberships.output["collections"][0]["collection_name"], json!("Noodles"));

        let deleted = RecipeCommand::Delete { id }.run(&mut pantry).unwrap();
        assert_eq!(deleted.output["favorites_removed"], json!(1));
        assert_eq!(deleted.output["ratings_removed"], json!(1));
    }
}
