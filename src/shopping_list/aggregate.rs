use std::collections::HashMap;

use serde::Serialize;

use crate::schema::{CartIngredient, Uuid};

/// One line of the shopping list: an ingredient with its quantity summed over the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub amount: i64,
    pub measurement_unit: String,
}

impl ShoppingItem {
    pub fn line(&self) -> String {
        format!("{} {} {}", self.name, self.amount, self.measurement_unit)
    }
}

/// Sums quantities per ingredient id, sorted by name and then unit.
pub fn sum_cart(rows: Vec<CartIngredient>) -> Vec<ShoppingItem> {
    let mut totals: HashMap<Uuid, ShoppingItem> = HashMap::new();
    for row in rows {
        totals
            .entry(row.ingredient_id)
            .and_modify(|item| item.amount += i64::from(row.quantity))
            .or_insert_with(|| ShoppingItem {
                name: row.name,
                amount: i64::from(row.quantity),
                measurement_unit: row.measurement_unit,
            });
    }

    let mut items: Vec<ShoppingItem> = totals.into_values().collect();
    items.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
    });
    items
}
