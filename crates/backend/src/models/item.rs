//! Menu item types.

use serde::Serialize;

use crustline_core::Price;

/// A menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Unique item name.
    pub name: String,
    pub price: Price,
    pub ingredients: String,
    /// Category used by search (e.g. "drinks", "sides").
    pub type_of_item: String,
    pub description: String,
}

/// A single catalog field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemField {
    Price(Price),
    Ingredients(String),
    TypeOfItem(String),
    Description(String),
}

/// Sort order for a full catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Storage order (by item name).
    #[default]
    None,
    PriceAsc,
    PriceDesc,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<String> = s
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect();
        match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            [] | ["none"] => Ok(Self::None),
            ["price", "asc"] | ["price_asc"] => Ok(Self::PriceAsc),
            ["price", "desc"] | ["price_desc"] => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

/// Catalog search criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    type_of_item: String,
    /// Exclusive upper bound on price.
    pub max_price: Option<Price>,
}

impl ItemFilter {
    /// Build a filter. The category is matched after trimming and lowercasing
    /// both sides.
    #[must_use]
    pub fn new(type_of_item: &str, max_price: Option<Price>) -> Self {
        Self {
            type_of_item: normalize_category(type_of_item),
            max_price,
        }
    }

    /// The normalized category.
    #[must_use]
    pub fn type_of_item(&self) -> &str {
        &self.type_of_item
    }

    /// Whether an item satisfies the filter.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        normalize_category(&item.type_of_item) == self.type_of_item
            && self.max_price.is_none_or(|max| item.price < max)
    }
}

/// Trim and lowercase a category name.
#[must_use]
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(type_of_item: &str, cents: i64) -> Item {
        Item {
            name: "Thing".to_owned(),
            price: Price::from_cents(cents).unwrap(),
            ingredients: String::new(),
            type_of_item: type_of_item.to_owned(),
            description: String::new(),
        }
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("price asc".parse::<SortKey>().unwrap(), SortKey::PriceAsc);
        assert_eq!(" Price  DESC ".parse::<SortKey>().unwrap(), SortKey::PriceDesc);
        assert_eq!("".parse::<SortKey>().unwrap(), SortKey::None);
        assert!("cheapest".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_filter_normalizes_category() {
        let filter = ItemFilter::new("  Drinks ", None);
        assert_eq!(filter.type_of_item(), "drinks");
        assert!(filter.matches(&item(" drinks", 150)));
        assert!(!filter.matches(&item("sides", 150)));
    }

    #[test]
    fn test_filter_price_ceiling_is_exclusive() {
        let filter = ItemFilter::new("drinks", Some(Price::from_cents(200).unwrap()));
        assert!(filter.matches(&item("drinks", 150)));
        assert!(!filter.matches(&item("drinks", 200)));
    }
}
