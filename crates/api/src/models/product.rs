//! Catalog product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopvely_core::{Money, ProductId};

/// Highest rating a product can carry.
pub const MAX_RATING: f64 = 5.0;

/// Maximum product title length.
pub const MAX_TITLE_LENGTH: usize = 255;

/// A product field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidProduct(pub &'static str);

/// A product listed in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    /// Current selling price. Orders copy this at purchase time.
    pub price: Money,
    /// Image URL, empty if none.
    pub image: String,
    /// Average customer rating, 0 to 5.
    pub rating: f64,
    pub num_reviews: i32,
    pub created_at: DateTime<Utc>,
}

/// A product as seen by a particular caller.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// True only when the caller is signed in and has bookmarked the product.
    pub is_in_wishlist: bool,
}

/// Product fields denormalized onto cart lines.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub image: String,
}

/// Catalog list filters, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the title.
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
}

impl ProductFilter {
    /// The search term, if it has any non-whitespace content.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Fields for a new catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i32,
}

impl NewProduct {
    /// Trim text fields and check ranges.
    ///
    /// Price needs no check here: [`Money`] only holds amounts from zero to
    /// [`Money::MAX`], so an oversized price fails while the body is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProduct`] naming the first bad field.
    pub fn validated(self) -> Result<Self, InvalidProduct> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(InvalidProduct("title may not be blank"));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(InvalidProduct("title is too long"));
        }
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(InvalidProduct("rating must be between 0 and 5"));
        }
        if self.num_reviews < 0 {
            return Err(InvalidProduct("num_reviews cannot be negative"));
        }

        Ok(Self {
            title,
            description: self.description.trim().to_owned(),
            image: self.image.trim().to_owned(),
            ..self
        })
    }
}

/// Partial edit of a catalog entry. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub num_reviews: Option<i32>,
}

impl ProductPatch {
    /// Overlay this patch on the current product.
    #[must_use]
    pub fn apply(self, current: &Product) -> NewProduct {
        NewProduct {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            price: self.price.unwrap_or(current.price),
            image: self.image.unwrap_or_else(|| current.image.clone()),
            rating: self.rating.unwrap_or(current.rating),
            num_reviews: self.num_reviews.unwrap_or(current.num_reviews),
        }
    }
}
