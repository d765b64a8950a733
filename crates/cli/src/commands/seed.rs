//! Seed the catalog with demo products.
//!
//! Does nothing when the catalog already has products, so it is safe to run
//! on every deploy of a demo environment.

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use shopvely_api::db::ProductRepository;
use shopvely_api::models::{NewProduct, ProductFilter};
use shopvely_core::Money;

use super::database_url;

/// Demo catalog: title, description, price in paise, rating, review count.
const DEMO_PRODUCTS: &[(&str, &str, i64, f64, i32)] = &[
    (
        "Stainless Steel Kettle",
        "1.5 litre electric kettle with auto shut-off.",
        1_499_00,
        4.4,
        128,
    ),
    (
        "Ceramic Mug Set",
        "Set of four 350 ml mugs, dishwasher safe.",
        799_00,
        4.1,
        56,
    ),
    (
        "Cotton Bath Towel",
        "600 GSM towel, 70 x 140 cm.",
        649_00,
        4.6,
        312,
    ),
    (
        "Bamboo Cutting Board",
        "Large reversible board with juice groove.",
        899_00,
        4.3,
        87,
    ),
    (
        "LED Desk Lamp",
        "Dimmable lamp with three colour temperatures.",
        1_999_00,
        3.9,
        41,
    ),
    (
        "Cast Iron Skillet",
        "Pre-seasoned 10 inch skillet.",
        2_299_00,
        4.7,
        204,
    ),
];

/// Insert the demo products unless the catalog already has entries.
///
/// # Errors
///
/// Returns an error if `SHOPVELY_DATABASE_URL` is not set or a database
/// operation fails.
pub async fn products() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url().ok_or("SHOPVELY_DATABASE_URL not set")?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    let repo = ProductRepository::new(&pool);

    let existing = repo.list(&ProductFilter::default(), None).await?;
    if !existing.is_empty() {
        info!(count = existing.len(), "Catalog already has products, skipping seed");
        return Ok(());
    }

    for &(title, description, paise, rating, num_reviews) in DEMO_PRODUCTS {
        let product = NewProduct {
            title: title.to_owned(),
            description: description.to_owned(),
            price: Money::new(Decimal::new(paise, 2))?,
            image: String::new(),
            rating,
            num_reviews,
        }
        .validated()?;

        let product = repo.create(&product).await?;
        info!(product_id = %product.id, title = %product.title, "Seeded product");
    }

    info!(count = DEMO_PRODUCTS.len(), "Seed complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_products_are_valid() {
        for &(title, description, paise, rating, num_reviews) in DEMO_PRODUCTS {
            let product = NewProduct {
                title: title.to_owned(),
                description: description.to_owned(),
                price: Money::new(Decimal::new(paise, 2)).unwrap(),
                image: String::new(),
                rating,
                num_reviews,
            };
            assert!(product.validated().is_ok(), "{title}");
        }
    }
}
