//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! subcategories:
//!   - section: productos
//!     name: Harinas
//! products:
//!   - name: Harina P.A.N.
//!     description: Harina de maíz precocida
//!     price: "4.50"
//!     stock: 24
//!     image: productos/harina-pan.jpg
//!     section: productos
//!     subcategory: Harinas
//! ```
//!
//! Subcategories are upserted by (section, name). A product is skipped when
//! its section already has one with the same name, so re-running a file is
//! harmless.

use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use aunclic_core::{CategoryId, SubcategoryId};
use aunclic_storefront::catalog::CatalogSection;
use aunclic_storefront::db;

use super::database_url;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub subcategories: Vec<SeedSubcategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSubcategory {
    pub section: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: String,
    #[serde(default)]
    pub stock: i32,
    /// Object path inside the product images bucket.
    #[serde(default)]
    pub image: Option<String>,
    pub section: String,
    #[serde(default)]
    pub subcategory: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub subcategories: usize,
    pub inserted: usize,
    pub skipped: usize,
}

fn section(slug: &str) -> Option<CatalogSection> {
    CatalogSection::from_slug(slug.trim())
}

/// Every problem in the file, so they can all be fixed in one pass.
#[must_use]
pub fn validate(file: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    for (i, sub) in file.subcategories.iter().enumerate() {
        if section(&sub.section).is_none() {
            errors.push(format!("subcategories[{i}]: unknown section '{}'", sub.section));
        }
        if sub.name.trim().is_empty() {
            errors.push(format!("subcategories[{i}]: name is empty"));
        }
    }

    for (i, product) in file.products.iter().enumerate() {
        let label = if product.name.trim().is_empty() {
            format!("products[{i}]")
        } else {
            format!("products[{i}] '{}'", product.name.trim())
        };

        if product.name.trim().is_empty() {
            errors.push(format!("{label}: name is empty"));
        }
        match Decimal::from_str(product.price.trim()) {
            Ok(price) if price.is_sign_negative() => {
                errors.push(format!("{label}: price cannot be negative"));
            }
            Ok(_) => {}
            Err(_) => errors.push(format!("{label}: invalid price '{}'", product.price)),
        }
        if product.stock < 0 {
            errors.push(format!("{label}: stock cannot be negative"));
        }
        let Some(product_section) = section(&product.section) else {
            errors.push(format!("{label}: unknown section '{}'", product.section));
            continue;
        };
        if let Some(sub) = &product.subcategory {
            let declared = file.subcategories.iter().any(|s| {
                section(&s.section) == Some(product_section) && s.name.trim() == sub.trim()
            });
            if !declared {
                errors.push(format!(
                    "{label}: subcategory '{sub}' is not declared for section '{}'",
                    product.section
                ));
            }
        }
    }

    errors
}

/// Seed subcategories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails. Writes happen in one transaction.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;
    info!(
        subcategories = file.subcategories.len(),
        products = file.products.len(),
        "Parsed seed file"
    );

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    if dry_run {
        info!("Seed file is valid (dry run, nothing written)");
        return Ok(());
    }

    let pool = db::create_pool(&database_url()?).await?;
    let result = apply(&pool, &file).await?;

    info!("Seeding complete");
    info!("  Subcategories upserted: {}", result.subcategories);
    info!("  Products inserted: {}", result.inserted);
    info!("  Products skipped (already exist): {}", result.skipped);
    Ok(())
}

async fn apply(pool: &PgPool, file: &SeedFile) -> Result<SeedResult, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut result = SeedResult::default();
    let mut subcategory_ids: Vec<(CategoryId, String, SubcategoryId)> = Vec::new();

    for sub in &file.subcategories {
        let Some(section) = section(&sub.section) else {
            continue;
        };
        let name = sub.name.trim();
        let id: SubcategoryId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.subcategory (category_id, name)
            VALUES ($1, $2)
            ON CONFLICT (category_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(section.category_id())
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        subcategory_ids.push((section.category_id(), name.to_owned(), id));
        result.subcategories += 1;
    }

    for product in &file.products {
        let Some(section) = section(&product.section) else {
            continue;
        };
        let category = section.category_id();
        let subcategory = product.subcategory.as_deref().and_then(|name| {
            subcategory_ids
                .iter()
                .find(|(cat, n, _)| *cat == category && n == name.trim())
                .map(|(_, _, id)| *id)
        });
        let price = Decimal::from_str(product.price.trim()).unwrap_or_default();

        let inserted = sqlx::query(
            r"
            INSERT INTO storefront.product
                (name, description, price, stock, primary_image, category_id, subcategory_id)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM storefront.product WHERE category_id = $6 AND name = $1
            )
            ",
        )
        .bind(product.name.trim())
        .bind(product.description.as_deref().map(str::trim))
        .bind(price)
        .bind(product.stock)
        .bind(product.image.as_deref().map(str::trim))
        .bind(category)
        .bind(subcategory)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            result.skipped += 1;
        } else {
            result.inserted += 1;
        }
    }

    tx.commit().await?;
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VALID: &str = r#"
subcategories:
  - section: productos
    name: Harinas
  - section: comidas
    name: Tamales
products:
  - name: Harina P.A.N.
    price: "4.50"
    stock: 24
    section: productos
    subcategory: Harinas
  - name: Tamal oaxaqueño
    description: Hoja de plátano
    price: "6"
    section: comidas
"#;

    #[test]
    fn valid_file_has_no_errors() {
        let file: SeedFile = serde_yaml::from_str(VALID).unwrap();
        assert_eq!(file.products.len(), 2);
        assert!(validate(&file).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let file: SeedFile = serde_yaml::from_str(
            r#"
subcategories:
  - section: juguetes
    name: Trompos
products:
  - name: Arepa
    price: "abc"
    stock: -1
    section: comidas
  - name: Sombrero
    price: "-3"
    section: boutique
    subcategory: Sombreros
"#,
        )
        .unwrap();

        let errors = validate(&file);
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("unknown section 'juguetes'")));
        assert!(errors.iter().any(|e| e.contains("invalid price 'abc'")));
        assert!(errors.iter().any(|e| e.contains("stock cannot be negative")));
        assert!(errors.iter().any(|e| e.contains("price cannot be negative")));
        assert!(errors.iter().any(|e| e.contains("subcategory 'Sombreros'")));
    }

    #[test]
    fn subcategory_must_belong_to_the_same_section() {
        let file: SeedFile = serde_yaml::from_str(
            r#"
subcategories:
  - section: productos
    name: Harinas
products:
  - name: Harina de yuca
    price: "3"
    section: comidas
    subcategory: Harinas
"#,
        )
        .unwrap();
        assert_eq!(validate(&file).len(), 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_yaml::from_str::<SeedFile>("products:\n  - name: X\n    cost: 3\n");
        assert!(parsed.is_err());
    }
}
