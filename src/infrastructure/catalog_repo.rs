use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{product_translations, products};

use super::models::{ProductRow, ProductTranslationRow};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Writes a product and its translations. Used for seeding the menu.
    pub fn insert(&self, product: &Product) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(products::table)
                .values(&ProductRow {
                    id: product.id,
                    price: product.price.clone(),
                    category: product.category.clone(),
                    image_url: product.image_url.clone(),
                })
                .execute(conn)?;

            let translations: Vec<ProductTranslationRow> = product
                .translations
                .iter()
                .map(|t| ProductTranslationRow {
                    id: Uuid::new_v4(),
                    product_id: product.id,
                    language_code: t.language_code.clone(),
                    name: t.name.clone(),
                    description: t.description.clone(),
                })
                .collect();
            diesel::insert_into(product_translations::table)
                .values(&translations)
                .execute(conn)?;
            Ok(())
        })
    }
}

fn with_translations(
    conn: &mut PgConnection,
    rows: Vec<ProductRow>,
) -> Result<Vec<Product>, DomainError> {
    let translations = ProductTranslationRow::belonging_to(&rows)
        .select(ProductTranslationRow::as_select())
        .order(product_translations::language_code.asc())
        .load::<ProductTranslationRow>(conn)?
        .grouped_by(&rows);

    Ok(rows
        .into_iter()
        .zip(translations)
        .map(|(row, translations)| row.into_product(translations))
        .collect())
}

impl CatalogRepository for DieselCatalogRepository {
    fn find_by_names(&self, names: &[String]) -> Result<Vec<Product>, DomainError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get()?;

        let matching = product_translations::table
            .filter(product_translations::name.eq_any(names.to_vec()))
            .select(product_translations::product_id);
        let rows = products::table
            .filter(products::id.eq_any(matching))
            .select(ProductRow::as_select())
            .load(&mut conn)?;

        with_translations(&mut conn, rows)
    }

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get()?;

        let rows = products::table
            .filter(products::id.eq_any(ids.to_vec()))
            .select(ProductRow::as_select())
            .load(&mut conn)?;

        with_translations(&mut conn, rows)
    }
}
