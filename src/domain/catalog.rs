use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Display name used on receipts when a product carries no translation at all.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct ProductTranslation {
    pub language_code: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub price: BigDecimal,
    pub category: String,
    pub image_url: Option<String>,
    pub translations: Vec<ProductTranslation>,
}

impl Product {
    pub fn has_name(&self, name: &str) -> bool {
        self.translations.iter().any(|t| t.name == name)
    }

    /// Name in `language_code`, else any translation, else [`UNKNOWN_PRODUCT_NAME`].
    pub fn display_name(&self, language_code: &str) -> &str {
        self.translations
            .iter()
            .find(|t| t.language_code.eq_ignore_ascii_case(language_code))
            .or_else(|| self.translations.first())
            .map(|t| t.name.as_str())
            .unwrap_or(UNKNOWN_PRODUCT_NAME)
    }
}
