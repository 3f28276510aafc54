use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Release stage of a product; controls what file retrieval hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Development,
    Preorder,
    Available,
}

/// Where the deliverable for a product lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadRef {
    /// External download link handed to the user as-is.
    Url(String),
    /// Path to a file the embedding process attaches itself.
    File(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique catalog key, also the `product_name` stored on licenses.
    pub name: String,
    pub info: String,
    pub description: String,
    #[serde(default)]
    pub buyable: bool,
    #[serde(default)]
    pub is_free: bool,
    /// Roblox gamepass whose ownership proves an external purchase.
    #[serde(default)]
    pub gamepass_id: Option<u64>,
    pub status: ProductStatus,
    #[serde(default)]
    pub download: Option<DownloadRef>,
}

/// The injected, immutable product catalog. Order is preserved for display.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, Error> {
        for (i, product) in products.iter().enumerate() {
            if products[..i].iter().any(|p| p.name == product.name) {
                return Err(Error::Parse(format!(
                    "duplicate product name '{}' in catalog",
                    product.name
                )));
            }
        }
        Ok(Self { products })
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
