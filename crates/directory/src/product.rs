use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, ProductId, Sku};

const NAME_MAX_LEN: usize = 100;
const CATEGORY_MAX_LEN: usize = 50;
const UNIT_MAX_LEN: usize = 20;
const IMAGE_URL_MAX_LEN: usize = 255;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Catalog entry. The SKU is fixed at creation; everything else is editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for `Directory::create_product`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update. The sku is not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProduct {
    pub(crate) fn validate(&self) -> DomainResult<(Sku, String)> {
        let sku = Sku::parse(&self.sku)?;
        let name = validate_name(&self.name)?;
        check_len("category", self.category.as_deref(), CATEGORY_MAX_LEN)?;
        check_len("unit", self.unit.as_deref(), UNIT_MAX_LEN)?;
        check_len("image_url", self.image_url.as_deref(), IMAGE_URL_MAX_LEN)?;
        Ok((sku, name))
    }
}

impl ProductPatch {
    pub(crate) fn apply_to(&self, product: &mut Product) -> DomainResult<()> {
        let name = match &self.name {
            Some(n) => Some(validate_name(n)?),
            None => None,
        };
        check_len("category", self.category.as_deref(), CATEGORY_MAX_LEN)?;
        check_len("unit", self.unit.as_deref(), UNIT_MAX_LEN)?;
        check_len("image_url", self.image_url.as_deref(), IMAGE_URL_MAX_LEN)?;

        if let Some(name) = name {
            product.name = name;
        }
        if let Some(c) = &self.category {
            product.category = Some(c.clone());
        }
        if let Some(u) = &self.unit {
            product.unit = Some(u.clone());
        }
        if let Some(i) = &self.image_url {
            product.image_url = Some(i.clone());
        }
        Ok(())
    }
}

fn validate_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "name cannot exceed {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> DomainResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(DomainError::validation(format!(
            "{field} cannot exceed {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Product search filter: `q` matches name or sku (case-insensitive substring).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductQuery {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            let hit = product.name.to_lowercase().contains(&q)
                || product.sku.as_str().to_lowercase().contains(&q);
            if !hit {
                return false;
            }
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if product.category.as_deref() != Some(category) {
                return false;
            }
        }
        true
    }
}

/// Page request, validated before slicing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> DomainResult<Self> {
        if page == 0 {
            return Err(DomainError::validation("page must be >= 1"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of results. `total_pages` is derived from the same `page_size`
/// that sliced `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn slice(all: Vec<T>, req: PageRequest) -> Self {
        let total = all.len() as u64;
        let size = u64::from(req.page_size);
        let total_pages = total.div_ceil(size);
        let skip = (u64::from(req.page) - 1).saturating_mul(size);
        let items = all
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(req.page_size as usize)
            .collect();

        Self {
            items,
            total,
            page: req.page,
            page_size: req.page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn page_request_rejects_zero_page_size() {
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_SIZE + 1).is_err());
        assert!(PageRequest::new(3, 10).is_ok());
    }

    #[test]
    fn last_page_is_partial() {
        let page = Page::slice((1..=45).collect::<Vec<_>>(), PageRequest::new(3, 20).unwrap());
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page = Page::<u8>::slice(Vec::new(), PageRequest::default());
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn patch_never_touches_sku() {
        let mut p = Product {
            id: ProductId::new(1),
            sku: Sku::parse("SKU-1").unwrap(),
            name: "Old".into(),
            category: None,
            unit: None,
            image_url: None,
            created_at: Utc::now(),
        };
        let patch = ProductPatch {
            name: Some("New".into()),
            unit: Some("box".into()),
            ..ProductPatch::default()
        };
        patch.apply_to(&mut p).unwrap();
        assert_eq!(p.name, "New");
        assert_eq!(p.unit.as_deref(), Some("box"));
        assert_eq!(p.sku.as_str(), "SKU-1");
    }

    #[test]
    fn patch_with_blank_name_is_rejected_and_leaves_product_untouched() {
        let mut p = Product {
            id: ProductId::new(1),
            sku: Sku::parse("SKU-1").unwrap(),
            name: "Keep".into(),
            category: None,
            unit: None,
            image_url: None,
            created_at: Utc::now(),
        };
        let patch = ProductPatch {
            name: Some("  ".into()),
            unit: Some("box".into()),
            ..ProductPatch::default()
        };
        assert!(patch.apply_to(&mut p).is_err());
        assert_eq!(p.name, "Keep");
        assert_eq!(p.unit, None);
    }

    proptest! {
        /// Property: pages partition the result set without loss or overlap.
        #[test]
        fn pages_cover_every_item_exactly_once(total in 0usize..300, size in 1u32..=MAX_PAGE_SIZE) {
            let all: Vec<usize> = (0..total).collect();
            let first = Page::slice(all.clone(), PageRequest::new(1, size).unwrap());
            let mut seen = Vec::new();
            for page in 1..=first.total_pages.max(1) {
                let p = Page::slice(all.clone(), PageRequest::new(page as u32, size).unwrap());
                prop_assert_eq!(p.total_pages, first.total_pages);
                seen.extend(p.items);
            }
            prop_assert_eq!(seen, all);
        }
    }
}
