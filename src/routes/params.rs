use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

const MAX_PER_PAGE: i64 = 100;
// Keeps `(page - 1) * per_page` inside i64.
const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(20).clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub page: Option<i64>,
    #[serde(rename = "per_page")]
    pub per_page: Option<i64>,
    /// Category id.
    pub category: Option<Uuid>,
    pub area_id: Option<Uuid>,
    /// Case-insensitive search in name and description.
    pub q: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

/// List queries keep `page`/`per_page` as plain fields; `#[serde(flatten)]`
/// does not parse numbers out of url-encoded input.
pub trait Paged {
    fn pagination(&self) -> Pagination;
}

impl Paged for ProductQuery {
    fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl Paged for OrderListQuery {
    fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        let p = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (3, 100, 200));
        let p = Pagination {
            page: Some(-1),
            per_page: Some(0),
        };
        assert_eq!(p.normalize(), (1, 1, 0));
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        let (page, per_page, offset) = p.normalize();
        assert_eq!(page, i64::MAX / 100);
        assert_eq!(per_page, 100);
        assert_eq!(offset, (page - 1) * 100);
        assert!(offset > 0);
    }

    #[test]
    fn product_query_reads_camel_case_filters() {
        let q: ProductQuery = serde_json::from_value(serde_json::json!({
            "areaId": "00000000-0000-0000-0000-000000000002",
            "per_page": 5,
            "featured": true
        }))
        .unwrap();
        assert!(q.area_id.is_some());
        assert_eq!(q.pagination().normalize(), (1, 5, 0));
    }
}
