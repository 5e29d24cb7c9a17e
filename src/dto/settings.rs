use serde::Deserialize;
use utoipa::ToSchema;

/// Partial update of the site settings row. Absent fields keep their value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub site_name: Option<String>,
    pub title: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub promo_banner_enabled: Option<bool>,
    pub promo_banner_text: Option<String>,
    pub promo_banner_background_color: Option<String>,
    pub promo_banner_text_color: Option<String>,
    pub company_name: Option<String>,
    pub company_phone: Option<String>,
    pub company_address: Option<String>,
}
