// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Create/update payloads, one closed variant per model.
//!
//! Forms are validated at the boundary, before the resource client
//! serializes them, so malformed payloads never reach the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StockroomError;
use crate::types::{EntityId, ModelName};

/// A create or update payload keyed by model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", content = "data", rename_all = "kebab-case")]
pub enum EntityForm {
    Brand(BrandForm),
    Category(CategoryForm),
    Product(ProductForm),
    Blog(BlogForm),
    FlashSale(FlashSaleForm),
    Notification(NotificationForm),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandForm {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryForm {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub name: String,
    pub brand_id: EntityId,
    pub category_id: EntityId,
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogForm {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashSaleForm {
    pub name: String,
    pub product_ids: Vec<EntityId>,
    pub discount_percent: u8,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationForm {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl EntityForm {
    /// The backend model this form writes to.
    pub fn model(&self) -> ModelName {
        let name = match self {
            EntityForm::Brand(_) => "brand",
            EntityForm::Category(_) => "categories",
            EntityForm::Product(_) => "products",
            EntityForm::Blog(_) => "blogs",
            EntityForm::FlashSale(_) => "flash-sales",
            EntityForm::Notification(_) => "notifications",
        };
        ModelName::from_static(name)
    }

    /// Checks the payload, collecting every problem into one error.
    pub fn validate(&self) -> Result<(), StockroomError> {
        let mut problems = Vec::new();

        match self {
            EntityForm::Brand(form) => require("name", &form.name, &mut problems),
            EntityForm::Category(form) => require("name", &form.name, &mut problems),
            EntityForm::Product(form) => {
                require("name", &form.name, &mut problems);
                require("brandId", form.brand_id.as_str(), &mut problems);
                require("categoryId", form.category_id.as_str(), &mut problems);
                if !form.price.is_finite() || form.price < 0.0 {
                    problems.push(format!("price must be a non-negative number, got {}", form.price));
                }
            }
            EntityForm::Blog(form) => {
                require("title", &form.title, &mut problems);
                require("content", &form.content, &mut problems);
            }
            EntityForm::FlashSale(form) => {
                require("name", &form.name, &mut problems);
                if form.product_ids.is_empty() {
                    problems.push("productIds must not be empty".to_string());
                }
                if !(1..=100).contains(&form.discount_percent) {
                    problems.push(format!(
                        "discountPercent must be between 1 and 100, got {}",
                        form.discount_percent
                    ));
                }
                if form.starts_at >= form.ends_at {
                    problems.push("startsAt must be before endsAt".to_string());
                }
            }
            EntityForm::Notification(form) => {
                require("title", &form.title, &mut problems);
                require("body", &form.body, &mut problems);
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(StockroomError::Validation(format!(
                "invalid {} form: {}",
                self.model(),
                problems.join("; ")
            )))
        }
    }

    /// The JSON body sent to the backend (the inner form, untagged).
    pub fn payload(&self) -> Result<serde_json::Value, StockroomError> {
        let value = match self {
            EntityForm::Brand(form) => serde_json::to_value(form),
            EntityForm::Category(form) => serde_json::to_value(form),
            EntityForm::Product(form) => serde_json::to_value(form),
            EntityForm::Blog(form) => serde_json::to_value(form),
            EntityForm::FlashSale(form) => serde_json::to_value(form),
            EntityForm::Notification(form) => serde_json::to_value(form),
        };
        value.map_err(|e| StockroomError::Internal(format!("failed to encode form: {e}")))
    }
}

fn require(field: &str, value: &str, problems: &mut Vec<String>) {
    if value.trim().is_empty() {
        problems.push(format!("{field} is required"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn flash_sale() -> FlashSaleForm {
        let now = Utc::now();
        FlashSaleForm {
            name: "Black Friday".into(),
            product_ids: vec!["p1".into()],
            discount_percent: 30,
            starts_at: now,
            ends_at: now + Duration::hours(2),
        }
    }

    #[test]
    fn model_names_follow_backend_routes() {
        let form = EntityForm::Brand(BrandForm {
            name: "Acme".into(),
            description: None,
            logo: None,
        });
        assert_eq!(form.model().as_str(), "brand");
        assert_eq!(EntityForm::FlashSale(flash_sale()).model().as_str(), "flash-sales");
    }

    #[test]
    fn empty_brand_name_is_rejected() {
        let form = EntityForm::Brand(BrandForm {
            name: "  ".into(),
            description: None,
            logo: None,
        });
        let err = form.validate().unwrap_err();
        assert!(err.to_string().contains("name is required"), "got: {err}");
    }

    #[test]
    fn product_collects_all_problems() {
        let form = EntityForm::Product(ProductForm {
            name: "".into(),
            brand_id: "".into(),
            category_id: "c1".into(),
            price: -1.0,
            stock: 0,
            description: None,
        });
        let msg = form.validate().unwrap_err().to_string();
        assert!(msg.contains("name is required"));
        assert!(msg.contains("brandId is required"));
        assert!(msg.contains("price must be a non-negative number"));
        assert!(!msg.contains("categoryId"));
    }

    #[test]
    fn flash_sale_window_and_discount() {
        assert!(EntityForm::FlashSale(flash_sale()).validate().is_ok());

        let mut bad = flash_sale();
        bad.discount_percent = 0;
        bad.ends_at = bad.starts_at;
        let msg = EntityForm::FlashSale(bad).validate().unwrap_err().to_string();
        assert!(msg.contains("discountPercent"));
        assert!(msg.contains("startsAt must be before endsAt"));
    }

    #[test]
    fn payload_uses_camel_case_and_drops_tag() {
        let form = EntityForm::Category(CategoryForm {
            name: "Shoes".into(),
            parent_id: Some("root".into()),
            description: None,
        });
        let payload = form.payload().unwrap();
        assert_eq!(payload, serde_json::json!({ "name": "Shoes", "parentId": "root" }));
    }

    #[test]
    fn tagged_form_deserializes_by_model() {
        let form: EntityForm = serde_json::from_value(serde_json::json!({
            "model": "notification",
            "data": { "title": "Sale", "body": "Starts now" }
        }))
        .unwrap();
        assert!(matches!(form, EntityForm::Notification(_)));
    }
}
