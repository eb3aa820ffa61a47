// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field-level input validation.
//!
//! Auth forms fail with 400, list and item bodies with 422. Every failing
//! field is reported, not just the first one.

use axum::http::StatusCode;
use serde_json::Value;

use crate::error::{ApiError, FieldErrors};
use crate::models::{
    ListItemChanges, ListItemRequest, LoginRequest, NewListItem, RegisterRequest,
    ShoppingListRequest,
};

pub const MAX_TEXT_LENGTH: usize = 255;
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Collects per-field messages.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Returns `false` (and records an error) when `value` is blank.
    pub fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, format!("The {field} field is required."));
            return false;
        }
        true
    }

    pub fn max_length(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("The {field} may not be greater than {max} characters."));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if self.required(field, value) && !is_valid_email(value.trim()) {
            self.add(field, format!("The {field} must be a valid email address."));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when nothing was recorded, else a validation error with
    /// `status`.
    pub fn finish(self, status: StatusCode) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(status, self.errors))
        }
    }
}

/// Structural email check: one `@`, a non-empty local part and a dotted
/// domain without empty labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) || email.chars().count() > MAX_TEXT_LENGTH {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain
        .split('.')
        .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
}

/// Lowercased, trimmed email as stored and looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_register(request: &RegisterRequest) -> Result<(), ApiError> {
    let mut v = Validator::new();
    if v.required("first_name", &request.first_name) {
        v.max_length("first_name", request.first_name.trim(), MAX_TEXT_LENGTH);
    }
    if v.required("last_name", &request.last_name) {
        v.max_length("last_name", request.last_name.trim(), MAX_TEXT_LENGTH);
    }
    v.email("email", &request.email);
    password_rules(&mut v, "password", &request.password);
    if let Some(phone) = &request.phone {
        v.max_length("phone", phone.trim(), MAX_TEXT_LENGTH);
    }
    v.finish(StatusCode::BAD_REQUEST)
}

pub fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    let mut v = Validator::new();
    v.email("email", &request.email);
    v.required("password", &request.password);
    v.finish(StatusCode::BAD_REQUEST)
}

/// Rules for a new password (registration and reset).
pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
    let mut v = Validator::new();
    password_rules(&mut v, "password", password);
    v.finish(StatusCode::BAD_REQUEST)
}

fn password_rules(v: &mut Validator, field: &str, password: &str) {
    if v.required(field, password) && password.chars().count() < MIN_PASSWORD_LENGTH {
        v.add(
            field,
            format!("The {field} must be at least {MIN_PASSWORD_LENGTH} characters."),
        );
    }
}

/// Validate a list body and return the trimmed name.
pub fn validate_list_name(request: &ShoppingListRequest) -> Result<String, ApiError> {
    let mut v = Validator::new();
    let name = request.name.as_deref().unwrap_or("").trim();
    if v.required("name", name) {
        v.max_length("name", name, MAX_TEXT_LENGTH);
    }
    v.finish(StatusCode::UNPROCESSABLE_ENTITY)?;
    Ok(name.to_string())
}

/// Validate a create-item body. `product_name` is required, `quantity`
/// defaults to 1.
pub fn validate_new_item(request: &ListItemRequest) -> Result<NewListItem, ApiError> {
    let mut v = Validator::new();
    let fields = item_fields(&mut v, request);
    if fields.product_name.is_none() && !v.errors.contains_key("product_name") {
        v.add("product_name", "The product_name field is required.");
    }
    v.finish(StatusCode::UNPROCESSABLE_ENTITY)?;

    Ok(NewListItem {
        product_name: fields.product_name.unwrap_or_default(),
        quantity: fields.quantity.unwrap_or(1),
        price: fields.price,
        store_name: fields.store_name,
        is_purchased: fields.is_purchased.unwrap_or(false),
    })
}

/// Validate an update-item body. Absent or null fields keep their value.
pub fn validate_item_changes(request: &ListItemRequest) -> Result<ListItemChanges, ApiError> {
    let mut v = Validator::new();
    let fields = item_fields(&mut v, request);
    v.finish(StatusCode::UNPROCESSABLE_ENTITY)?;
    Ok(fields)
}

fn item_fields(v: &mut Validator, request: &ListItemRequest) -> ListItemChanges {
    ListItemChanges {
        product_name: text_field(v, "product_name", request.product_name.as_ref(), true),
        quantity: quantity_field(v, request.quantity.as_ref()),
        price: price_field(v, request.price.as_ref()),
        store_name: text_field(v, "store_name", request.store_name.as_ref(), false),
        is_purchased: bool_field(v, "is_purchased", request.is_purchased.as_ref()),
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn text_field(v: &mut Validator, field: &str, value: Option<&Value>, required: bool) -> Option<String> {
    let value = present(value)?;
    let Some(text) = value.as_str() else {
        v.add(field, format!("The {field} must be a string."));
        return None;
    };
    let text = text.trim();
    if text.is_empty() {
        if required {
            v.add(field, format!("The {field} field is required."));
        }
        return None;
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        v.add(
            field,
            format!("The {field} may not be greater than {MAX_TEXT_LENGTH} characters."),
        );
        return None;
    }
    Some(text.to_string())
}

fn quantity_field(v: &mut Validator, value: Option<&Value>) -> Option<i64> {
    let value = present(value)?;
    let quantity = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match quantity {
        Some(q) if q >= 1 => Some(q),
        Some(_) => {
            v.add("quantity", "The quantity must be at least 1.");
            None
        }
        None => {
            v.add("quantity", "The quantity must be an integer.");
            None
        }
    }
}

fn price_field(v: &mut Validator, value: Option<&Value>) -> Option<f64> {
    let value = present(value)?;
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match price.filter(|p| p.is_finite()) {
        Some(p) if p >= 0.0 => Some(p),
        Some(_) => {
            v.add("price", "The price must be at least 0.");
            None
        }
        None => {
            v.add("price", "The price must be a number.");
            None
        }
    }
}

fn bool_field(v: &mut Validator, field: &str, value: Option<&Value>) -> Option<bool> {
    let value = present(value)?;
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        v.add(field, format!("The {field} field must be true or false."));
    }
    parsed
}
