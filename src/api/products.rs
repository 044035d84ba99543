use log::warn;
use serde_json::Value;

use super::response::{
    ApiResponse, STATUS_CONFLICT, STATUS_INTERNAL_ERROR, STATUS_NOT_FOUND,
};
use crate::product::{NewProduct, Product, ProductKind, ProductPatch};
use crate::query::CatalogStats;
use crate::store::{ProductStore, StoreError};

pub const ERR_NAME_AND_PRICE: &str = "Name and price are required";
pub const ERR_IMAGE_NOT_STRING: &str = "Image must be a valid URL string";
pub const ERR_ID_REQUIRED: &str = "Product ID is required";
pub const ERR_NOT_FOUND: &str = "Product not found";
pub const ERR_CONFLICT: &str = "Product was modified concurrently";
pub const ERR_INTERNAL: &str = "Internal server error";
pub const MSG_DELETED: &str = "Product deleted successfully";

/// Query parameters accepted by the collection listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub search: Option<String>,
    pub kind: Option<String>,
}

/// Request validation and error mapping in front of a [`ProductStore`].
///
/// The store trusts its input; everything a client can get wrong is
/// rejected here first.
#[derive(Debug)]
pub struct ProductApi {
    store: ProductStore,
}

impl ProductApi {
    pub fn new(store: ProductStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    /// `search` takes precedence over `type`; an unrecognized type matches
    /// nothing.
    pub fn list(&self, params: &ListParams) -> ApiResponse<Vec<Product>> {
        let search = params.search.as_deref().filter(|s| !s.is_empty());
        let kind = params.kind.as_deref().filter(|s| !s.is_empty());

        let result = match (search, kind) {
            (Some(q), _) => self.store.search_by_text(q),
            (None, Some(k)) => match k.parse::<ProductKind>() {
                Ok(kind) => self.store.list_by_type(kind),
                Err(_) => Ok(Vec::new()),
            },
            (None, None) => self.store.list_all(),
        };
        respond(result, ApiResponse::ok)
    }

    pub fn create(&self, body: &Value) -> ApiResponse<Product> {
        if !has_title_and_price(body) {
            return ApiResponse::bad_request(ERR_NAME_AND_PRICE);
        }
        if !image_is_string(body) {
            return ApiResponse::bad_request(ERR_IMAGE_NOT_STRING);
        }
        // Explicit nulls mean "not provided".
        let mut body = body.clone();
        if let Some(fields) = body.as_object_mut() {
            fields.retain(|_, v| !v.is_null());
        }
        let data: NewProduct = match serde_json::from_value(body) {
            Ok(data) => data,
            Err(e) => return ApiResponse::bad_request(format!("Invalid product data: {e}")),
        };
        respond(self.store.add(data), ApiResponse::created)
    }

    pub fn get(&self, id: &str) -> ApiResponse<Product> {
        if id.is_empty() {
            return ApiResponse::bad_request(ERR_ID_REQUIRED);
        }
        match self.store.get_by_id(id) {
            Ok(Some(product)) => ApiResponse::ok(product),
            Ok(None) => ApiResponse::failure(STATUS_NOT_FOUND, ERR_NOT_FOUND),
            Err(e) => failure(e),
        }
    }

    pub fn update(&self, id: &str, body: &Value) -> ApiResponse<Product> {
        if id.is_empty() {
            return ApiResponse::bad_request(ERR_ID_REQUIRED);
        }
        if !image_is_string(body) {
            return ApiResponse::bad_request(ERR_IMAGE_NOT_STRING);
        }
        let patch: ProductPatch = match serde_json::from_value(body.clone()) {
            Ok(patch) => patch,
            Err(e) => return ApiResponse::bad_request(format!("Invalid product data: {e}")),
        };
        respond(self.store.update(id, patch), ApiResponse::ok)
    }

    pub fn delete(&self, id: &str) -> ApiResponse<Product> {
        if id.is_empty() {
            return ApiResponse::bad_request(ERR_ID_REQUIRED);
        }
        respond(self.store.delete(id), |p| {
            ApiResponse::ok(p).with_message(MSG_DELETED)
        })
    }

    pub fn stats(&self) -> ApiResponse<CatalogStats> {
        respond(self.store.stats(), ApiResponse::ok)
    }
}

fn respond<T, U>(
    result: Result<T, StoreError>,
    on_ok: impl FnOnce(T) -> ApiResponse<U>,
) -> ApiResponse<U> {
    match result {
        Ok(value) => on_ok(value),
        Err(e) => failure(e),
    }
}

fn failure<T>(err: StoreError) -> ApiResponse<T> {
    match err {
        StoreError::NotFound(_) => ApiResponse::failure(STATUS_NOT_FOUND, ERR_NOT_FOUND),
        StoreError::Validation(msg) => ApiResponse::bad_request(msg),
        StoreError::Conflict { .. } => ApiResponse::failure(STATUS_CONFLICT, ERR_CONFLICT),
        other => {
            warn!("API error: {other}");
            ApiResponse::failure(STATUS_INTERNAL_ERROR, ERR_INTERNAL)
        }
    }
}

// A zero price counts as missing, the same as an absent one.
fn has_title_and_price(body: &Value) -> bool {
    let non_empty = |key: &str| body.get(key).and_then(Value::as_str).filter(|t| !t.is_empty());
    let title = non_empty("title").or_else(|| non_empty("name")).is_some();
    let price = body
        .get("price")
        .and_then(Value::as_f64)
        .is_some_and(|p| p != 0.0);
    title && price
}

fn image_is_string(body: &Value) -> bool {
    match body.get("image") {
        None | Some(Value::Null) | Some(Value::String(_)) => true,
        Some(_) => false,
    }
}
