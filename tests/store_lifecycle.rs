use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::Value;
use storefront_store::product::{NewProduct, ProductKind, ProductPatch, Specs};
use storefront_store::store::{ProductStore, StoreConfig, StoreError};
use tempfile::tempdir;

fn open_store(root: &Path) -> ProductStore {
    ProductStore::new(StoreConfig::v1(root.join("database").join("products.json")))
}

fn tesla() -> NewProduct {
    NewProduct::new(ProductKind::Car, "Tesla Model S", 79_990.0)
        .description("Dual motor all-wheel drive sedan")
        .image("https://i.ibb.co/abc/model-s.jpg")
        .specs(
            Specs::new()
                .with("range", "405 mi")
                .with("acceleration", "3.1s 0-60 mph")
                .with("topSpeed", "149 mph"),
        )
        .feature("Autopilot")
        .feature("Glass roof")
}

fn villa() -> NewProduct {
    NewProduct::new(ProductKind::House, "Hillside Villa", 1_250_000.0)
        .description("Solar roof and Powerwall included")
        .specs(Specs::new().with("bedrooms", "4").with("sqft", "3200"))
}

fn read_raw(store: &ProductStore) -> Value {
    let raw = fs::read_to_string(store.config().path()).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn empty_store_bootstrap_persists_document() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    assert!(!store.config().path().exists());

    let products = store.list_all().unwrap();
    assert!(products.is_empty());
    assert!(store.config().path().exists(), "first read must persist an empty document");

    let raw = read_raw(&store);
    assert_eq!(raw["products"], Value::Array(vec![]));
    assert_eq!(raw["metadata"]["totalProducts"], 0);
    assert_eq!(raw["metadata"]["version"], "1.0.0");
    assert!(raw["metadata"]["created"].is_string());
    assert!(raw["metadata"]["lastModified"].is_string());
}

#[test]
fn add_then_get_round_trips_caller_fields() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let input = tesla();
    let created = store.add(input.clone()).unwrap();
    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = store.get_by_id(created.id.as_str()).unwrap().expect("product must exist");
    assert_eq!(fetched, created);
    assert_eq!(fetched.kind, input.kind);
    assert_eq!(fetched.title, input.title);
    assert_eq!(fetched.price, input.price);
    assert_eq!(fetched.description, input.description);
    assert_eq!(fetched.image, input.image);
    assert_eq!(fetched.specs, input.specs);
    assert_eq!(fetched.features, vec!["Autopilot", "Glass roof"]);
}

#[test]
fn get_missing_id_is_none_not_error() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    store.add(tesla()).unwrap();

    assert!(store.get_by_id("does-not-exist").unwrap().is_none());
}

#[test]
fn add_assigns_unique_ids() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let mut ids = BTreeSet::new();
    for i in 0..50 {
        let p = store
            .add(NewProduct::new(ProductKind::Car, format!("Car {i}"), 1000.0 + i as f64))
            .unwrap();
        assert!(ids.insert(p.id.clone()), "duplicate id {}", p.id);
    }
    assert_eq!(store.list_all().unwrap().len(), 50);
}

#[test]
fn list_all_preserves_insertion_order() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let a = store.add(tesla()).unwrap();
    let b = store.add(villa()).unwrap();
    let c = store.add(NewProduct::new(ProductKind::Car, "Model 3", 38_990.0)).unwrap();

    let ids: Vec<_> = store.list_all().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);
}

#[test]
fn update_changes_only_patched_fields() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let original = store.add(tesla()).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let updated = store
        .update(original.id.as_str(), ProductPatch::price(74_990.0))
        .unwrap();

    assert_eq!(updated.price, 74_990.0);
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at > original.updated_at);
    assert!(updated.updated_at >= updated.created_at);

    assert_eq!(updated.kind, original.kind);
    assert_eq!(updated.title, original.title);
    assert_eq!(updated.description, original.description);
    assert_eq!(updated.image, original.image);
    assert_eq!(updated.specs, original.specs);
    assert_eq!(updated.features, original.features);

    let stored = store.get_by_id(original.id.as_str()).unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[test]
fn update_ignores_identity_fields_in_json_patch() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let original = store.add(tesla()).unwrap();

    let patch: ProductPatch = serde_json::from_value(serde_json::json!({
        "id": "hijacked",
        "createdAt": "2000-01-01T00:00:00Z",
        "title": "Tesla Model S Plaid"
    }))
    .unwrap();

    let updated = store.update(original.id.as_str(), patch).unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.title, "Tesla Model S Plaid");
    assert!(store.get_by_id("hijacked").unwrap().is_none());
}

#[test]
fn update_replaces_specs_and_features_wholesale() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let original = store.add(tesla()).unwrap();

    let patch = ProductPatch {
        specs: Some(Specs::new().with("range", "396 mi")),
        features: Some(vec!["Plaid".to_string()]),
        ..Default::default()
    };
    let updated = store.update(original.id.as_str(), patch).unwrap();

    assert_eq!(updated.specs.len(), 1);
    assert_eq!(updated.specs.get("range"), Some("396 mi"));
    assert_eq!(updated.features, vec!["Plaid"]);
}

#[test]
fn update_missing_id_is_not_found_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    store.add(tesla()).unwrap();
    let before = fs::read(store.config().path()).unwrap();

    let err = store.update("nope", ProductPatch::price(1.0)).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "nope"));

    let after = fs::read(store.config().path()).unwrap();
    assert_eq!(before, after, "failed update must not rewrite the document");
}

#[test]
fn delete_is_terminal() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let keep = store.add(villa()).unwrap();
    let gone = store.add(tesla()).unwrap();
    assert_eq!(read_raw(&store)["metadata"]["totalProducts"], 2);

    let removed = store.delete(gone.id.as_str()).unwrap();
    assert_eq!(removed, gone);

    assert!(store.get_by_id(gone.id.as_str()).unwrap().is_none());
    let remaining = store.list_all().unwrap();
    assert_eq!(remaining, vec![keep]);
    assert_eq!(read_raw(&store)["metadata"]["totalProducts"], 1);

    let again = store.delete(gone.id.as_str()).unwrap_err();
    assert!(again.is_not_found());
}

#[test]
fn metadata_tracks_collection_after_mixed_operations() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let a = store.add(tesla()).unwrap();
    let b = store.add(villa()).unwrap();
    store.add(tesla()).unwrap();
    store.update(b.id.as_str(), ProductPatch::price(1.0)).unwrap();
    store.delete(a.id.as_str()).unwrap();
    store.add(villa()).unwrap();

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.database.metadata.total_products, 3);
    assert_eq!(snapshot.database.products.len(), 3);
    assert!(snapshot.database.metadata.last_modified >= snapshot.database.metadata.created);

    let raw = read_raw(&store);
    assert_eq!(
        raw["metadata"]["totalProducts"].as_u64().unwrap() as usize,
        raw["products"].as_array().unwrap().len()
    );
}

#[test]
fn existing_document_is_reused_across_store_instances() {
    let dir = tempdir().unwrap();
    let created = {
        let store = open_store(dir.path());
        store.add(tesla()).unwrap()
    };

    let reopened = open_store(dir.path());
    let fetched = reopened.get_by_id(created.id.as_str()).unwrap();
    assert_eq!(fetched, Some(created));
}

#[test]
fn corrupt_document_is_surfaced_and_left_untouched() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    store.add(tesla()).unwrap();

    let garbage = b"{\"products\": [ {\"id\": \"x\"";
    fs::write(store.config().path(), garbage).unwrap();

    let err = store.list_all().unwrap_err();
    assert!(matches!(err, StoreError::CorruptDocument { .. }), "got {err:?}");

    let err = store.add(villa()).unwrap_err();
    assert!(matches!(err, StoreError::CorruptDocument { .. }), "got {err:?}");

    assert_eq!(fs::read(store.config().path()).unwrap(), garbage);
}

#[test]
fn zero_length_document_is_treated_as_absent() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    fs::create_dir_all(store.config().path().parent().unwrap()).unwrap();
    fs::write(store.config().path(), b"").unwrap();

    assert!(store.list_all().unwrap().is_empty());
    assert_eq!(read_raw(&store)["metadata"]["totalProducts"], 0);
}

#[test]
fn empty_id_is_rejected_before_touching_storage() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let err = store.update("  ", ProductPatch::price(1.0)).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    let err = store.delete("").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(!store.config().path().exists());
}

#[test]
fn non_finite_price_is_rejected() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let err = store
        .add(NewProduct::new(ProductKind::Car, "Broken", f64::NAN))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let p = store.add(tesla()).unwrap();
    let err = store
        .update(p.id.as_str(), ProductPatch::price(f64::INFINITY))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    // Document is still readable.
    assert_eq!(store.list_all().unwrap().len(), 1);
}

#[test]
fn no_temp_or_lock_files_left_behind() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let p = store.add(tesla()).unwrap();
    store.update(p.id.as_str(), ProductPatch::price(2.0)).unwrap();
    store.delete(p.id.as_str()).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path().join("database"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["products.json".to_string()]);
}
