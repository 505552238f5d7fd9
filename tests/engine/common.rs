use std::sync::Arc;

use tilth_catalog::{Catalog, CatalogEntry, ParamType};
use tilth_engine::Engine;
use tilth_foundation::ObjectId;
use tilth_store::{ObjectStore, OpenFlags};

/// A hillslope-profile catalog shared by the engine tests.
pub fn catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::builder()
            .object_type("PROFILE", "profiles")
            .object_type("CLIMATE", "climates")
            .entry(
                CatalogEntry::new("SEG_LENGTH", ParamType::Float)
                    .with_axis("SEG_DIM")
                    .with_object("PROFILE"),
            )
            .entry(
                CatalogEntry::new("SEG_STEEPNESS", ParamType::Float)
                    .with_axis("SEG_DIM")
                    .with_object("PROFILE"),
            )
            .entry(
                CatalogEntry::new("SEG_LS", ParamType::Float)
                    .with_axis("SEG_DIM")
                    .with_object("PROFILE"),
            )
            .entry(CatalogEntry::new("TOTAL_LS", ParamType::Float).with_object("PROFILE"))
            .entry(CatalogEntry::new("RAIN", ParamType::Float))
            .entry(CatalogEntry::new("R_FACTOR", ParamType::Float).with_object("CLIMATE"))
            .entry(
                CatalogEntry::new("CLIMATE_PTR", ParamType::Pointer)
                    .with_root_table("climates")
                    .with_object("PROFILE"),
            )
            .build()
            .expect("test catalog"),
    )
}

pub fn setup() -> (Engine, ObjectStore, ObjectId) {
    let catalog = catalog();
    let mut store = ObjectStore::new(Arc::clone(&catalog));
    let id = store
        .open("profiles\\default", OpenFlags::default())
        .expect("open profile");
    (Engine::new(catalog), store, id)
}
