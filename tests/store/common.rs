use std::sync::Arc;

use tilth_catalog::{Catalog, CatalogEntry, EntryFlags, ParamType};

/// A small farming catalog shared by the store tests.
pub fn catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::builder()
            .object_type("SOIL", "soils")
            .object_type("CLIMATE", "climates")
            .object_type("MANAGEMENT", "managements")
            .entry(
                CatalogEntry::new("CLAY", ParamType::Float)
                    .with_unit("%", 1.0)
                    .with_object("SOIL"),
            )
            .entry(
                CatalogEntry::new("PRECIP", ParamType::Float)
                    .with_unit("in", 1.0)
                    .with_unit("mm", 0.0393701)
                    .with_object("CLIMATE"),
            )
            .entry(
                CatalogEntry::new("IRRIGATED", ParamType::Bool).with_object("MANAGEMENT"),
            )
            .entry(
                CatalogEntry::new("TILLAGE_TYPE", ParamType::List)
                    .with_choice("chisel plow")
                    .with_choice("no-till")
                    .with_object("MANAGEMENT"),
            )
            .entry(
                CatalogEntry::new("CLIMATE_PTR", ParamType::Pointer)
                    .with_root_table("climates")
                    .with_object("SOIL")
                    .with_object("MANAGEMENT"),
            )
            .entry(
                CatalogEntry::new("OP_DATE", ParamType::Date)
                    .with_axis("OP_DIM")
                    .with_object("MANAGEMENT"),
            )
            .entry(
                CatalogEntry::new("OP_DEPTH", ParamType::Float)
                    .with_axis("OP_DIM")
                    .with_unit("in", 1.0)
                    .with_object("MANAGEMENT"),
            )
            .entry(
                CatalogEntry::new("FIXED_ROWS", ParamType::Float)
                    .with_axis("FIXED_DIM")
                    .with_object("MANAGEMENT")
                    .with_flags(EntryFlags {
                        no_resize: true,
                        ..EntryFlags::default()
                    }),
            )
            .build()
            .expect("test catalog"),
    )
}
