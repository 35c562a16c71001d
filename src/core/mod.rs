// src/core/mod.rs

pub mod attributes;
pub mod change_detector;
pub mod element_path;
pub mod hierarchy_cache;
pub mod menu_path;
pub mod opaque_id;
pub mod path_generator;
pub mod path_resolver;
pub(crate) mod recency;
pub mod settings;
pub mod tree_source;
