//! Storage Adapter - 对象存储实现

mod file_object_store;

pub use file_object_store::FileObjectStore;
