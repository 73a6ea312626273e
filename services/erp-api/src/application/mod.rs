//! 应用层

pub mod entity;
pub mod listing;
pub mod notice;
pub mod preference;
pub mod upload;
pub mod views;

pub use entity::EntityHandler;
pub use listing::{ListPage, ListParams, ListQuery, ListingHandler};
pub use notice::NoticeHandler;
pub use preference::{PreferenceEntry, PreferenceHandler};
pub use upload::{UploadHandler, UploadMetadata, UploadPart};
