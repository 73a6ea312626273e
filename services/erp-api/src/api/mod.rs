//! gRPC 接口层

pub mod conversions;
pub mod entity_service;
pub mod listing_services;
pub mod notice_service;
pub mod preference_service;

pub use entity_service::EntityServiceImpl;
pub use listing_services::ListingServices;
pub use notice_service::NoticeServiceImpl;
pub use preference_service::PreferenceServiceImpl;
