//! 基础设施层

pub mod security;

pub use security::{OrgAccess, RoleSecurityEngine, build_restriction};
