// src/services.rs

pub mod record_validator;
pub mod company_service;
pub use company_service::CompanyService;
pub mod employee_service;
pub use employee_service::EmployeeService;
pub mod permission_resolver;
pub use permission_resolver::PermissionCache;
pub mod approval_service;
pub use approval_service::ApprovalService;
pub mod session_gate;
pub mod validation_service;
pub use validation_service::ValidationService;
pub mod auth;
pub use auth::AuthService;
pub mod business_service;
pub use business_service::{BusinessService, TenantData};
pub mod backup_service;
pub use backup_service::BackupService;
pub mod search_service;
pub use search_service::SearchService;
