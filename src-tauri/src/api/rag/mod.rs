pub mod files;
pub mod instances;
pub mod providers;
pub mod repositories;

// Admin modules
pub mod admin_instances;
pub mod admin_providers;