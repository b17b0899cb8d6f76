//! Organizations (tenants), their settings and the period close.

mod core;
mod settings;

pub use core::{
    Organization, OrganizationId, Tenant, close_period, create_organization,
    create_organization_table, ensure_period_open, get_organization, rename_organization,
};
pub(crate) use core::insert_organization_with_chart;
pub use settings::{close_period_endpoint, get_settings_page, rename_organization_endpoint};
