//! Turn a copy of a production Odoo database into a safe development copy: new installation
//! identity, outbound integrations switched off, license markers removed, company tagged `[DEV]`.

pub mod company;
pub mod config;
pub mod config_parameter;
pub mod database;
pub mod error;
pub mod native;
pub mod neutralizer;
