// Library for tests to access modules

pub mod charts;
pub mod config;
pub mod csv_export;
pub mod maintenance;
pub mod models;
pub mod routes;
pub mod selection;
pub mod transform;
pub mod value_repo;
pub mod worker;
