pub mod clean;
pub mod dataset;
pub mod export;
pub mod h2h;
pub mod odds;
pub mod params;
pub mod query;
pub mod referees;
pub mod standings;
pub mod validate;
