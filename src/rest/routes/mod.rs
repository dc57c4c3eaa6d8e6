pub mod health;
pub mod kpi;
pub mod partners;
pub mod status_codes;
pub mod token;
pub mod transactions;
