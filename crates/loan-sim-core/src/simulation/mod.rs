pub mod bank_terms;
pub mod cash_flows;
pub mod parameters;
pub mod summary;
