pub mod cash_flows;
pub mod rates;
pub mod simulate;
