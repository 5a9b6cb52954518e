pub mod keygen;
pub mod ledger;
pub mod token;
