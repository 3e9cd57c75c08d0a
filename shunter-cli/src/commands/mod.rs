pub mod create_prs;
pub mod expand;
pub mod filter;
pub mod resolve;
pub mod stamp;
