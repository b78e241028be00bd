// handlers/mod.rs - Two tiers: public (no credentials) and protected
// (API key or bearer token, resolved into `AccessInfo`).
pub mod protected;
pub mod public;
