// Two security tiers: public (no JWT) and protected (require_auth).
pub mod protected;
pub mod public;
