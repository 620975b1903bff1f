// handlers/mod.rs - Two-tier handler layout
//
// Public (no session flag) → Protected (admin_authenticated session flag)
pub mod public; // Login page, health, service banner
pub mod protected; // Dashboard, settings, export (/admin/*)
