pub mod registrations;
pub mod settings;
