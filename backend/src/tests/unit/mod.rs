mod client_health;
mod dashboard;
mod performance;
mod source_fallback;
