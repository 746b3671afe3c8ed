pub mod cycle;
pub mod flow;
pub mod history;
pub mod insights;
pub mod settings;
