pub mod break_even;
pub mod cashflow;
pub mod comparison;
pub mod milestones;
pub mod scenarios;
pub mod schedule;
pub mod sensitivity;
