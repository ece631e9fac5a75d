pub mod run;
pub mod stages;
