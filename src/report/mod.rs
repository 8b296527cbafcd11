pub mod builder;
pub mod console;
pub mod html;
pub mod pdf;
pub mod report_model;
