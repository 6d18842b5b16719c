pub mod exam;
pub mod question;
pub mod result;
