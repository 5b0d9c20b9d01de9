pub mod attempt;
pub mod catalog;
pub mod recommendation;
pub mod student;
