mod department;
mod document;
pub mod timestamp;

pub use department::Department;
pub use document::{
    DakDocument, DepartmentRef, Direction, DocumentInsert, DocumentPatch, NewDocument, Priority,
    Status, UnknownVariant, ValidationError, DEFAULT_BRANCH,
};
