pub mod catalog;
pub mod elf;
pub mod kid;
pub mod letter;
pub mod parent;

pub use catalog::{Certificate, Video};
pub use elf::Elf;
pub use kid::{Kid, KidProfile, KidSummary, NewKid};
pub use letter::{KidLetter, Letter, ParentLetter, Responder};
pub use parent::{NewParent, Parent, ParentProfile, ResponseMode};

/// Primary key type shared by every table (`SERIAL`)
pub type DbId = i32;
