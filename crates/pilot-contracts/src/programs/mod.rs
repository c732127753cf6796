//! Program contracts

mod base;
mod create;
mod delete;
mod update;

pub use base::ProgramBaseContract;
pub use create::CreateProgramContract;
pub use delete::DeleteProgramContract;
pub use update::UpdateProgramContract;
