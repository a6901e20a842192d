pub mod health;
pub mod diagnostics;
pub mod doc_presence;

pub use health::*;
pub use diagnostics::*;
pub use doc_presence::*;
