pub mod access;
pub mod document;
pub mod messages;
pub mod health;
pub mod diagnostics;
pub mod presence;
pub mod error;

pub use access::*;
pub use document::*;
pub use messages::*;
pub use health::*;
pub use diagnostics::*;
pub use presence::*;
pub use error::*;
