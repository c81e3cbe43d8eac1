pub mod diagnostics;
pub mod objects;
pub mod policy;
pub mod range;
pub mod rowsource;

pub use diagnostics::*;
pub use objects::*;
pub use policy::*;
pub use range::*;
pub use rowsource::*;
