pub mod article;
pub mod style;
pub mod verdict;

pub use article::*;
pub use style::*;
pub use verdict::*;
