pub mod stage1_write;
pub mod stage2_judge;
pub mod stage3_revise;

pub use stage1_write::*;
pub use stage2_judge::*;
pub use stage3_revise::*;
