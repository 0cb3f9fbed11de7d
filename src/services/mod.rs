pub mod quota;
pub mod redeem;
pub mod requests;

pub use quota::*;
pub use redeem::*;
pub use requests::*;
