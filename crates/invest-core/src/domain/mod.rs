//! 매매 회계 도메인 모델.

pub mod calculations;
pub mod lot;
pub mod price_bar;
pub mod trade;
pub mod transaction;

pub use calculations::*;
pub use lot::*;
pub use price_bar::*;
pub use trade::*;
pub use transaction::*;
