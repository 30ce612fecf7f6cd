//! Text and LaTeX renderings of expressions.

pub mod expr;
pub mod latex;

pub use expr::pretty;
pub use latex::latex;
