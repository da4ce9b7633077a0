pub mod curve;
pub mod render;

pub use curve::{ChartRequest, MaccCurve};
pub use render::{ChartRenderer, PlottersRenderer};
