//! Plotting: a canvas boundary, an in-memory scene, fit-aware plot sessions,
//! and two renderers (SVG and ASCII).

pub mod ascii;
pub mod canvas;
pub mod scene;
pub mod session;
pub mod svg;

pub use canvas::{AxisId, Canvas, Color, FigureId, LineStyle, TickLocators};
pub use scene::Scene;
pub use session::{CanvasHandle, DrawOptions, DrawOutput, PlotSession};
