pub mod context;
pub mod document;
pub mod fonts;
pub mod truetype;
pub mod wrap;
pub mod writer;

pub use context::{Advance, Align, Border, Margins, PageDecorator, PageSetup, RenderContext, MM};
pub use document::PdfDocument;
pub use fonts::{BuiltinFont, FontFamily, FontMetrics, FontRef, FontStyle, TextStyle, TrueTypeFontId};
pub use wrap::{wrap_text, WrapMode};
