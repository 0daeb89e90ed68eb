pub mod map;
pub mod table;
pub mod text;

pub use map::{MapMarker, MapView, MAX_MAP_MARKERS};
pub use table::TableView;
pub use text::render_text;
