mod footer;
mod resource_picker;

pub use footer::{draw_footer, Toast};
pub use resource_picker::{PickerKey, ResourcePicker};
