pub mod input;
pub mod radio;
pub mod select;
pub mod textarea;

pub use input::Input;
pub use radio::RadioGroup;
pub use select::Select;
pub use textarea::Textarea;
