//! Widget kind of a declared form field.

/// Kind of control a field renders as.
///
/// `Custom` fields are drawn by a host-registered renderer looked up by
/// `FieldSpec::render`; `Hidden` fields carry values (ids, file names)
/// through the draft without rendering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Input,
    Password,
    Select,
    RadioGroup,
    Custom,
    Hidden,
}
