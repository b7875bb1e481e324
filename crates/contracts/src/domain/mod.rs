pub mod certificate;
pub mod release;
