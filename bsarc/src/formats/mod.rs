pub mod ba2;
pub mod bsa;
