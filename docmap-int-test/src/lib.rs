pub mod entities;
pub mod test_util;
